use super::*;

#[traced_test]
#[tokio::test]
async fn test_scenario_downloads_requested_decisions() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()));
  let options = options(dir.path(), &[Decision::Oral, Decision::Rejected]);

  let summary = downloader(&source, &ledger, options).run(CancellationToken::new()).await?;

  assert_eq!(summary.venue_id, VENUE);
  assert_eq!(summary.listed, 3);
  assert_eq!(summary.unknown, 1);
  assert_eq!(summary.ignored, 0);
  assert!(!summary.cancelled);
  for decision in [Decision::Oral, Decision::Rejected] {
    let counts = summary.counts(decision);
    assert_eq!((counts.requested, counts.downloaded, counts.skipped, counts.failed), (1, 1, 0, 0));
  }
  assert_eq!(summary.total_downloaded(), 2);

  let oral = pdf_path(dir.path(), Decision::Oral, "oral1_Attention_Everywhere.pdf");
  let rejected = pdf_path(dir.path(), Decision::Rejected, "rej1_Less_Attention.pdf");
  assert_eq!(std::fs::read(&oral)?, pdf_bytes("oral1"));
  assert_eq!(std::fs::read(&rejected)?, pdf_bytes("rej1"));

  let mut fetched = source.fetched();
  fetched.sort();
  assert_eq!(fetched, vec!["oral1".to_string(), "rej1".to_string()]);

  let record = ledger.get(VENUE, "oral1").await?.unwrap();
  assert_eq!(record.status, DownloadStatus::Downloaded);
  assert_eq!(record.decision, Decision::Oral);
  assert_eq!(record.path, oral);
  assert_eq!(record.attempts, 1);
  assert!(record.error.is_none());

  // Unclassified submissions never reach the ledger
  assert!(ledger.get(VENUE, "unk1").await?.is_none());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_accepted_selects_orals_and_spotlights() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(vec![
    submission("o", "Oral Paper", &["ICLR 2024 oral", "accepted"]),
    submission("s", "Spotlight Paper", &["Accept (spotlight)"]),
    submission("p", "Poster Paper", &["ICLR 2024 poster"]),
    submission("r", "Rejected Paper", &["Reject"]),
  ]));

  let summary = downloader(&source, &ledger, options(dir.path(), &[Decision::Accepted]))
    .run(CancellationToken::new())
    .await?;

  assert_eq!(summary.counts(Decision::Oral).downloaded, 1);
  assert_eq!(summary.counts(Decision::Spotlight).downloaded, 1);
  assert_eq!(summary.counts(Decision::Accepted).downloaded, 1);
  assert_eq!(summary.counts(Decision::Rejected).requested, 0);
  assert_eq!(summary.ignored, 1);
  assert_eq!(summary.unknown, 0);

  // Stored under the most specific decision
  assert!(pdf_path(dir.path(), Decision::Oral, "o_Oral_Paper.pdf").exists());
  assert!(pdf_path(dir.path(), Decision::Spotlight, "s_Spotlight_Paper.pdf").exists());
  assert!(pdf_path(dir.path(), Decision::Accepted, "p_Poster_Paper.pdf").exists());
  assert!(!dir.path().join(VENUE_DIR).join("rejected").exists());

  let orals = ledger.list_by_decision(VENUE, Decision::Oral).await?;
  assert_eq!(orals.len(), 1);
  let accepted = ledger.list_by_decision(VENUE, Decision::Accepted).await?;
  assert!(accepted.iter().all(|r| r.submission_id == "p"));
  assert!(ledger.get(VENUE, "r").await?.is_none());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_missing_pdf_is_recorded_and_run_continues() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()).with_missing("rej1"));

  let options = options(dir.path(), &[Decision::Oral, Decision::Rejected]);
  let summary = run_once(&source, &ledger, options).await?;

  assert_eq!(summary.counts(Decision::Oral).downloaded, 1);
  assert_eq!(summary.counts(Decision::Rejected).failed, 1);
  assert_eq!(summary.total_failed(), 1);

  // Not-found is terminal: one attempt only
  assert_eq!(source.fetched().iter().filter(|id| *id == "rej1").count(), 1);

  let rejected = pdf_path(dir.path(), Decision::Rejected, "rej1_Less_Attention.pdf");
  assert!(!rejected.exists());
  assert!(!part_path(&rejected).exists());

  let record = ledger.get(VENUE, "rej1").await?.unwrap();
  assert_eq!(record.status, DownloadStatus::Failed);
  assert_eq!(record.error.as_deref(), Some("Document not found"));
  assert!(!ledger.exists(VENUE, "rej1").await?);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_transient_failures_are_retried() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()).with_flaky("oral1", 2));

  let summary = downloader(&source, &ledger, options(dir.path(), &[Decision::Oral]))
    .run(CancellationToken::new())
    .await?;

  assert_eq!(summary.counts(Decision::Oral).downloaded, 1);
  assert_eq!(source.fetches(), 3);
  assert_eq!(summary.ignored, 1);

  // The ledger counts recorded outcomes, not network attempts
  assert_eq!(ledger.get(VENUE, "oral1").await?.unwrap().attempts, 1);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_exhausted_retries_fail_the_submission() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()).with_flaky("oral1", 10));

  let summary = downloader(&source, &ledger, options(dir.path(), &[Decision::Oral]))
    .run(CancellationToken::new())
    .await?;

  assert_eq!(summary.counts(Decision::Oral).failed, 1);
  assert_eq!(source.fetches(), 3);
  let record = ledger.get(VENUE, "oral1").await?.unwrap();
  assert_eq!(record.status, DownloadStatus::Failed);
  assert!(record.error.unwrap().contains("502"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_nothing_requested_matches() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()));

  let summary = downloader(&source, &ledger, options(dir.path(), &[Decision::Spotlight]))
    .run(CancellationToken::new())
    .await?;

  assert!(summary.decisions.is_empty());
  assert_eq!(summary.ignored, 2);
  assert_eq!(summary.unknown, 1);
  assert_eq!(source.fetches(), 0);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_info_counts_without_downloading() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let mut submissions = scenario();
  submissions.push(submission("s1", "Bright", &["Accept (Spotlight)"]));
  let source = Arc::new(FakeSource::new(submissions));

  let info =
    downloader(&source, &ledger, options(dir.path(), &[Decision::Accepted])).info().await?;

  assert_eq!(info.venue_id, VENUE);
  assert_eq!(info.listed, 4);
  assert_eq!(info.count(Decision::Oral), 1);
  assert_eq!(info.count(Decision::Spotlight), 1);
  assert_eq!(info.count(Decision::Rejected), 1);
  assert_eq!(info.count(Decision::Unknown), 1);
  assert_eq!(info.count(Decision::Accepted), 0);
  assert_eq!(info.selected, 2);

  assert_eq!(source.fetches(), 0);
  assert!(ledger.get(VENUE, "oral1").await?.is_none());
  assert!(!dir.path().join(VENUE_DIR).exists());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_downloaded_papers_are_searchable() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let described = submission("oral1", "Attention Everywhere", &["Accept (Oral)"])
    .with_number(42)
    .with_abstract("Attention is applied to every layer.")
    .with_keywords(vec!["transformers".into()])
    .with_venue("ICLR 2024 oral")
    .with_authors(vec![Author::new("Ada Lovelace").with_profile_id("~Ada_Lovelace1")]);
  let source = Arc::new(
    FakeSource::new(vec![described.clone(), submission("rej1", "Less Attention", &["Reject"])])
      .with_missing("rej1"),
  );

  run_once(&source, &ledger, options(dir.path(), &[Decision::Oral, Decision::Rejected])).await?;

  let paper = ledger.paper(VENUE, "oral1").await?.unwrap();
  assert_eq!(paper.number, Some(42));
  assert_eq!(paper.abstract_text, described.abstract_text);
  assert_eq!(paper.keywords, vec!["transformers".to_string()]);
  assert_eq!(paper.authors, described.authors);
  assert_eq!(paper.decision, Some(Decision::Oral));
  assert_eq!(
    paper.path,
    Some(pdf_path(dir.path(), Decision::Oral, "oral1_Attention_Everywhere.pdf"))
  );

  // Failed downloads leave no metadata behind
  assert!(ledger.paper(VENUE, "rej1").await?.is_none());

  let hits = ledger.search("lovelace", Some(VENUE)).await?;
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].submission_id, "oral1");
  assert!(ledger.search("transformers", Some("ICML.cc/2024/Conference")).await?.is_empty());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_survey_needs_no_ledger() -> TestResult<()> {
  let source = FakeSource::new(scenario());
  let options = DownloadOptions::new(VENUE).with_decisions([Decision::Rejected]);

  let info = survey(&source, &options).await?;

  assert_eq!(info.listed, 3);
  assert_eq!(info.count(Decision::Oral), 1);
  assert_eq!(info.selected, 1);
  assert_eq!(source.lists(), 1);
  assert_eq!(source.fetches(), 0);
  Ok(())
}
