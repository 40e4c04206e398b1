use super::*;

const REQUESTED: [Decision; 2] = [Decision::Oral, Decision::Rejected];

#[traced_test]
#[tokio::test]
async fn test_rerun_skips_downloaded() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()));

  let first = run_once(&source, &ledger, options(dir.path(), &REQUESTED)).await?;
  let second = run_once(&source, &ledger, options(dir.path(), &REQUESTED)).await?;

  assert_eq!(second.total_downloaded(), 0);
  assert_eq!(second.total_skipped(), first.total_downloaded());
  for decision in REQUESTED {
    let counts = second.counts(decision);
    assert_eq!((counts.requested, counts.skipped, counts.downloaded), (1, 1, 0));
  }
  assert_eq!(second.unknown, 1);
  assert_eq!(source.fetches(), 2);
  assert_eq!(source.lists(), 2);

  // Skipping does not touch the ledger
  assert_eq!(ledger.get(VENUE, "oral1").await?.unwrap().attempts, 1);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_forced_redownload_refetches_everything() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()));

  run_once(&source, &ledger, options(dir.path(), &REQUESTED)).await?;
  let forced =
    run_once(&source, &ledger, options(dir.path(), &REQUESTED).with_skip_existing(false)).await?;

  assert_eq!(forced.total_downloaded(), 2);
  assert_eq!(forced.total_skipped(), 0);
  assert_eq!(source.fetches(), 4);

  for id in ["oral1", "rej1"] {
    let record = ledger.get(VENUE, id).await?.unwrap();
    assert_eq!(record.status, DownloadStatus::Downloaded);
    assert_eq!(record.attempts, 2);
  }
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_deleted_file_is_fetched_again() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()));

  run_once(&source, &ledger, options(dir.path(), &REQUESTED)).await?;
  let oral = pdf_path(dir.path(), Decision::Oral, "oral1_Attention_Everywhere.pdf");
  std::fs::remove_file(&oral)?;

  let summary = run_once(&source, &ledger, options(dir.path(), &REQUESTED)).await?;

  assert_eq!(summary.counts(Decision::Oral).downloaded, 1);
  assert_eq!(summary.counts(Decision::Rejected).skipped, 1);
  assert!(oral.exists());
  assert_eq!(ledger.get(VENUE, "oral1").await?.unwrap().attempts, 2);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_failed_submission_is_retried_next_run() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let failing = Arc::new(FakeSource::new(scenario()).with_missing("rej1"));
  run_once(&failing, &ledger, options(dir.path(), &REQUESTED)).await?;

  let healthy = Arc::new(FakeSource::new(scenario()));
  let summary = run_once(&healthy, &ledger, options(dir.path(), &REQUESTED)).await?;

  assert_eq!(summary.counts(Decision::Rejected).downloaded, 1);
  assert_eq!(summary.counts(Decision::Oral).skipped, 1);
  assert_eq!(healthy.fetched(), vec!["rej1".to_string()]);

  let record = ledger.get(VENUE, "rej1").await?.unwrap();
  assert_eq!(record.status, DownloadStatus::Downloaded);
  assert_eq!(record.error, None);
  assert_eq!(record.attempts, 2);
  Ok(())
}
