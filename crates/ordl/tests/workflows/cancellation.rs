use super::*;

#[traced_test]
#[tokio::test]
async fn test_cancel_before_start_fetches_nothing() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()));
  let cancel = CancellationToken::new();
  cancel.cancel();

  let options = options(dir.path(), &[Decision::Oral, Decision::Rejected]);
  let summary = downloader(&source, &ledger, options).run(cancel).await?;

  assert!(summary.cancelled);
  assert_eq!(source.fetches(), 0);
  assert_eq!(summary.total_downloaded(), 0);
  assert_eq!(summary.total_failed(), 0);
  assert_eq!(summary.total_requested(), 2);

  // Planned submissions are left pending with no recorded attempt
  let record = ledger.get(VENUE, "oral1").await?.unwrap();
  assert_eq!(record.status, DownloadStatus::Pending);
  assert_eq!(record.attempts, 0);
  assert!(!ledger.exists(VENUE, "oral1").await?);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_cancel_stops_dispatching() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let cancel = CancellationToken::new();
  let source = Arc::new(FakeSource::new(scenario()).with_cancel_after(1, cancel.clone()));
  let options = options(dir.path(), &[Decision::Oral, Decision::Rejected]).with_concurrency(1);

  let summary = downloader(&source, &ledger, options).run(cancel).await?;

  assert!(summary.cancelled);
  assert_eq!(source.fetches(), 1);
  // The fetch in flight when the run was cancelled still completes and is recorded
  assert_eq!(summary.total_downloaded(), 1);

  let first = &source.fetched()[0];
  assert!(ledger.exists(VENUE, first).await?);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_cancel_interrupts_backoff() -> TestResult<()> {
  let (ledger, dir) = setup().await;
  let cancel = CancellationToken::new();
  let source = Arc::new(
    FakeSource::new(scenario()).with_flaky("oral1", 10).with_cancel_after(1, cancel.clone()),
  );
  let retry = RetryPolicy { max_attempts: 5, jitter: false, ..RetryPolicy::default() };
  let options = options(dir.path(), &[Decision::Oral]).with_retry(retry);

  let summary = downloader(&source, &ledger, options).run(cancel).await?;

  assert!(summary.cancelled);
  assert_eq!(source.fetches(), 1);
  assert_eq!(summary.total_failed(), 0);

  // Cancelled fetches are not recorded as outcomes
  let record = ledger.get(VENUE, "oral1").await?.unwrap();
  assert_eq!(record.status, DownloadStatus::Pending);
  Ok(())
}
