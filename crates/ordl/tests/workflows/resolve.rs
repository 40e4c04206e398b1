use super::*;

#[traced_test]
#[tokio::test]
async fn test_unreachable_listing_is_fatal() {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()).with_listing(Listing::Unavailable));

  let err = downloader(&source, &ledger, options(dir.path(), &[Decision::Oral]))
    .run(CancellationToken::new())
    .await
    .unwrap_err();

  match err {
    OrdlError::Resolve { venue, source: cause } => {
      assert_eq!(venue, VENUE);
      assert!(matches!(*cause, OrdlError::Api { status: 503, .. }));
    },
    other => panic!("expected a resolve error, got {other:?}"),
  }
  // Listing is retried like any other transient failure
  assert_eq!(source.lists(), 3);
  assert_eq!(source.fetches(), 0);
}

#[traced_test]
#[tokio::test]
async fn test_unknown_venue_is_fatal_without_retry() {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(Vec::new()).with_listing(Listing::UnknownVenue));

  let err = downloader(&source, &ledger, options(dir.path(), &[Decision::Oral]))
    .info()
    .await
    .unwrap_err();

  let OrdlError::Resolve { source: cause, .. } = err else { panic!("expected a resolve error") };
  assert!(matches!(*cause, OrdlError::UnknownVenue(_)));
  assert_eq!(source.lists(), 1);
}

#[traced_test]
#[tokio::test]
async fn test_listing_timeout() {
  let (ledger, dir) = setup().await;
  let source = Arc::new(FakeSource::new(scenario()).with_listing(Listing::Hang));
  let options = options(dir.path(), &[Decision::Oral])
    .with_retry(RetryPolicy::immediate(2))
    .with_list_timeout(Duration::from_millis(20));

  let err = downloader(&source, &ledger, options).run(CancellationToken::new()).await.unwrap_err();

  let OrdlError::Resolve { source: cause, .. } = err else { panic!("expected a resolve error") };
  assert!(matches!(*cause, OrdlError::Timeout(_)));
  assert_eq!(source.lists(), 2);
}
