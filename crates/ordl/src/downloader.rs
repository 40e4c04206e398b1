//! The download run orchestrator.
//!
//! A [`Downloader`] turns a venue id and a set of requested decisions into files on disk. Each
//! call to [`Downloader::run`] walks through the same steps:
//!
//! 1. Resolve: list the venue's submissions under the listing timeout and retry policy
//! 2. Classify: reduce each submission's metadata to a [`Decision`]
//! 3. Filter: keep submissions whose decision satisfies a requested one
//! 4. Plan: skip what the ledger already has on disk, mark the rest pending
//! 5. Execute: fetch the plan on a bounded pool and record every outcome, storing the paper
//!    metadata of every successful download
//! 6. Summarize: return the [`RunSummary`]
//!
//! [`survey`] performs only the first two steps and needs no ledger.
//!
//! Only a failed listing or an unusable ledger make a run fail. A submission that cannot be
//! fetched is recorded as failed and counted in the summary.

use futures::{future, stream, StreamExt};

use crate::{
  fetch::{FetchOutcome, Fetcher},
  format,
  ledger::{DownloadRecord, Ledger},
  retry::{with_retry, Retried, RetryPolicy},
  source::SubmissionSource,
  summary::{RunSummary, VenueInfo},
};

use super::*;

/// Number of fetches in flight at once unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Upper bound for a single listing attempt unless configured otherwise.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(120);

/// Parameters of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
  /// Venue to list, e.g. `NeurIPS.cc/2025/Conference`
  pub venue_id:      String,
  /// Requested decisions; [`Decision::Accepted`] also selects orals and spotlights
  pub decisions:     BTreeSet<Decision>,
  /// Root of the output tree
  pub out_dir:       PathBuf,
  /// Skip submissions the ledger already has on disk
  pub skip_existing: bool,
  /// Fetches in flight at once
  pub concurrency:   usize,
  /// Retry policy for both the listing and each fetch
  pub retry:         RetryPolicy,
  /// Timeout of a single listing attempt
  pub list_timeout:  Duration,
}

impl DownloadOptions {
  /// Options for `venue_id` requesting accepted papers of every kind into `./papers`.
  pub fn new(venue_id: impl Into<String>) -> Self {
    Self {
      venue_id:      venue_id.into(),
      decisions:     BTreeSet::from([Decision::Oral, Decision::Spotlight, Decision::Accepted]),
      out_dir:       PathBuf::from("papers"),
      skip_existing: true,
      concurrency:   DEFAULT_CONCURRENCY,
      retry:         RetryPolicy::default(),
      list_timeout:  DEFAULT_LIST_TIMEOUT,
    }
  }

  /// Replaces the requested decisions.
  pub fn with_decisions(mut self, decisions: impl IntoIterator<Item = Decision>) -> Self {
    self.decisions = decisions.into_iter().collect();
    self
  }

  /// Sets the output root.
  pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
    self.out_dir = out_dir.into();
    self
  }

  /// Whether already downloaded submissions are skipped; `false` forces a re-download.
  pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
    self.skip_existing = skip_existing;
    self
  }

  /// Sets the number of concurrent fetches. Zero is treated as one.
  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = concurrency;
    self
  }

  /// Sets the retry policy.
  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  /// Sets the listing timeout.
  pub fn with_list_timeout(mut self, list_timeout: Duration) -> Self {
    self.list_timeout = list_timeout;
    self
  }
}

/// A selected submission that needs fetching.
struct Planned {
  /// The submission itself
  submission:  Submission,
  /// Most specific decision, which also names the output directory
  decision:    Decision,
  /// Where the PDF goes
  destination: PathBuf,
}

/// Runs downloads for one venue against a source and a ledger.
pub struct Downloader {
  /// Where submissions and PDFs come from
  source:  Arc<dyn SubmissionSource>,
  /// Record of past attempts
  ledger:  Ledger,
  /// Run parameters
  options: DownloadOptions,
}

impl Downloader {
  /// Creates a downloader. Nothing is contacted until [`run`](Self::run) or
  /// [`info`](Self::info).
  pub fn new(source: Arc<dyn SubmissionSource>, ledger: Ledger, options: DownloadOptions) -> Self {
    Self { source, ledger, options }
  }

  /// The parameters this downloader runs with.
  pub fn options(&self) -> &DownloadOptions { &self.options }

  /// Downloads every requested submission that is not already on disk.
  ///
  /// Cancelling `cancel` stops new fetches from starting and interrupts pending retries. The
  /// returned summary then only covers finished fetches and has
  /// [`cancelled`](RunSummary::cancelled) set.
  ///
  /// # Errors
  ///
  /// Returns [`OrdlError::Resolve`] if the venue cannot be listed, and the underlying error if
  /// the ledger cannot be read or written.
  pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary> {
    let venue_id = self.options.venue_id.as_str();
    info!(venue = venue_id, decisions = ?self.options.decisions, "Starting download run");

    let mut summary = RunSummary::new(venue_id);
    let Some(submissions) = self.resolve(&cancel).await? else {
      warn!(venue = venue_id, "Run cancelled while listing submissions");
      summary.cancelled = true;
      return Ok(summary);
    };
    summary.listed = submissions.len();

    let mut selected = Vec::new();
    for submission in submissions {
      match submission.decision() {
        Decision::Unknown => {
          debug!(submission = %submission.id, metadata = ?submission.metadata, "Unclassified");
          summary.unknown += 1;
        },
        decision if decision.selected_by(&self.options.decisions) => {
          summary.bucket(decision).requested += 1;
          selected.push((submission, decision));
        },
        _ => summary.ignored += 1,
      }
    }
    if summary.unknown > 0 {
      warn!(venue = venue_id, count = summary.unknown, "Submissions with no recognizable decision");
    }

    let plan = self.plan(selected, &mut summary).await?;
    info!(
      venue = venue_id,
      planned = plan.len(),
      skipped = summary.total_skipped(),
      ignored = summary.ignored,
      "Planned downloads"
    );

    self.execute(plan, &cancel, &mut summary).await?;
    if cancel.is_cancelled() {
      summary.cancelled = true;
    }

    info!(
      venue = venue_id,
      downloaded = summary.total_downloaded(),
      skipped = summary.total_skipped(),
      failed = summary.total_failed(),
      cancelled = summary.cancelled,
      "Download run finished"
    );
    Ok(summary)
  }

  /// Lists and classifies the venue without downloading anything. See [`survey`].
  pub async fn info(&self) -> Result<VenueInfo> {
    survey(self.source.as_ref(), &self.options).await
  }

  /// Lists the venue's submissions. `None` means the run was cancelled while backing off.
  async fn resolve(&self, cancel: &CancellationToken) -> Result<Option<Vec<Submission>>> {
    resolve(self.source.as_ref(), &self.options, cancel).await
  }

  /// Splits selected submissions into skipped ones and a fetch plan.
  ///
  /// Planned submissions get a pending ledger row if they have none yet.
  async fn plan(
    &self,
    selected: Vec<(Submission, Decision)>,
    summary: &mut RunSummary,
  ) -> Result<Vec<Planned>> {
    let venue_id = self.options.venue_id.as_str();
    let mut plan = Vec::with_capacity(selected.len());

    for (submission, decision) in selected {
      let destination = format::destination(&self.options.out_dir, venue_id, decision, &submission);

      if self.options.skip_existing && self.ledger.exists(venue_id, &submission.id).await? {
        if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
          trace!(submission = %submission.id, "Already downloaded");
          summary.bucket(decision).skipped += 1;
          continue;
        }
        warn!(
          submission = %submission.id,
          path = ?destination,
          "Recorded as downloaded but missing on disk, fetching again"
        );
      }

      let record = DownloadRecord::new(venue_id, &submission, decision, destination.clone());
      self.ledger.mark_pending(&record).await?;
      plan.push(Planned { submission, decision, destination });
    }

    Ok(plan)
  }

  /// Fetches the plan on a bounded pool and records each outcome as it arrives.
  ///
  /// Every ledger write happens in this loop, one at a time.
  async fn execute(
    &self,
    plan: Vec<Planned>,
    cancel: &CancellationToken,
    summary: &mut RunSummary,
  ) -> Result<()> {
    let venue_id = self.options.venue_id.as_str();
    let fetcher = Fetcher::new(self.source.clone(), self.options.retry)
      .with_cancellation(cancel.clone());
    let fetcher = &fetcher;

    let mut outcomes = stream::iter(plan)
      .take_while(|_| future::ready(!cancel.is_cancelled()))
      .map(move |planned| async move {
        let outcome = fetcher
          .fetch(&planned.submission.id, &planned.submission.content, &planned.destination)
          .await;
        (planned, outcome)
      })
      .buffer_unordered(self.options.concurrency.max(1));

    while let Some((planned, outcome)) = outcomes.next().await {
      let Planned { submission, decision, destination } = planned;
      let record = DownloadRecord::new(venue_id, &submission, decision, destination);

      match outcome {
        FetchOutcome::Success { .. } => {
          let attempts = self.ledger.upsert(&record.downloaded()).await?;
          self.ledger.ingest(venue_id, &submission).await?;
          trace!(submission = %submission.id, attempts, "Recorded download");
          summary.bucket(decision).downloaded += 1;
        },
        FetchOutcome::Failure { reason, attempts } => {
          warn!(submission = %submission.id, %reason, attempts, "Giving up on submission");
          self.ledger.upsert(&record.failed(reason)).await?;
          summary.bucket(decision).failed += 1;
        },
        FetchOutcome::Cancelled { attempts } => {
          debug!(submission = %submission.id, attempts, "Fetch cancelled");
          summary.cancelled = true;
        },
      }
    }

    Ok(())
  }
}

/// Lists and classifies a venue without downloading anything or touching a ledger.
///
/// Only the venue id, the requested decisions, the retry policy and the listing timeout of
/// `options` are used.
///
/// # Errors
///
/// Returns [`OrdlError::Resolve`] if the venue cannot be listed.
pub async fn survey(
  source: &dyn SubmissionSource,
  options: &DownloadOptions,
) -> Result<VenueInfo> {
  let cancel = CancellationToken::new();
  let submissions = resolve(source, options, &cancel).await?.unwrap_or_default();

  let mut info = VenueInfo {
    venue_id: options.venue_id.clone(),
    listed: submissions.len(),
    ..VenueInfo::default()
  };
  for submission in &submissions {
    let decision = submission.decision();
    *info.counts.entry(decision).or_default() += 1;
    if decision.selected_by(&options.decisions) {
      info.selected += 1;
    }
  }
  Ok(info)
}

/// Lists a venue under the listing timeout and retry policy of `options`.
async fn resolve(
  source: &dyn SubmissionSource,
  options: &DownloadOptions,
  cancel: &CancellationToken,
) -> Result<Option<Vec<Submission>>> {
  let venue_id = options.venue_id.as_str();
  let timeout = options.list_timeout;
  debug!(venue = venue_id, ?timeout, "Listing submissions");

  let retried = with_retry(&options.retry, cancel, || async move {
    match tokio::time::timeout(timeout, source.list_submissions(venue_id)).await {
      Ok(listed) => listed,
      Err(_) => Err(OrdlError::Timeout(timeout)),
    }
  })
  .await;

  match retried {
    Retried::Done { value, attempts } => {
      debug!(venue = venue_id, count = value.len(), attempts, "Listed submissions");
      Ok(Some(value))
    },
    Retried::Failed { error, attempts } => {
      error!(venue = venue_id, %error, attempts, "Could not list submissions");
      Err(OrdlError::Resolve { venue: venue_id.to_string(), source: Box::new(error) })
    },
    Retried::Cancelled { .. } => Ok(None),
  }
}
