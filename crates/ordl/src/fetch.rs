//! Retrieval of a single submission's PDF.
//!
//! The [`Fetcher`] asks its [`SubmissionSource`](crate::source::SubmissionSource) for the
//! payload under a [`RetryPolicy`], then writes it next to the destination as `<name>.part` and
//! renames it into place. A failed fetch leaves nothing at the destination path. The fetcher
//! reports a [`FetchOutcome`] and never touches the ledger.

use crate::{
  retry::{with_retry, Retried, RetryPolicy},
  source::SubmissionSource,
};

use super::*;

/// What happened to one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
  /// The PDF is at `path`.
  Success {
    /// Final location of the PDF
    path:     PathBuf,
    /// Attempts it took
    attempts: u32,
  },
  /// Nothing was written.
  Failure {
    /// Human readable cause
    reason:   String,
    /// Attempts made before giving up
    attempts: u32,
  },
  /// The run was cancelled before the fetch could finish.
  Cancelled {
    /// Attempts made before cancellation
    attempts: u32,
  },
}

impl FetchOutcome {
  /// Attempts made, regardless of outcome.
  pub fn attempts(&self) -> u32 {
    match self {
      FetchOutcome::Success { attempts, .. }
      | FetchOutcome::Failure { attempts, .. }
      | FetchOutcome::Cancelled { attempts } => *attempts,
    }
  }
}

/// Fetches PDFs from a source with retry and backoff.
#[derive(Clone)]
pub struct Fetcher {
  /// Where the bytes come from
  source: Arc<dyn SubmissionSource>,
  /// Attempts and backoff between them
  policy: RetryPolicy,
  /// Interrupts pending backoffs
  cancel: CancellationToken,
}

impl Fetcher {
  /// Creates a fetcher that is never cancelled.
  pub fn new(source: Arc<dyn SubmissionSource>, policy: RetryPolicy) -> Self {
    Self { source, policy, cancel: CancellationToken::new() }
  }

  /// Makes pending backoffs end early once `cancel` fires.
  pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// Downloads `content` to `destination`.
  ///
  /// Parent directories are created as needed. An existing file at `destination` is replaced
  /// only once the new payload has been written in full.
  pub async fn fetch(
    &self,
    submission_id: &str,
    content: &ContentRef,
    destination: &Path,
  ) -> FetchOutcome {
    debug!(submission = submission_id, "Fetching PDF");
    let retried = with_retry(&self.policy, &self.cancel, || self.source.fetch_pdf(content)).await;

    match retried {
      Retried::Done { value: bytes, attempts } => match write_atomically(destination, &bytes).await
      {
        Ok(()) => {
          info!(submission = submission_id, path = ?destination, bytes = bytes.len(), "Saved PDF");
          FetchOutcome::Success { path: destination.to_path_buf(), attempts }
        },
        Err(e) => {
          warn!(submission = submission_id, error = %e, "Could not write PDF");
          FetchOutcome::Failure { reason: e.to_string(), attempts }
        },
      },
      Retried::Failed { error, attempts } => {
        warn!(submission = submission_id, %error, attempts, "Fetch failed");
        FetchOutcome::Failure { reason: error.to_string(), attempts }
      },
      Retried::Cancelled { attempts } => FetchOutcome::Cancelled { attempts },
    }
  }
}

/// Sibling path used while a download is being written.
pub fn part_path(destination: &Path) -> PathBuf {
  let mut name = destination.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".part");
  destination.with_file_name(name)
}

/// Writes `bytes` to a `.part` sibling and renames it over `destination`.
async fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
  if let Some(parent) = destination.parent() {
    tokio::fs::create_dir_all(parent).await?;
  }

  let part = part_path(destination);
  let written = match tokio::fs::write(&part, bytes).await {
    Ok(()) => tokio::fs::rename(&part, destination).await,
    Err(e) => Err(e),
  };

  if let Err(e) = written {
    let _ = tokio::fs::remove_file(&part).await;
    return Err(e.into());
  }
  Ok(())
}
