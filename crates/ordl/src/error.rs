//! Error types for the ordl library.
//!
//! A single [`OrdlError`] covers every failure the library can report. Errors fall into
//! three groups that the download pipeline treats differently:
//!
//! - failures that abort a run (the venue cannot be listed, the ledger is unusable)
//! - transient fetch failures that are retried with backoff
//! - terminal fetch failures that are recorded against one submission
//!
//! [`OrdlError::is_retryable`] is the one place that decides between the last two.
//!
//! # Examples
//!
//! ```
//! use ordl::error::OrdlError;
//!
//! let err = OrdlError::Api { status: 503, message: "busy".into() };
//! assert!(err.is_retryable());
//! assert!(!OrdlError::NotFound.is_retryable());
//! ```

use std::time::Duration;

use thiserror::Error;

/// Error type alias used for the [`ordl`](crate) crate.
pub type Result<T> = core::result::Result<T, OrdlError>;

/// Errors that can occur while listing, fetching or recording submissions.
#[derive(Error, Debug)]
pub enum OrdlError {
  /// A requested decision could not be parsed.
  ///
  /// Only `oral`, `spotlight`, `accepted` and `rejected` may be requested. `unknown` is a
  /// diagnostic bucket and is rejected here as well.
  #[error("Invalid decision \"{0}\", expected one of oral, spotlight, accepted, rejected")]
  InvalidDecision(String),

  /// A network request failed before a response was received, or the body could not be read.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The requested document does not exist at the source.
  #[error("Document not found")]
  NotFound,

  /// The venue API answered with an unsuccessful status code.
  #[error("API error ({status}): {message}")]
  Api {
    /// HTTP status code of the response
    status:  u16,
    /// Body or reason returned by the API
    message: String,
  },

  /// An operation did not complete within its time budget.
  #[error("Timed out after {0:?}")]
  Timeout(Duration),

  /// The source returned no submissions at all for the venue.
  #[error("Venue \"{0}\" is unknown or has no submissions")]
  UnknownVenue(String),

  /// Listing the venue failed; the whole run is aborted.
  #[error("Failed to list submissions for venue \"{venue}\": {source}")]
  Resolve {
    /// The venue that was being listed
    venue:  String,
    /// The failure reported by the source
    #[source]
    source: Box<OrdlError>,
  },

  /// A SQLite operation failed.
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// An async SQLite operation failed, including the ledger connection being closed.
  #[error(transparent)]
  AsyncSqlite(#[from] tokio_rusqlite::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// A venue response could not be decoded.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// A configuration could not be serialized.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// Configuration values are missing or inconsistent.
  #[error("{0}")]
  Config(String),
}

impl OrdlError {
  /// Whether the failure is transient and the operation is worth repeating.
  ///
  /// Connection failures, timeouts, rate limiting (429), request timeouts (408) and server
  /// errors (5xx) are retryable. Not-found, other client errors, file system failures and
  /// everything local to this process are not.
  pub fn is_retryable(&self) -> bool {
    match self {
      OrdlError::Network(e) => match e.status() {
        Some(status) => is_transient_status(status.as_u16()),
        None => !e.is_builder() && !e.is_decode() && !e.is_redirect(),
      },
      OrdlError::Api { status, .. } => is_transient_status(*status),
      OrdlError::Timeout(_) => true,
      _ => false,
    }
  }

  /// Whether the source reported that it is throttling requests.
  pub fn is_rate_limited(&self) -> bool {
    match self {
      OrdlError::Api { status, .. } => *status == 429,
      OrdlError::Network(e) => e.status().is_some_and(|s| s.as_u16() == 429),
      _ => false,
    }
  }
}

/// Status codes that indicate the server may succeed on a later attempt.
fn is_transient_status(status: u16) -> bool { status == 408 || status == 429 || status >= 500 }
