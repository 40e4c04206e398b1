//! Decision-partitioned paper downloads for OpenReview venues.
//!
//! `ordl` turns a venue identifier into a set of papers grouped by their review outcome and
//! keeps a local ledger of what has been fetched so that runs can be interrupted and resumed.
//!
//! - Decision classification from loosely structured venue metadata
//! - Filesystem-safe naming of downloaded documents
//! - A SQLite ledger of download attempts keyed by venue and submission
//! - Searchable metadata (abstract, keywords, authors) of every downloaded paper
//! - Retrying PDF fetches with exponential backoff
//! - A bounded, cancellable download pipeline that reports a per-decision summary
//!
//! # Getting Started
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ordl::{
//!   decision::Decision, downloader::{DownloadOptions, Downloader}, ledger::Ledger,
//!   source::OpenReview,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let source = Arc::new(OpenReview::new()?);
//!   let ledger = Ledger::open(Ledger::default_path()).await?;
//!   let options = DownloadOptions::new("NeurIPS.cc/2025/Conference")
//!     .with_decisions([Decision::Oral, Decision::Rejected])
//!     .with_out_dir("papers");
//!
//!   let summary = Downloader::new(source, ledger, options).run(CancellationToken::new()).await?;
//!   println!("downloaded {} papers", summary.total_downloaded());
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`decision`]: Decision outcomes and the metadata classifier
//! - [`format`]: Filename and directory sanitizing
//! - [`submission`]: Submissions as reported by a venue source
//! - [`source`]: The [`source::SubmissionSource`] trait and the OpenReview client
//! - [`ledger`]: Persistent record of download attempts and paper metadata
//! - [`retry`]: Backoff policy and the retry driver
//! - [`fetch`]: Single-submission PDF retrieval
//! - [`downloader`]: The run orchestrator
//! - [`summary`]: Run and venue reports
//! - [`config`]: TOML configuration
//! - [`prelude`]: Common traits and types for ergonomic imports

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::{BTreeMap, BTreeSet},
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  sync::Arc,
  time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod config;
pub mod decision;
pub mod downloader;
pub mod error;
pub mod fetch;
pub mod format;
pub mod ledger;
pub mod retry;
pub mod source;
pub mod submission;
pub mod summary;

use crate::{decision::*, error::*, submission::*};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use ordl::prelude::*;
///
/// fn wanted(metadata: &[String]) -> Result<bool, OrdlError> {
///   Ok(classify(metadata).satisfies(Decision::Accepted))
/// }
/// ```
pub mod prelude {
  pub use crate::{
    decision::{classify, Decision},
    error::OrdlError,
    source::SubmissionSource,
  };
}
