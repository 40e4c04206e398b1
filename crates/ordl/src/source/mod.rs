//! Venue sources: where submissions and their PDFs come from.
//!
//! The download pipeline only needs two capabilities from a venue, captured by
//! [`SubmissionSource`]. Flattening whatever shape the venue API returns into
//! [`Submission::metadata`] strings is the source's job, which keeps the classifier independent
//! of any particular schema.
//!
//! [`OpenReview`] is the implementation for the public OpenReview API.

use super::*;

mod openreview;

pub use self::openreview::{OpenReview, DEFAULT_BASE_URL};

/// A venue that can list its submissions and serve their PDFs.
///
/// Errors returned from [`fetch_pdf`](SubmissionSource::fetch_pdf) must be classifiable with
/// [`OrdlError::is_retryable`]; [`OrdlError::NotFound`] signals a definitive miss.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
  /// Lists every submission of the venue, decided or not.
  async fn list_submissions(&self, venue_id: &str) -> Result<Vec<Submission>>;

  /// Retrieves the full PDF payload for a submission.
  async fn fetch_pdf(&self, content: &ContentRef) -> Result<Vec<u8>>;
}
