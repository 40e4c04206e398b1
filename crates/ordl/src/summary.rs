//! Reports produced by a run.

use super::*;

/// Counters for one decision bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCounts {
  /// Submissions selected by the request
  pub requested:  usize,
  /// Selected submissions already downloaded by an earlier run
  pub skipped:    usize,
  /// Submissions downloaded in this run
  pub downloaded: usize,
  /// Submissions whose fetch failed in this run
  pub failed:     usize,
}

/// Aggregate outcome of one download run.
///
/// Buckets are keyed by the stored (most specific) decision, so a request for accepted papers
/// may report oral and spotlight buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
  /// Venue the run targeted
  pub venue_id:  String,
  /// Submissions returned by the source
  pub listed:    usize,
  /// Per-decision counters for selected submissions
  pub decisions: BTreeMap<Decision, DecisionCounts>,
  /// Submissions whose metadata matched no known decision
  pub unknown:   usize,
  /// Classified submissions that were not requested
  pub ignored:   usize,
  /// Whether the run stopped early; counters only cover finished work
  pub cancelled: bool,
}

impl RunSummary {
  /// An empty summary for `venue_id`.
  pub fn new(venue_id: impl Into<String>) -> Self {
    Self { venue_id: venue_id.into(), ..Self::default() }
  }

  /// Counters for `decision`, created on first use.
  pub fn bucket(&mut self, decision: Decision) -> &mut DecisionCounts {
    self.decisions.entry(decision).or_default()
  }

  /// Counters for `decision`, or zeros if nothing was selected for it.
  pub fn counts(&self, decision: Decision) -> DecisionCounts {
    self.decisions.get(&decision).copied().unwrap_or_default()
  }

  /// Submissions downloaded across all buckets.
  pub fn total_downloaded(&self) -> usize { self.decisions.values().map(|c| c.downloaded).sum() }

  /// Submissions skipped across all buckets.
  pub fn total_skipped(&self) -> usize { self.decisions.values().map(|c| c.skipped).sum() }

  /// Failed submissions across all buckets.
  pub fn total_failed(&self) -> usize { self.decisions.values().map(|c| c.failed).sum() }

  /// Selected submissions across all buckets.
  pub fn total_requested(&self) -> usize { self.decisions.values().map(|c| c.requested).sum() }
}

/// Per-decision counts of a venue, without downloading anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueInfo {
  /// Venue that was listed
  pub venue_id: String,
  /// Submissions returned by the source
  pub listed:   usize,
  /// Submissions per classified decision, including [`Decision::Unknown`]
  pub counts:   BTreeMap<Decision, usize>,
  /// Submissions matching the requested decisions, with `accepted` as a superset
  pub selected: usize,
}

impl VenueInfo {
  /// Count for one decision.
  pub fn count(&self, decision: Decision) -> usize {
    self.counts.get(&decision).copied().unwrap_or_default()
  }
}
