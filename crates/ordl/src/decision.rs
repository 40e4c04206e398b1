//! Review decisions and the metadata classifier.
//!
//! Venues describe outcomes inconsistently: the same accepted oral paper may be reported as
//! `"Accept (Oral)"`, `"NeurIPS 2025 oral"` or `"oral-presentation"`. [`classify`] reduces any
//! combination of such strings to a single [`Decision`], preferring the most specific label.
//!
//! ```
//! use ordl::decision::{classify, Decision};
//!
//! assert_eq!(classify(&["Accept (Oral)"]), Decision::Oral);
//! assert_eq!(classify(&["ICLR 2024 poster"]), Decision::Accepted);
//! assert_eq!(classify(&["Submitted to ICLR 2024"]), Decision::Unknown);
//! ```

use super::*;

/// The classified outcome of a submission.
///
/// Variants are ordered from most to least specific, which is also the order used when
/// reporting. [`Decision::Accepted`] is a superset for filtering purposes: an oral paper
/// satisfies a request for accepted papers but is stored as [`Decision::Oral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
  /// Accepted for an oral presentation
  Oral,
  /// Accepted for a spotlight presentation
  Spotlight,
  /// Accepted, including posters and papers with no presentation type
  Accepted,
  /// Rejected, including desk rejections
  Rejected,
  /// Nothing in the metadata matched a known pattern
  Unknown,
}

/// Ordered token table; the first matching row wins.
const PATTERNS: &[(&str, Decision)] = &[
  ("oral", Decision::Oral),
  ("spotlight", Decision::Spotlight),
  ("accept", Decision::Accepted),
  ("poster", Decision::Accepted),
  ("reject", Decision::Rejected),
];

/// Classifies a submission from its raw decision and venue strings.
///
/// Matching is case-insensitive and considers all strings together, so a presentation type
/// in one field overrides a coarse accept in another. Never fails: anything unrecognized is
/// [`Decision::Unknown`].
pub fn classify<S: AsRef<str>>(metadata: &[S]) -> Decision {
  let text = metadata.iter().map(|s| s.as_ref().to_lowercase()).collect::<Vec<_>>().join(" ");
  PATTERNS
    .iter()
    .find(|(token, _)| text.contains(token))
    .map_or(Decision::Unknown, |(_, decision)| *decision)
}

impl Decision {
  /// Every decision that can be requested, most specific first.
  pub const REQUESTABLE: [Decision; 4] =
    [Decision::Oral, Decision::Spotlight, Decision::Accepted, Decision::Rejected];

  /// Whether a submission with this decision belongs in the `requested` bucket.
  ///
  /// ```
  /// use ordl::decision::Decision;
  ///
  /// assert!(Decision::Spotlight.satisfies(Decision::Accepted));
  /// assert!(!Decision::Accepted.satisfies(Decision::Oral));
  /// assert!(!Decision::Unknown.satisfies(Decision::Unknown));
  /// ```
  pub fn satisfies(self, requested: Decision) -> bool {
    match (self, requested) {
      (Decision::Unknown, _) => false,
      (Decision::Oral | Decision::Spotlight, Decision::Accepted) => true,
      (actual, requested) => actual == requested,
    }
  }

  /// Whether this decision satisfies any decision in `requested`.
  pub fn selected_by(self, requested: &BTreeSet<Decision>) -> bool {
    requested.iter().any(|r| self.satisfies(*r))
  }

  /// Lowercase label, also used as the output directory name.
  pub fn as_str(&self) -> &'static str {
    match self {
      Decision::Oral => "oral",
      Decision::Spotlight => "spotlight",
      Decision::Accepted => "accepted",
      Decision::Rejected => "rejected",
      Decision::Unknown => "unknown",
    }
  }

  /// Parses a comma separated list such as `"oral,rejected"` into a set of requested
  /// decisions. Empty entries are ignored.
  pub fn parse_list(input: &str) -> Result<BTreeSet<Decision>> {
    input
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(|s| s.parse::<Decision>().and_then(Decision::requestable))
      .collect()
  }

  /// Rejects [`Decision::Unknown`], which can never be requested.
  pub fn requestable(self) -> Result<Decision> {
    match self {
      Decision::Unknown => Err(OrdlError::InvalidDecision(self.to_string())),
      decision => Ok(decision),
    }
  }
}

impl Display for Decision {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.pad(self.as_str()) }
}

impl FromStr for Decision {
  type Err = OrdlError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "oral" => Ok(Decision::Oral),
      "spotlight" => Ok(Decision::Spotlight),
      "accepted" | "accept" => Ok(Decision::Accepted),
      "rejected" | "reject" => Ok(Decision::Rejected),
      "unknown" => Ok(Decision::Unknown),
      other => Err(OrdlError::InvalidDecision(other.to_string())),
    }
  }
}
