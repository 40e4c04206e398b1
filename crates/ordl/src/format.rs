//! Filesystem-safe names for downloaded documents and venue directories.

use super::*;

/// Maximum number of characters kept from a normalized title.
pub const MAX_TITLE_LEN: usize = 80;

lazy_static! {
  /// Anything outside the safe set; whitespace is kept so it can be collapsed.
  static ref UNSAFE: Regex = Regex::new(r"[^A-Za-z0-9_\-\s]").unwrap();
  /// Runs of whitespace.
  static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
  /// Anything that may not appear in a venue directory name.
  static ref VENUE_UNSAFE: Regex = Regex::new(r"[^A-Za-z0-9_.\-]+").unwrap();
}

/// Builds `<submission_id>_<title>.pdf` for a submission.
///
/// The title keeps only ASCII letters, digits, `_` and `-`, has whitespace collapsed into
/// single underscores and is cut to [`MAX_TITLE_LEN`] characters. When nothing survives, the
/// name is just `<submission_id>.pdf`.
///
/// ```
/// use ordl::format::sanitize;
///
/// assert_eq!(
///   sanitize("abc123", "Attention: Is All You Need?"),
///   "abc123_Attention_Is_All_You_Need.pdf"
/// );
/// assert_eq!(sanitize("abc123", "???"), "abc123.pdf");
/// ```
pub fn sanitize(submission_id: &str, title: &str) -> String {
  let id = match normalize(submission_id, usize::MAX) {
    id if id.is_empty() => "submission".to_string(),
    id => id,
  };

  match normalize(title, MAX_TITLE_LEN) {
    title if title.is_empty() => format!("{id}.pdf"),
    title => format!("{id}_{title}.pdf"),
  }
}

/// Strips unsafe characters, joins words with underscores and truncates to `max_len`.
fn normalize(input: &str, max_len: usize) -> String {
  let cleaned = UNSAFE.replace_all(input, "");
  let joined = WHITESPACE.replace_all(cleaned.trim(), "_");
  let truncated: String = joined.chars().take(max_len).collect();
  truncated.trim_matches('_').to_string()
}

/// Turns a venue id such as `NeurIPS.cc/2025/Conference` into one directory name.
///
/// ```
/// use ordl::format::venue_slug;
///
/// assert_eq!(venue_slug("NeurIPS.cc/2025/Conference"), "NeurIPS.cc_2025_Conference");
/// assert_eq!(venue_slug("../.."), "venue");
/// ```
pub fn venue_slug(venue_id: &str) -> String {
  let slug = VENUE_UNSAFE.replace_all(venue_id.trim(), "_");
  let slug = slug.trim_matches(|c: char| c == '_' || c == '.');
  if slug.is_empty() {
    "venue".to_string()
  } else {
    slug.to_string()
  }
}

/// Location of a submission's PDF: `<out_dir>/<venue-slug>/<decision>/<file>`.
pub fn destination(
  out_dir: &Path,
  venue_id: &str,
  decision: Decision,
  submission: &Submission,
) -> PathBuf {
  out_dir
    .join(venue_slug(venue_id))
    .join(decision.as_str())
    .join(sanitize(&submission.id, &submission.title))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sanitize_basic() {
    assert_eq!(sanitize("Xy_1-z", "A  Study of\tThings"), "Xy_1-z_A_Study_of_Things.pdf");
  }

  #[test]
  fn test_sanitize_disallowed_only() {
    assert_eq!(sanitize("abc", "!!! ??? ///"), "abc.pdf");
    assert_eq!(sanitize("abc", ""), "abc.pdf");
    assert_eq!(sanitize("abc", "   "), "abc.pdf");
  }

  #[test]
  fn test_sanitize_never_empty() {
    assert_eq!(sanitize("", ""), "submission.pdf");
    assert_eq!(sanitize("/..", "::"), "submission.pdf");
  }

  #[test]
  fn test_sanitize_truncates_title() {
    let title = "word ".repeat(100);
    let name = sanitize("id", &title);
    let title_part = name.strip_prefix("id_").unwrap().strip_suffix(".pdf").unwrap();
    assert!(title_part.chars().count() <= MAX_TITLE_LEN);
    assert!(!title_part.ends_with('_'));
  }

  #[test]
  fn test_sanitize_drops_non_ascii() {
    assert_eq!(sanitize("id", "Über Graphs — Ω bounds"), "id_ber_Graphs_bounds.pdf");
  }

  #[test]
  fn test_sanitize_is_single_component() {
    let name = sanitize("../../etc", "passwd/../x");
    assert!(!name.contains('/'));
    assert!(!name.contains('\\'));
    assert_eq!(Path::new(&name).components().count(), 1);
  }

  #[test]
  fn test_venue_slug() {
    assert_eq!(venue_slug("ICLR.cc/2024/Conference"), "ICLR.cc_2024_Conference");
    assert_eq!(venue_slug("  a b  "), "a_b");
    assert_eq!(venue_slug(".."), "venue");
    assert_eq!(venue_slug(""), "venue");
  }

  #[test]
  fn test_destination_layout() {
    let submission = Submission::new("abc", "Deep Nets");
    let path =
      destination(Path::new("/out"), "ICLR.cc/2024/Conference", Decision::Oral, &submission);
    assert_eq!(path, Path::new("/out/ICLR.cc_2024_Conference/oral/abc_Deep_Nets.pdf"));
  }
}
