//! Client for the public OpenReview API (v2).
//!
//! Accepted papers carry the venue id itself in `content.venueid`; rejected and desk-rejected
//! papers are moved to `<venue>/Rejected_Submission` and `<venue>/Desk_Rejected_Submission`.
//! All three groups are listed. An accepted note contributes its `venue` and `decision` values
//! plus an `accepted` token to the metadata; a note filed under a rejected group contributes
//! only a `rejected` token, whatever its text says. The raw `venueid` never reaches the
//! classifier.

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use super::*;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api2.openreview.net";

/// Notes requested per listing page.
const PAGE_SIZE: usize = 1000;

/// Venue id suffixes under which rejected submissions are filed.
const REJECTED_GROUPS: [&str; 2] = ["Rejected_Submission", "Desk_Rejected_Submission"];

/// [`SubmissionSource`] backed by `api2.openreview.net`.
///
/// Requests are anonymous, so only publicly visible notes and attachments are returned.
#[derive(Debug, Clone)]
pub struct OpenReview {
  /// Shared HTTP client
  client:   Client,
  /// API root, e.g. `https://api2.openreview.net`
  base_url: Url,
}

/// One page of `GET /notes`.
#[derive(Debug, Deserialize)]
struct NotesPage {
  /// Notes on this page
  #[serde(default)]
  notes: Vec<Note>,
  /// Total number of matching notes, when reported
  count: Option<usize>,
}

/// The subset of an OpenReview note used here.
#[derive(Debug, Deserialize)]
struct Note {
  /// Note id, which is also the attachment id
  id:      String,
  /// Submission number
  number:  Option<u64>,
  /// Content fields, each either a bare value or `{ "value": .. }`
  #[serde(default)]
  content: Value,
}

impl OpenReview {
  /// Creates a client for [`DEFAULT_BASE_URL`] with a 60 second request timeout.
  pub fn new() -> Result<Self> { Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(60)) }

  /// Creates a client for a specific API root.
  pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
    let base_url = Url::parse(base_url)
      .map_err(|e| OrdlError::Config(format!("Invalid API base URL {base_url:?}: {e}")))?;
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(concat!("ordl/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, base_url })
  }

  /// Joins an API path onto the base URL.
  fn endpoint(&self, path: &str) -> Result<Url> {
    self.base_url.join(path).map_err(|e| OrdlError::Config(format!("Invalid API path {path}: {e}")))
  }

  /// Lists every note whose `content.venueid` equals `group`, following pagination.
  async fn list_group(&self, group: &str) -> Result<Vec<Note>> {
    let url = self.endpoint("notes")?;
    let mut notes = Vec::new();

    loop {
      let offset = notes.len().to_string();
      let limit = PAGE_SIZE.to_string();
      trace!(group, offset = notes.len(), "Requesting notes page");

      let response = self
        .client
        .get(url.clone())
        .query(&[
          ("content.venueid", group),
          ("offset", offset.as_str()),
          ("limit", limit.as_str()),
        ])
        .send()
        .await?;
      let page: NotesPage = serde_json::from_slice(&check_status(response).await?)?;

      let received = page.notes.len();
      notes.extend(page.notes);

      let exhausted = page.count.is_some_and(|count| notes.len() >= count);
      if received < PAGE_SIZE || exhausted {
        break;
      }
    }

    debug!(group, count = notes.len(), "Listed venue group");
    Ok(notes)
  }
}

#[async_trait]
impl SubmissionSource for OpenReview {
  async fn list_submissions(&self, venue_id: &str) -> Result<Vec<Submission>> {
    let mut groups = vec![venue_id.to_string()];
    groups.extend(REJECTED_GROUPS.iter().map(|suffix| format!("{venue_id}/{suffix}")));

    let mut submissions = Vec::new();
    for group in &groups {
      for note in self.list_group(group).await? {
        submissions.push(note.into_submission(venue_id));
      }
    }

    if submissions.is_empty() {
      return Err(OrdlError::UnknownVenue(venue_id.to_string()));
    }
    Ok(submissions)
  }

  async fn fetch_pdf(&self, content: &ContentRef) -> Result<Vec<u8>> {
    let response = self
      .client
      .get(self.endpoint("attachment")?)
      .query(&[("id", content.0.as_str()), ("name", "pdf")])
      .send()
      .await?;
    check_status(response).await
  }
}

/// Reads the body of a successful response, mapping failures onto [`OrdlError`].
async fn check_status(response: reqwest::Response) -> Result<Vec<u8>> {
  let status = response.status();
  if status == StatusCode::NOT_FOUND {
    return Err(OrdlError::NotFound);
  }
  if !status.is_success() {
    let message = response.text().await.unwrap_or_default();
    return Err(OrdlError::Api { status: status.as_u16(), message });
  }
  Ok(response.bytes().await?.to_vec())
}

impl Note {
  /// Returns a content field, unwrapping `{ "value": .. }` when present.
  fn field(&self, key: &str) -> Option<&Value> {
    let raw = self.content.get(key)?;
    match raw.get("value") {
      Some(inner) => Some(inner),
      None => Some(raw),
    }
  }

  /// A content field rendered as text; lists are joined with `", "`.
  fn text(&self, key: &str) -> String {
    match self.field(key) {
      Some(Value::String(s)) => s.clone(),
      Some(Value::Array(items)) =>
        items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(", "),
      Some(Value::Null) | None => String::new(),
      Some(other) => other.to_string(),
    }
  }

  /// A content field holding a list of strings. A bare string is split on commas.
  fn list(&self, key: &str) -> Vec<String> {
    match self.field(key) {
      Some(Value::Array(items)) =>
        items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
      Some(Value::String(s)) =>
        s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect(),
      _ => Vec::new(),
    }
  }

  /// Pairs `authors` with `authorids` by position. Ids without a name stand in for the name.
  fn authors(&self) -> Vec<Author> {
    let names = self.list("authors");
    let ids = self.list("authorids");
    (0..names.len().max(ids.len()))
      .filter_map(|i| {
        let id = ids.get(i).cloned();
        let name = names.get(i).cloned().or_else(|| id.clone())?;
        Some(Author { name, profile_id: id })
      })
      .collect()
  }

  /// Flattens the note into a [`Submission`] for `venue_id`.
  fn into_submission(self, venue_id: &str) -> Submission {
    let venue = self.text("venue");
    let metadata = match Group::of(&self.text("venueid"), venue_id) {
      Group::Accepted => [venue.clone(), self.text("decision"), "accepted".to_string()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect(),
      Group::Rejected => vec!["rejected".to_string()],
      Group::Other => [venue.clone(), self.text("decision")]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect(),
    };

    Submission {
      content: ContentRef(self.id.clone()),
      number: self.number,
      title: self.text("title"),
      abstract_text: self.text("abstract"),
      keywords: self.list("keywords"),
      authors: self.authors(),
      venue,
      metadata,
      id: self.id,
    }
  }
}

/// The venue group a note is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
  /// `venueid` is the venue itself
  Accepted,
  /// `venueid` is one of the venue's rejected groups
  Rejected,
  /// Anything else, e.g. a note still under review
  Other,
}

impl Group {
  /// Classifies a note's `venueid` relative to the listed venue.
  fn of(venueid: &str, venue_id: &str) -> Self {
    if venueid == venue_id {
      return Group::Accepted;
    }
    let rejected = venueid
      .strip_prefix(venue_id)
      .and_then(|rest| rest.strip_prefix('/'))
      .is_some_and(|suffix| suffix.ends_with("Rejected_Submission"));
    if rejected {
      Group::Rejected
    } else {
      Group::Other
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  const VENUE: &str = "ICLR.cc/2024/Conference";

  fn note(value: Value) -> Note { serde_json::from_value(value).unwrap() }

  #[test]
  fn test_accepted_note_gets_accepted_token() {
    let submission = note(json!({
      "id": "abc",
      "number": 12,
      "content": {
        "title": { "value": "Deep Things" },
        "venue": { "value": "ICLR 2024 oral" },
        "venueid": { "value": VENUE },
        "abstract": { "value": "We study deep things." },
        "keywords": { "value": ["depth", "things"] },
        "authors": { "value": ["Ada", "Alan"] },
        "authorids": { "value": ["~Ada_Lovelace1", "~Alan_Turing1"] }
      }
    }))
    .into_submission(VENUE);

    assert_eq!(submission.id, "abc");
    assert_eq!(submission.number, Some(12));
    assert_eq!(submission.title, "Deep Things");
    assert_eq!(submission.abstract_text, "We study deep things.");
    assert_eq!(submission.keywords, vec!["depth".to_string(), "things".to_string()]);
    assert_eq!(submission.venue, "ICLR 2024 oral");
    assert_eq!(submission.authors, vec![
      Author::new("Ada").with_profile_id("~Ada_Lovelace1"),
      Author::new("Alan").with_profile_id("~Alan_Turing1"),
    ]);
    assert_eq!(submission.content, ContentRef("abc".into()));
    assert!(submission.metadata.contains(&"accepted".to_string()));
    assert!(!submission.metadata.iter().any(|m| m.contains("ICLR.cc")));
    assert_eq!(submission.decision(), Decision::Oral);
  }

  #[test]
  fn test_rejected_group_ignores_venue_spelling() {
    let venue = "NeurIPS.cc/2024/Workshop/Behavioral_ML";
    let submission = note(json!({
      "id": "beh",
      "content": {
        "title": { "value": "Watching Agents" },
        "venue": { "value": "Submitted to Behavioral ML Workshop" },
        "venueid": { "value": format!("{venue}/Rejected_Submission") }
      }
    }))
    .into_submission(venue);

    assert_eq!(submission.metadata, vec!["rejected".to_string()]);
    assert_eq!(submission.decision(), Decision::Rejected);
    assert_eq!(submission.venue, "Submitted to Behavioral ML Workshop");
  }

  #[test]
  fn test_desk_rejected_group_is_rejected() {
    let submission = note(json!({
      "id": "desk",
      "content": {
        "venue": "Accept? No. Oral? No.",
        "venueid": format!("{VENUE}/Desk_Rejected_Submission")
      }
    }))
    .into_submission(VENUE);
    assert_eq!(submission.decision(), Decision::Rejected);
  }

  #[test]
  fn test_group_of() {
    assert_eq!(Group::of(VENUE, VENUE), Group::Accepted);
    assert_eq!(Group::of(&format!("{VENUE}/Rejected_Submission"), VENUE), Group::Rejected);
    assert_eq!(Group::of(&format!("{VENUE}/Desk_Rejected_Submission"), VENUE), Group::Rejected);
    assert_eq!(Group::of(&format!("{VENUE}/Submission"), VENUE), Group::Other);
    assert_eq!(Group::of("ICLR.cc/2024/Conference_Rejected_Submission", VENUE), Group::Other);
    assert_eq!(Group::of("", VENUE), Group::Other);
  }

  #[test]
  fn test_authors_without_names_fall_back_to_ids() {
    let submission = note(json!({
      "id": "a",
      "content": {
        "authors": ["Ada"],
        "authorids": ["~Ada_Lovelace1", "alan@example.com"],
        "keywords": "depth, , things"
      }
    }))
    .into_submission(VENUE);

    let names: Vec<_> = submission.authors.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Ada", "alan@example.com"]);
    assert_eq!(submission.keywords, vec!["depth".to_string(), "things".to_string()]);
  }

  #[test]
  fn test_rejected_group_note() {
    let submission = note(json!({
      "id": "rej",
      "content": {
        "title": "Shallow Things",
        "venue": "Submitted to ICLR 2024",
        "venueid": format!("{VENUE}/Rejected_Submission")
      }
    }))
    .into_submission(VENUE);

    assert_eq!(submission.title, "Shallow Things");
    assert!(!submission.metadata.contains(&"accepted".to_string()));
    assert_eq!(submission.decision(), Decision::Rejected);
  }

  #[test]
  fn test_note_without_content() {
    let submission = note(json!({ "id": "bare" })).into_submission(VENUE);
    assert!(submission.title.is_empty());
    assert!(submission.metadata.is_empty());
    assert_eq!(submission.decision(), Decision::Unknown);
  }

  #[test]
  fn test_decision_field_is_used() {
    let submission = note(json!({
      "id": "d",
      "content": {
        "venueid": { "value": VENUE },
        "decision": { "value": "Accept (spotlight)" }
      }
    }))
    .into_submission(VENUE);
    assert_eq!(submission.decision(), Decision::Spotlight);
  }

  #[test]
  fn test_invalid_base_url() {
    let err = OpenReview::with_base_url("not a url", Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, OrdlError::Config(_)));
  }
}
