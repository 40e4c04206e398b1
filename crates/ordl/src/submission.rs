//! Submissions as reported by a venue source.

use super::*;

/// Opaque handle a [`SubmissionSource`](crate::source::SubmissionSource) resolves to PDF bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef(pub String);

impl Display for ContentRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

/// An author as listed on a submission.
///
/// ```
/// use ordl::submission::Author;
///
/// let author = Author::new("Ada Lovelace").with_profile_id("~Ada_Lovelace1");
/// assert_eq!(author.profile_id.as_deref(), Some("~Ada_Lovelace1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
  /// Display name
  pub name:       String,
  /// Venue profile id or email the author signed up with
  pub profile_id: Option<String>,
}

impl Author {
  /// An author known only by name.
  pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), profile_id: None } }

  /// Sets the profile id.
  pub fn with_profile_id(mut self, profile_id: impl Into<String>) -> Self {
    self.profile_id = Some(profile_id.into());
    self
  }
}

/// One paper submitted to a venue.
///
/// `metadata` holds every decision-bearing string the source could find, already flattened
/// into plain text. The classifier only ever looks at this list. The descriptive fields are
/// stored in the ledger once the PDF has been downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
  /// Venue-scoped unique identifier
  pub id:            String,
  /// Paper number within the venue, when the source reports one
  pub number:        Option<u64>,
  /// Paper title
  pub title:         String,
  /// Abstract, empty when the source has none
  pub abstract_text: String,
  /// Author supplied keywords
  pub keywords:      Vec<String>,
  /// Human readable venue line, e.g. `"ICLR 2024 oral"`
  pub venue:         String,
  /// Authors in byline order
  pub authors:       Vec<Author>,
  /// Raw decision and venue strings
  pub metadata:      Vec<String>,
  /// Handle used to fetch the PDF
  pub content:       ContentRef,
}

impl Submission {
  /// Creates a submission whose content handle is its own id.
  pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
    let id = id.into();
    Self {
      content: ContentRef(id.clone()),
      id,
      number: None,
      title: title.into(),
      abstract_text: String::new(),
      keywords: Vec::new(),
      venue: String::new(),
      authors: Vec::new(),
      metadata: Vec::new(),
    }
  }

  /// Adds one raw metadata string.
  pub fn with_metadata(mut self, value: impl Into<String>) -> Self {
    self.metadata.push(value.into());
    self
  }

  /// Sets the paper number.
  pub fn with_number(mut self, number: u64) -> Self {
    self.number = Some(number);
    self
  }

  /// Sets the abstract.
  pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
    self.abstract_text = abstract_text.into();
    self
  }

  /// Sets the keywords.
  pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
    self.keywords = keywords;
    self
  }

  /// Sets the venue line.
  pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
    self.venue = venue.into();
    self
  }

  /// Sets the author list.
  pub fn with_authors(mut self, authors: Vec<Author>) -> Self {
    self.authors = authors;
    self
  }

  /// Overrides the content handle.
  pub fn with_content(mut self, content: ContentRef) -> Self {
    self.content = content;
    self
  }

  /// The decision implied by this submission's metadata.
  pub fn decision(&self) -> Decision { classify(&self.metadata) }
}
