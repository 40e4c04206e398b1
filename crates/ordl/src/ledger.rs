//! Persistent ledger of download attempts.
//!
//! The ledger is a SQLite table keyed by `(venue_id, submission_id)`. It is what makes runs
//! resumable: a submission with a [`DownloadStatus::Downloaded`] row is skipped by later runs
//! unless a re-download is forced.
//!
//! Next to the download rows the ledger keeps the descriptive metadata of every downloaded
//! paper (abstract, keywords, venue line and authors) in a `papers` table with an FTS5 index,
//! so a local collection can be searched without going back to the venue.
//!
//! All statements run on the single background thread owned by the async connection. Every
//! download write is one SQL statement, and metadata is written in one transaction, so readers
//! never observe a half-applied update.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use ordl::{decision::Decision, ledger::{DownloadRecord, Ledger}, submission::Submission};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = Ledger::open("ordl.db").await?;
//! let submission = Submission::new("abc", "A Paper");
//! let venue = "ICLR.cc/2024/Conference";
//! let record = DownloadRecord::new(venue, &submission, Decision::Oral, PathBuf::from("a.pdf"));
//! ledger.upsert(&record.downloaded()).await?;
//! assert!(ledger.exists(venue, "abc").await?);
//! # Ok(())
//! # }
//! ```

use rusqlite::{params, types::Type, Row};
use tokio_rusqlite::Connection;

use super::*;

/// Where a submission's download stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
  /// Planned for download in a run that has not recorded an outcome yet
  Pending,
  /// The PDF is on disk at the recorded path
  Downloaded,
  /// The last attempt failed; see the recorded error
  Failed,
}

impl DownloadStatus {
  /// Lowercase form stored in the database.
  pub fn as_str(&self) -> &'static str {
    match self {
      DownloadStatus::Pending => "pending",
      DownloadStatus::Downloaded => "downloaded",
      DownloadStatus::Failed => "failed",
    }
  }
}

impl Display for DownloadStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for DownloadStatus {
  type Err = OrdlError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pending" => Ok(DownloadStatus::Pending),
      "downloaded" => Ok(DownloadStatus::Downloaded),
      "failed" => Ok(DownloadStatus::Failed),
      other => Err(OrdlError::Config(format!("Unknown download status \"{other}\""))),
    }
  }
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
  /// Venue the submission belongs to
  pub venue_id:      String,
  /// Venue-scoped submission id
  pub submission_id: String,
  /// Title at the time of the last write
  pub title:         String,
  /// Most specific decision at the time of the last write
  pub decision:      Decision,
  /// Local PDF location
  pub path:          PathBuf,
  /// Current status
  pub status:        DownloadStatus,
  /// Reason for the last failure, if the status is [`DownloadStatus::Failed`]
  pub error:         Option<String>,
  /// Number of recorded outcomes for this key. Ignored on write; the ledger maintains it.
  pub attempts:      u32,
  /// Time of the last write
  pub attempted_at:  DateTime<Utc>,
}

impl DownloadRecord {
  /// A [`DownloadStatus::Pending`] record stamped with the current time.
  pub fn new(
    venue_id: impl Into<String>,
    submission: &Submission,
    decision: Decision,
    path: PathBuf,
  ) -> Self {
    Self {
      venue_id: venue_id.into(),
      submission_id: submission.id.clone(),
      title: submission.title.clone(),
      decision,
      path,
      status: DownloadStatus::Pending,
      error: None,
      attempts: 0,
      attempted_at: Utc::now(),
    }
  }

  /// Marks the record as downloaded.
  pub fn downloaded(mut self) -> Self {
    self.status = DownloadStatus::Downloaded;
    self.error = None;
    self.attempted_at = Utc::now();
    self
  }

  /// Marks the record as failed with `reason`.
  pub fn failed(mut self, reason: impl Into<String>) -> Self {
    self.status = DownloadStatus::Failed;
    self.error = Some(reason.into());
    self.attempted_at = Utc::now();
    self
  }
}

/// Stored metadata of a downloaded paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
  /// Venue the paper belongs to
  pub venue_id:      String,
  /// Venue-scoped submission id
  pub submission_id: String,
  /// Paper number within the venue
  pub number:        Option<u64>,
  /// Paper title
  pub title:         String,
  /// Abstract
  pub abstract_text: String,
  /// Author supplied keywords
  pub keywords:      Vec<String>,
  /// Human readable venue line
  pub venue:         String,
  /// Authors in byline order
  pub authors:       Vec<Author>,
  /// Decision of the matching download row, if there is one
  pub decision:      Option<Decision>,
  /// Local PDF location of the matching download row, if there is one
  pub path:          Option<PathBuf>,
  /// Time the metadata was last written
  pub ingested_at:   DateTime<Utc>,
}

/// Columns selected for a [`DownloadRecord`], in the order [`record_from_row`] reads them.
const RECORD_COLUMNS: &str = "venue_id, submission_id, title, decision, path, status, \
                              error_message, attempts, attempted_at";

/// Handle to the download ledger.
///
/// Cloning is cheap; clones share the same underlying connection.
#[derive(Clone)]
pub struct Ledger {
  /// Async SQLite connection handle
  conn: Connection,
}

impl Ledger {
  /// Opens the ledger at `path`, creating the file, its parent directories and the schema as
  /// needed.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await?;
    }
    debug!("Opening ledger at {path:?}");
    Self::init(Connection::open(path).await?).await
  }

  /// Opens a ledger that lives only as long as the handle.
  pub async fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory().await?).await
  }

  /// Applies the schema migration.
  async fn init(conn: Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(include_str!(concat!(
          env!("CARGO_MANIFEST_DIR"),
          "/migrations/init.sql"
        )))?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  /// Returns the default path for the ledger file.
  ///
  /// - On Unix: `~/.local/share/ordl/ordl.db`
  /// - On macOS: `~/Library/Application Support/ordl/ordl.db`
  /// - On Windows: `%APPDATA%\ordl\ordl.db`
  /// - Fallback: `./ordl/ordl.db`
  pub fn default_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("ordl").join("ordl.db")
  }

  /// Whether a [`DownloadStatus::Downloaded`] record exists for the key.
  pub async fn exists(&self, venue_id: &str, submission_id: &str) -> Result<bool> {
    let venue_id = venue_id.to_string();
    let submission_id = submission_id.to_string();
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare_cached(
            "SELECT EXISTS(
               SELECT 1 FROM downloads
               WHERE venue_id = ?1 AND submission_id = ?2 AND status = 'downloaded'
             )",
          )?;
          Ok(stmt.query_row(params![venue_id, submission_id], |row| row.get::<_, bool>(0))?)
        })
        .await?,
    )
  }

  /// Creates or replaces the record for its key and returns the stored attempt count.
  ///
  /// A new row starts with one attempt; replacing an existing row increments its count.
  pub async fn upsert(&self, record: &DownloadRecord) -> Result<u32> {
    let record = record.clone();
    trace!(
      venue = %record.venue_id,
      submission = %record.submission_id,
      status = %record.status,
      "Upserting ledger record"
    );
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare_cached(
            "INSERT INTO downloads (
               venue_id, submission_id, title, decision, path,
               status, error_message, attempts, attempted_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)
             ON CONFLICT (venue_id, submission_id) DO UPDATE SET
               title         = excluded.title,
               decision      = excluded.decision,
               path          = excluded.path,
               status        = excluded.status,
               error_message = excluded.error_message,
               attempts      = downloads.attempts + 1,
               attempted_at  = excluded.attempted_at
             RETURNING attempts",
          )?;
          Ok(stmt.query_row(
            params![
              record.venue_id,
              record.submission_id,
              record.title,
              record.decision.as_str(),
              record.path.to_string_lossy().into_owned(),
              record.status.as_str(),
              record.error,
              record.attempted_at,
            ],
            |row| row.get::<_, u32>(0),
          )?)
        })
        .await?,
    )
  }

  /// Inserts a [`DownloadStatus::Pending`] row with no attempts if the key has no record yet.
  ///
  /// Existing rows are left untouched. Returns whether a row was inserted.
  pub async fn mark_pending(&self, record: &DownloadRecord) -> Result<bool> {
    let record = record.clone();
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare_cached(
            "INSERT INTO downloads (
               venue_id, submission_id, title, decision, path,
               status, error_message, attempts, attempted_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', NULL, 0, ?6)
             ON CONFLICT (venue_id, submission_id) DO NOTHING",
          )?;
          let inserted = stmt.execute(params![
            record.venue_id,
            record.submission_id,
            record.title,
            record.decision.as_str(),
            record.path.to_string_lossy().into_owned(),
            record.attempted_at,
          ])?;
          Ok(inserted == 1)
        })
        .await?,
    )
  }

  /// Fetches the record for a key.
  pub async fn get(&self, venue_id: &str, submission_id: &str) -> Result<Option<DownloadRecord>> {
    let venue_id = venue_id.to_string();
    let submission_id = submission_id.to_string();
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare_cached(&format!(
            "SELECT {RECORD_COLUMNS} FROM downloads WHERE venue_id = ?1 AND submission_id = ?2"
          ))?;
          match stmt.query_row(params![venue_id, submission_id], record_from_row) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
          }
        })
        .await?,
    )
  }

  /// Lists every record of a venue stored with exactly `decision`, ordered by submission id.
  pub async fn list_by_decision(
    &self,
    venue_id: &str,
    decision: Decision,
  ) -> Result<Vec<DownloadRecord>> {
    let venue_id = venue_id.to_string();
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare_cached(&format!(
            "SELECT {RECORD_COLUMNS} FROM downloads
             WHERE venue_id = ?1 AND decision = ?2
             ORDER BY submission_id"
          ))?;
          let records = stmt
            .query_map(params![venue_id, decision.as_str()], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
          Ok(records)
        })
        .await?,
    )
  }
}

impl Ledger {
  /// Stores the descriptive metadata of `submission` and refreshes its search entry.
  ///
  /// An existing entry for the key is replaced, authors included. Runs in one transaction.
  pub async fn ingest(&self, venue_id: &str, submission: &Submission) -> Result<()> {
    let venue_id = venue_id.to_string();
    let submission = submission.clone();
    let keywords = serde_json::to_string(&submission.keywords)?;
    trace!(venue = %venue_id, submission = %submission.id, "Ingesting paper metadata");

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id = submission.id.as_str();

        tx.execute(
          "INSERT INTO papers (
             venue_id, submission_id, number, title, abstract_text, keywords, venue, ingested_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (venue_id, submission_id) DO UPDATE SET
             number        = excluded.number,
             title         = excluded.title,
             abstract_text = excluded.abstract_text,
             keywords      = excluded.keywords,
             venue         = excluded.venue,
             ingested_at   = excluded.ingested_at",
          params![
            venue_id,
            id,
            submission.number.map(|n| n as i64),
            submission.title,
            submission.abstract_text,
            keywords,
            submission.venue,
            Utc::now(),
          ],
        )?;

        tx.execute(
          "DELETE FROM paper_authors WHERE venue_id = ?1 AND submission_id = ?2",
          params![venue_id, id],
        )?;
        {
          let mut stmt = tx.prepare_cached(
            "INSERT INTO paper_authors (venue_id, submission_id, position, name, profile_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (position, author) in submission.authors.iter().enumerate() {
            stmt.execute(params![venue_id, id, position as i64, author.name, author.profile_id])?;
          }
        }

        let names = submission.authors.iter().map(|a| a.name.as_str()).collect::<Vec<_>>();
        tx.execute(
          "DELETE FROM papers_fts WHERE venue_id = ?1 AND submission_id = ?2",
          params![venue_id, id],
        )?;
        tx.execute(
          "INSERT INTO papers_fts (venue_id, submission_id, title, abstract_text, keywords, authors)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            venue_id,
            id,
            submission.title,
            submission.abstract_text,
            submission.keywords.join(" "),
            names.join(", "),
          ],
        )?;

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetches the stored metadata of a paper.
  pub async fn paper(&self, venue_id: &str, submission_id: &str) -> Result<Option<PaperRecord>> {
    let venue_id = venue_id.to_string();
    let submission_id = submission_id.to_string();
    Ok(self.conn.call(move |conn| Ok(load_paper(conn, &venue_id, &submission_id)?)).await?)
  }

  /// Searches paper metadata, best match first.
  ///
  /// `query` uses FTS5 syntax and covers titles, abstracts, keywords and author names:
  ///
  /// ```no_run
  /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
  /// let ledger = ordl::ledger::Ledger::open("ordl.db").await?;
  ///
  /// // Simple word search across every venue
  /// let papers = ledger.search("diffusion", None).await?;
  ///
  /// // Phrase search restricted to one venue
  /// let papers = ledger.search("\"graph neural\"", Some("ICLR.cc/2024/Conference")).await?;
  ///
  /// // Column filter
  /// let papers = ledger.search("authors:lovelace", None).await?;
  /// # Ok(())
  /// # }
  /// ```
  pub async fn search(&self, query: &str, venue_id: Option<&str>) -> Result<Vec<PaperRecord>> {
    let query = query.to_string();
    let venue_id = venue_id.map(str::to_string);
    Ok(
      self
        .conn
        .call(move |conn| {
          let keys = {
            let mut stmt = conn.prepare_cached(
              "SELECT venue_id, submission_id FROM papers_fts
               WHERE papers_fts MATCH ?1 AND (?2 IS NULL OR venue_id = ?2)
               ORDER BY rank",
            )?;
            let keys = stmt
              .query_map(params![query, venue_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
              })?
              .collect::<std::result::Result<Vec<_>, _>>()?;
            keys
          };

          let mut papers = Vec::with_capacity(keys.len());
          for (venue_id, submission_id) in keys {
            if let Some(paper) = load_paper(conn, &venue_id, &submission_id)? {
              papers.push(paper);
            }
          }
          Ok(papers)
        })
        .await?,
    )
  }
}

/// Reads a paper and its authors.
fn load_paper(
  conn: &rusqlite::Connection,
  venue_id: &str,
  submission_id: &str,
) -> rusqlite::Result<Option<PaperRecord>> {
  let mut stmt = conn.prepare_cached(
    "SELECT p.venue_id, p.submission_id, p.number, p.title, p.abstract_text, p.keywords,
            p.venue, d.decision, d.path, p.ingested_at
     FROM papers p
     LEFT JOIN downloads d
       ON d.venue_id = p.venue_id AND d.submission_id = p.submission_id
     WHERE p.venue_id = ?1 AND p.submission_id = ?2",
  )?;
  let paper = match stmt.query_row(params![venue_id, submission_id], paper_from_row) {
    Ok(paper) => paper,
    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
    Err(e) => return Err(e),
  };

  let mut author_stmt = conn.prepare_cached(
    "SELECT name, profile_id FROM paper_authors
     WHERE venue_id = ?1 AND submission_id = ?2
     ORDER BY position",
  )?;
  let authors = author_stmt
    .query_map(params![venue_id, submission_id], |row| {
      Ok(Author { name: row.get(0)?, profile_id: row.get(1)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(PaperRecord { authors, ..paper }))
}

/// Reads a [`PaperRecord`] without authors from a row selected by [`load_paper`].
fn paper_from_row(row: &Row<'_>) -> rusqlite::Result<PaperRecord> {
  let keywords: String = row.get(5)?;
  let decision = row
    .get::<_, Option<String>>(7)?
    .map(|d| Decision::from_str(&d))
    .transpose()
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;
  Ok(PaperRecord {
    venue_id: row.get(0)?,
    submission_id: row.get(1)?,
    number: row.get::<_, Option<i64>>(2)?.map(|n| n as u64),
    title: row.get(3)?,
    abstract_text: row.get(4)?,
    keywords: serde_json::from_str(&keywords)
      .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
    venue: row.get(6)?,
    authors: Vec::new(),
    decision,
    path: row.get::<_, Option<String>>(8)?.map(PathBuf::from),
    ingested_at: row.get(9)?,
  })
}

/// Reads a [`DownloadRecord`] from a row selected with [`RECORD_COLUMNS`].
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DownloadRecord> {
  Ok(DownloadRecord {
    venue_id:      row.get(0)?,
    submission_id: row.get(1)?,
    title:         row.get(2)?,
    decision:      Decision::from_str(&row.get::<_, String>(3)?)
      .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
    path:          PathBuf::from(row.get::<_, String>(4)?),
    status:        DownloadStatus::from_str(&row.get::<_, String>(5)?)
      .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
    error:         row.get(6)?,
    attempts:      row.get(7)?,
    attempted_at:  row.get(8)?,
  })
}
