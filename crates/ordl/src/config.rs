//! Persistent configuration.
//!
//! A [`Config`] is stored as TOML, by default at [`Config::default_path`]. Every field has a
//! default, so a partial file (or none at all) is valid:
//!
//! ```toml
//! venue_id = "ICLR.cc/2024/Conference"
//! decisions = ["oral", "rejected"]
//! concurrency = 8
//!
//! [retry]
//! max_attempts = 3
//! ```

use crate::{downloader::DownloadOptions, retry::RetryPolicy, source::OpenReview};

use super::*;

/// Venue used when none is configured.
pub const DEFAULT_VENUE_ID: &str = "NeurIPS.cc/2025/Conference";

/// User settings for `ordl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Venue to download from
  pub venue_id:             String,
  /// Decisions requested when none are given on the command line
  pub decisions:            BTreeSet<Decision>,
  /// Root of the output tree
  pub out_dir:              PathBuf,
  /// Location of the ledger database
  pub database_path:        PathBuf,
  /// Fetches in flight at once
  pub concurrency:          usize,
  /// Skip submissions that were already downloaded
  pub skip_existing:        bool,
  /// OpenReview API root
  pub api_base_url:         String,
  /// Timeout of a single HTTP request, in seconds
  pub request_timeout_secs: u64,
  /// Timeout of one listing attempt, in seconds
  pub list_timeout_secs:    u64,
  /// Retry behaviour for listing and fetching
  pub retry:                RetrySettings,
}

/// The `[retry]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
  /// Total attempts, including the first
  pub max_attempts:    u32,
  /// Delay after the first failure, in seconds
  pub base_delay_secs: f64,
  /// Growth of the delay per failure
  pub factor:          f64,
  /// Cap for a single delay, in seconds
  pub max_delay_secs:  f64,
  /// Add up to 100% random extra delay
  pub jitter:          bool,
}

impl Default for RetrySettings {
  fn default() -> Self {
    let policy = RetryPolicy::default();
    Self {
      max_attempts:    policy.max_attempts,
      base_delay_secs: policy.base_delay.as_secs_f64(),
      factor:          policy.factor,
      max_delay_secs:  policy.max_delay.as_secs_f64(),
      jitter:          policy.jitter,
    }
  }
}

impl RetrySettings {
  /// Converts the table into a [`RetryPolicy`], rejecting values that make no sense.
  pub fn policy(&self) -> Result<RetryPolicy> {
    if self.max_attempts == 0 {
      return Err(OrdlError::Config("retry.max_attempts must be at least 1".into()));
    }
    if !self.factor.is_finite() || self.factor < 1.0 {
      return Err(OrdlError::Config(format!("retry.factor must be >= 1.0, got {}", self.factor)));
    }
    Ok(RetryPolicy {
      max_attempts: self.max_attempts,
      base_delay:   seconds("retry.base_delay_secs", self.base_delay_secs)?,
      factor:       self.factor,
      max_delay:    seconds("retry.max_delay_secs", self.max_delay_secs)?,
      jitter:       self.jitter,
    })
  }
}

/// Parses a non-negative number of seconds.
fn seconds(field: &str, value: f64) -> Result<Duration> {
  Duration::try_from_secs_f64(value)
    .map_err(|_| OrdlError::Config(format!("{field} must be a non-negative number, got {value}")))
}

impl Default for Config {
  fn default() -> Self {
    Self {
      venue_id:             DEFAULT_VENUE_ID.to_string(),
      decisions:            BTreeSet::from([
        Decision::Oral,
        Decision::Spotlight,
        Decision::Accepted,
      ]),
      out_dir:              Self::default_out_dir(),
      database_path:        crate::ledger::Ledger::default_path(),
      concurrency:          crate::downloader::DEFAULT_CONCURRENCY,
      skip_existing:        true,
      api_base_url:         crate::source::DEFAULT_BASE_URL.to_string(),
      request_timeout_secs: 60,
      list_timeout_secs:    crate::downloader::DEFAULT_LIST_TIMEOUT.as_secs(),
      retry:                RetrySettings::default(),
    }
  }
}

impl Config {
  /// Returns the default location of the configuration file.
  ///
  /// - On Unix: `~/.config/ordl/config.toml`
  /// - On macOS: `~/Library/Application Support/ordl/config.toml`
  /// - On Windows: `%APPDATA%\ordl\config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("ordl").join("config.toml")
  }

  /// Returns the default output root, `<documents>/ordl/papers`.
  pub fn default_out_dir() -> PathBuf {
    dirs::document_dir()
      .or_else(dirs::home_dir)
      .unwrap_or_else(|| PathBuf::from("."))
      .join("ordl")
      .join("papers")
  }

  /// Reads and validates the configuration at `path`.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!("Loading config from {path:?}");
    let config: Config = toml::from_str(&std::fs::read_to_string(path)?)?;
    config.validate()?;
    Ok(config)
  }

  /// Like [`load`](Self::load), but returns the defaults when `path` does not exist.
  pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if path.exists() {
      Self::load(path)
    } else {
      debug!("No config at {path:?}, using defaults");
      Ok(Self::default())
    }
  }

  /// Writes the configuration to `path`, creating parent directories.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    info!("Saved config to {path:?}");
    Ok(())
  }

  /// Checks values that deserialize fine but cannot be used.
  pub fn validate(&self) -> Result<()> {
    if self.venue_id.trim().is_empty() {
      return Err(OrdlError::Config("venue_id must not be empty".into()));
    }
    for decision in &self.decisions {
      decision.requestable()?;
    }
    self.retry.policy()?;
    Ok(())
  }

  /// Sets the venue.
  pub fn with_venue_id(mut self, venue_id: impl Into<String>) -> Self {
    self.venue_id = venue_id.into();
    self
  }

  /// Sets the requested decisions.
  pub fn with_decisions(mut self, decisions: impl IntoIterator<Item = Decision>) -> Self {
    self.decisions = decisions.into_iter().collect();
    self
  }

  /// Sets the output root.
  pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
    self.out_dir = out_dir.into();
    self
  }

  /// Sets the ledger location.
  pub fn with_database_path(mut self, database_path: impl Into<PathBuf>) -> Self {
    self.database_path = database_path.into();
    self
  }

  /// Sets the number of concurrent fetches.
  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = concurrency;
    self
  }

  /// Sets whether downloaded submissions are skipped.
  pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
    self.skip_existing = skip_existing;
    self
  }

  /// Sets the API root.
  pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
    self.api_base_url = api_base_url.into();
    self
  }

  /// Builds the parameters of a run from this configuration.
  pub fn download_options(&self) -> Result<DownloadOptions> {
    self.validate()?;
    Ok(
      DownloadOptions::new(self.venue_id.clone())
        .with_decisions(self.decisions.iter().copied())
        .with_out_dir(self.out_dir.clone())
        .with_skip_existing(self.skip_existing)
        .with_concurrency(self.concurrency)
        .with_retry(self.retry.policy()?)
        .with_list_timeout(Duration::from_secs(self.list_timeout_secs)),
    )
  }

  /// Builds an OpenReview client for the configured API root.
  pub fn source(&self) -> Result<OpenReview> {
    OpenReview::with_base_url(&self.api_base_url, Duration::from_secs(self.request_timeout_secs))
  }
}
