use super::*;

pub mod download;
pub mod info;
pub mod init;
pub mod search;
pub mod status;

pub use download::{download, DownloadArgs};
pub use info::{info, InfoArgs};
pub use init::{init, InitArgs};
pub use search::{search, SearchArgs};
pub use status::{status, StatusArgs};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Write a configuration file with the venue, decisions and output locations
  Init(InitArgs),

  /// Download a venue's papers into one directory per decision
  Download(DownloadArgs),

  /// Count a venue's submissions per decision without downloading anything
  Info(InfoArgs),

  /// Show what the ledger has recorded for a venue
  Status(StatusArgs),

  /// Search the metadata of downloaded papers
  Search(SearchArgs),
}

/// Parses a single requestable decision for `--decision` style flags.
pub fn parse_decision(input: &str) -> std::result::Result<Decision, String> {
  input.parse::<Decision>().and_then(Decision::requestable).map_err(|e| e.to_string())
}
