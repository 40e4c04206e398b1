//! Command line interface for the `ordl` paper downloader.
//!
//! This crate provides the `ordl` binary on top of the [`ordl`] library. It supports:
//! - Writing a configuration file with the venue, decisions and output locations
//! - Downloading a venue's papers partitioned by review decision
//! - Counting a venue's submissions per decision without downloading
//! - Reporting what the local ledger has recorded
//! - Searching the titles, abstracts, keywords and authors of downloaded papers
//!
//! # Usage
//!
//! ```bash
//! # Write a configuration
//! ordl init --venue-id ICLR.cc/2024/Conference
//!
//! # Download orals and rejected papers
//! ordl download oral,rejected
//!
//! # Download everything accepted again, replacing existing files
//! ordl download accepted --force
//!
//! # Count submissions per decision
//! ordl info
//!
//! # Show what has been downloaded so far
//! ordl status --decision oral
//!
//! # Search downloaded papers
//! ordl search "graph neural" --detailed
//! ```
//!
//! Downloads can be interrupted with Ctrl-C; papers in flight are finished and the next run
//! resumes where this one stopped. Logging verbosity is raised with `-v`, and a log of every
//! run is kept in `ordl.log` next to the ledger database.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use ordl::{
  config::Config,
  decision::Decision,
  downloader::{survey, Downloader},
  ledger::{DownloadRecord, DownloadStatus, Ledger, PaperRecord},
  summary::{RunSummary, VenueInfo},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Download OpenReview papers grouped by review decision")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. If not specified, uses the default platform-specific
  /// config directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,
}

impl Cli {
  /// The configuration file this invocation reads and writes.
  pub fn config_path(&self) -> PathBuf { self.config.clone().unwrap_or_else(Config::default_path) }
}

/// Configures the logging system based on the verbosity level
///
/// # Arguments
///
/// * `verbosity` - Number of times the verbose flag was used (0-4)
/// * `log_dir` - Directory for `ordl.log`; no file is written if it cannot be created
///
/// The console verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` overrides the console level. The log file always records `info` and above.
fn setup_logging(verbosity: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  let console = fmt::layer()
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .with_filter(filter);

  let (file, guard) = match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
    Some(dir) => {
      let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, "ordl.log",
      ));
      let layer = fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_target(true)
        .with_filter(EnvFilter::new("info"));
      (Some(layer), Some(guard))
    },
    None => (None, None),
  };

  tracing_subscriber::registry().with(console).with(file).init();
  guard
}

/// Entry point for the `ordl` CLI application
///
/// Parses the command line, loads the configuration, sets up logging and runs the requested
/// command. Exits with status 1 only when a command fails as a whole; papers that could not be
/// downloaded are reported in the summary instead.
#[tokio::main]
async fn main() {
  let cli = Cli::parse();

  let config = match Config::load_or_default(cli.config_path()) {
    Ok(config) => config,
    Err(e) => {
      eprintln!("{} Failed to load configuration: {}", style(ERROR_PREFIX).red(), style(e).red());
      std::process::exit(1);
    },
  };

  let _guard = setup_logging(cli.verbose, config.database_path.parent());
  trace!("Loaded configuration: {config:?}");

  if let Err(e) = run(&cli, config).await {
    debug!("Command failed: {e:?}");
    eprintln!("{} {}", style(ERROR_PREFIX).red(), style(e).red());
    std::process::exit(1);
  }
}

/// Dispatches to the selected command.
async fn run(cli: &Cli, config: Config) -> Result<()> {
  match cli.command.clone() {
    Commands::Init(options) => init(cli, config, options).await,
    Commands::Download(options) => download(cli, config, options).await,
    Commands::Info(options) => info(cli, config, options).await,
    Commands::Status(options) => status(cli, config, options).await,
    Commands::Search(options) => search(cli, config, options).await,
  }
}
