//! Module for the "download" command.

use std::sync::Arc;

use super::*;

/// Options for [`Commands::Download`]. Flags override the configuration file.
#[derive(Args, Clone)]
pub struct DownloadArgs {
  /// Decisions to download as a comma separated list, e.g. "oral,rejected". `accepted`
  /// includes orals and spotlights.
  pub decisions:   Option<String>,
  /// Venue to download from, e.g. "NeurIPS.cc/2025/Conference"
  #[arg(long)]
  pub venue_id:    Option<String>,
  /// Root directory for downloaded papers
  #[arg(long)]
  pub out_dir:     Option<PathBuf>,
  /// Download again even if the ledger says a paper is already on disk
  #[arg(long)]
  pub force:       bool,
  /// Number of papers downloaded at once
  #[arg(long)]
  pub concurrency: Option<usize>,
}

/// Function for the [`Commands::Download`] in the CLI.
pub async fn download(cli: &Cli, config: Config, args: DownloadArgs) -> Result<()> {
  let DownloadArgs { decisions, venue_id, out_dir, force, concurrency } = args;

  let mut config = config;
  if let Some(decisions) = decisions {
    config = config.with_decisions(Decision::parse_list(&decisions)?);
  }
  if let Some(venue_id) = venue_id {
    config = config.with_venue_id(venue_id);
  }
  if let Some(out_dir) = out_dir {
    config = config.with_out_dir(out_dir);
  }
  if let Some(concurrency) = concurrency {
    config = config.with_concurrency(concurrency);
  }
  if force {
    config = config.with_skip_existing(false);
  }

  if config.decisions.is_empty() {
    cli.reply(ResponseContent::Warning("No decisions requested, nothing to download"))?;
    return Ok(());
  }

  let options = config.download_options()?;
  let source = Arc::new(config.source()?);
  let ledger = Ledger::open(&config.database_path).await?;

  cli.reply(ResponseContent::Info(&format!(
    "Downloading {} papers from {} into {}",
    options.decisions.iter().map(Decision::as_str).collect::<Vec<_>>().join(", "),
    options.venue_id,
    options.out_dir.display(),
  )))?;

  let cancel = CancellationToken::new();
  let interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      eprintln!(
        "{} Interrupted, finishing papers in flight",
        style(WARNING_PREFIX).yellow()
      );
      interrupt.cancel();
    }
  });

  let summary = Downloader::new(source, ledger, options).run(cancel).await?;
  cli.reply(ResponseContent::Summary(&summary))?;
  Ok(())
}
