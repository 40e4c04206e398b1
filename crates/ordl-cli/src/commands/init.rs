//! Module for setting up an `ordl` configuration

use super::*;

/// Options for [`Commands::Init`]. Anything not given keeps its default.
#[derive(Args, Clone)]
pub struct InitArgs {
  /// Venue to download from, e.g. "ICLR.cc/2024/Conference"
  #[arg(long)]
  pub venue_id:  Option<String>,
  /// Default decisions as a comma separated list, e.g. "oral,spotlight"
  #[arg(long)]
  pub decisions: Option<String>,
  /// Root directory for downloaded papers
  #[arg(long)]
  pub out_dir:   Option<PathBuf>,
  /// Location of the ledger database
  #[arg(long)]
  pub db_path:   Option<PathBuf>,
}

/// Function for the [`Commands::Init`] in the CLI.
pub async fn init(cli: &Cli, config: Config, args: InitArgs) -> Result<()> {
  let InitArgs { venue_id, decisions, out_dir, db_path } = args;
  let path = cli.config_path();

  if path.exists()
    && !cli.confirm(&format!(
      "A configuration already exists at {}. Overwrite it?",
      path.display()
    ))?
  {
    cli.reply(ResponseContent::Info("Keeping the existing configuration"))?;
    return Ok(());
  }

  let mut config = config;
  if let Some(venue_id) = venue_id {
    config = config.with_venue_id(venue_id);
  }
  if let Some(decisions) = decisions {
    config = config.with_decisions(Decision::parse_list(&decisions)?);
  }
  if let Some(out_dir) = out_dir {
    config = config.with_out_dir(out_dir);
  }
  if let Some(db_path) = db_path {
    config = config.with_database_path(db_path);
  }
  config.validate()?;

  config.save(&path)?;
  // Opening the ledger creates the database and its schema
  Ledger::open(&config.database_path).await?;

  cli.reply(ResponseContent::Success(&format!(
    "Created ordl configuration with\nConfig path: {}\nVenue: {}\nDecisions: {}\nDatabase path: \
     {}\nOutput directory: {}",
    path.display(),
    config.venue_id,
    config.decisions.iter().map(Decision::as_str).collect::<Vec<_>>().join(", "),
    config.database_path.display(),
    config.out_dir.display(),
  )))?;
  Ok(())
}
