//! Module for the "info" command.

use super::*;

/// Options for [`Commands::Info`].
#[derive(Args, Clone)]
pub struct InfoArgs {
  /// Venue to list instead of the configured one
  #[arg(long)]
  pub venue_id: Option<String>,
}

/// Function for the [`Commands::Info`] in the CLI.
///
/// Only talks to the venue; the ledger is neither opened nor created.
pub async fn info(cli: &Cli, config: Config, args: InfoArgs) -> Result<()> {
  let config = match args.venue_id {
    Some(venue_id) => config.with_venue_id(venue_id),
    None => config,
  };

  cli.reply(ResponseContent::Info(&format!("Listing submissions of {}", config.venue_id)))?;

  let source = config.source()?;
  let info = survey(&source, &config.download_options()?).await?;

  cli.reply(ResponseContent::Venue(&info))?;
  Ok(())
}
