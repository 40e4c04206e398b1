//! Module for the "status" command.

use super::*;

/// Options for [`Commands::Status`].
#[derive(Args, Clone)]
pub struct StatusArgs {
  /// Venue to report on instead of the configured one
  #[arg(long)]
  pub venue_id: Option<String>,
  /// Only report this decision
  #[arg(long, value_parser = parse_decision)]
  pub decision: Option<Decision>,
}

/// Function for the [`Commands::Status`] in the CLI.
pub async fn status(cli: &Cli, config: Config, args: StatusArgs) -> Result<()> {
  let venue_id = args.venue_id.unwrap_or(config.venue_id);
  let decisions = match args.decision {
    Some(decision) => vec![decision],
    None => Decision::REQUESTABLE.to_vec(),
  };

  let ledger = Ledger::open(&config.database_path).await?;
  cli.reply(ResponseContent::Info(&format!("Ledger status for {venue_id}")))?;

  let mut recorded = 0;
  for decision in decisions {
    let records = ledger.list_by_decision(&venue_id, decision).await?;
    if records.is_empty() {
      continue;
    }
    recorded += records.len();
    cli.reply(ResponseContent::Records(decision, &records))?;
  }

  if recorded == 0 {
    cli.reply(ResponseContent::Info("No downloads recorded yet"))?;
  }
  Ok(())
}
