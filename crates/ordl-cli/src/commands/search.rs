//! Module for the "search" command.

use super::*;

/// Options for [`Commands::Search`].
#[derive(Args, Clone)]
pub struct SearchArgs {
  /// Search query over titles, abstracts, keywords and authors (FTS5 syntax)
  pub query: String,

  /// Only search papers of this venue
  #[arg(long)]
  pub venue_id: Option<String>,

  /// Show abstracts and keywords
  #[arg(long)]
  pub detailed: bool,
}

/// Function for the [`Commands::Search`] in the CLI.
pub async fn search(cli: &Cli, config: Config, args: SearchArgs) -> Result<()> {
  let SearchArgs { query, venue_id, detailed } = args;

  let ledger = Ledger::open(&config.database_path).await?;
  cli.reply(ResponseContent::Info(&format!("Searching for: {query}")))?;

  let papers = ledger.search(&query, venue_id.as_deref()).await?;
  if papers.is_empty() {
    return cli.reply(ResponseContent::Info("No downloaded papers match the query"));
  }
  cli.reply(ResponseContent::Papers(&papers, detailed))
}
