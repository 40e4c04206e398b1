//! Console output and prompts.

use dialoguer::Confirm;

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for work in progress
pub static WORKING_PREFIX: &str = "» ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "! ";
/// Prefix for user prompts
pub static PROMPT_PREFIX: &str = "❯ ";
/// Tree item that has siblings below it
pub static ITEM_PREFIX: &str = "├─";
/// Last tree item
pub static LAST_ITEM_PREFIX: &str = "└─";
/// Continuation line for tree structure
pub static CONTINUE_PREFIX: &str = "│  ";

/// What a command wants to show.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// Outcome of a download run
  Summary(&'a RunSummary),
  /// Per-decision counts of a venue
  Venue(&'a VenueInfo),
  /// Ledger rows stored under one decision
  Records(Decision, &'a [DownloadRecord]),
  /// Search hits, with abstracts and keywords when the flag is set
  Papers(&'a [PaperRecord], bool),
  /// Something finished
  Success(&'a str),
  /// Neutral information
  Info(&'a str),
  /// Something the user should look at
  Warning(&'a str),
}

/// How commands talk to the user.
pub trait UserInteraction {
  /// Asks a yes/no question.
  fn confirm(&self, message: &str) -> Result<bool>;
  /// Prints a response.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

impl UserInteraction for Cli {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      trace!("Accepting default for prompt: {message}");
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).cyan()))
        .default(false)
        .interact()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Summary(summary) => print_summary(summary),
      ResponseContent::Venue(info) => print_venue(info),
      ResponseContent::Records(decision, records) => print_records(decision, records),
      ResponseContent::Papers(papers, detailed) => print_papers(papers, detailed),
      ResponseContent::Success(message) =>
        println!("{} {}", style(SUCCESS_PREFIX).green(), style(message).green()),
      ResponseContent::Info(message) => println!("{} {message}", style(INFO_PREFIX).blue()),
      ResponseContent::Warning(message) =>
        println!("{} {}", style(WARNING_PREFIX).yellow(), style(message).yellow()),
    }
    Ok(())
  }
}

/// Tree branch for the `index`-th of `len` items.
fn branch(index: usize, len: usize) -> &'static str {
  if index + 1 == len {
    LAST_ITEM_PREFIX
  } else {
    ITEM_PREFIX
  }
}

/// Renders a run summary as a tree of decision buckets.
fn print_summary(summary: &RunSummary) {
  let (prefix, headline) = if summary.cancelled {
    (style(WARNING_PREFIX).yellow(), "Download run interrupted")
  } else {
    (style(SUCCESS_PREFIX).green(), "Download run finished")
  };
  println!("{prefix} {headline} for {}", style(&summary.venue_id).cyan());

  let len = summary.decisions.len();
  for (i, (decision, counts)) in summary.decisions.iter().enumerate() {
    println!(
      "{} {:<10} requested {:>4}  downloaded {:>4}  skipped {:>4}  failed {:>4}",
      branch(i, len),
      style(decision).bold(),
      counts.requested,
      style(counts.downloaded).green(),
      counts.skipped,
      if counts.failed > 0 { style(counts.failed).red() } else { style(counts.failed) },
    );
  }
  if len == 0 {
    println!("{} nothing matched the requested decisions", LAST_ITEM_PREFIX);
  }

  println!(
    "{} {} listed, {} ignored, {} without a recognizable decision",
    style(INFO_PREFIX).blue(),
    summary.listed,
    summary.ignored,
    summary.unknown,
  );
  if summary.total_failed() > 0 {
    println!(
      "{} {} papers failed; run {} to see why",
      style(WARNING_PREFIX).yellow(),
      summary.total_failed(),
      style("ordl status").cyan(),
    );
  }
  if summary.cancelled {
    println!("{} Run the same command again to resume", style(INFO_PREFIX).blue());
  }
}

/// Renders per-decision counts of a venue.
fn print_venue(info: &VenueInfo) {
  println!(
    "{} {} has {} submissions",
    style(SUCCESS_PREFIX).green(),
    style(&info.venue_id).cyan(),
    info.listed
  );
  let len = info.counts.len();
  for (i, (decision, count)) in info.counts.iter().enumerate() {
    println!("{} {:<10} {:>5}", branch(i, len), style(decision).bold(), count);
  }
  println!(
    "{} {} match the configured decisions",
    style(INFO_PREFIX).blue(),
    style(info.selected).green()
  );
}

/// Renders ledger totals for one decision and lists the failures.
fn print_records(decision: Decision, records: &[DownloadRecord]) {
  let count = |status: DownloadStatus| records.iter().filter(|r| r.status == status).count();
  println!(
    "{} {:<10} downloaded {:>4}  failed {:>4}  pending {:>4}",
    style(WORKING_PREFIX).cyan(),
    style(decision).bold(),
    style(count(DownloadStatus::Downloaded)).green(),
    count(DownloadStatus::Failed),
    count(DownloadStatus::Pending),
  );

  let failed: Vec<_> = records.iter().filter(|r| r.status == DownloadStatus::Failed).collect();
  for (i, record) in failed.iter().enumerate() {
    println!(
      "{} {} {}",
      branch(i, failed.len()),
      style(&record.submission_id).yellow(),
      record.title
    );
    println!(
      "{}   {} after {} attempts",
      if i + 1 == failed.len() { "  " } else { CONTINUE_PREFIX },
      style(record.error.as_deref().unwrap_or("unknown error")).red(),
      record.attempts
    );
  }
}

/// Renders search hits, one tree per paper.
fn print_papers(papers: &[PaperRecord], detailed: bool) {
  println!("{} Found {} papers", style(SUCCESS_PREFIX).green(), papers.len());
  for paper in papers {
    let decision = paper.decision.map_or("-", |d| d.as_str());
    println!(
      "{} {} {}",
      style(WORKING_PREFIX).cyan(),
      style(&paper.title).bold(),
      style(format!("[{decision}]")).dim()
    );

    let authors = paper.authors.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ");
    let mut lines = vec![
      format!("{} {}", style("Venue:").dim(), paper.venue_id),
      format!("{} {}", style("Authors:").dim(), authors),
    ];
    if detailed {
      if !paper.keywords.is_empty() {
        lines.push(format!("{} {}", style("Keywords:").dim(), paper.keywords.join(", ")));
      }
      if !paper.abstract_text.is_empty() {
        lines.push(format!("{} {}", style("Abstract:").dim(), paper.abstract_text));
      }
    }
    if let Some(path) = &paper.path {
      lines.push(format!("{} {}", style("PDF:").dim(), path.display()));
    }

    for (i, line) in lines.iter().enumerate() {
      println!("{} {line}", branch(i, lines.len()));
    }
  }
}
