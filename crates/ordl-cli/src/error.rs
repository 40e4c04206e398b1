//! Error types for the `ordl` command line interface.

use ordl::error::OrdlError;
use thiserror::Error;

/// Result alias used by every command.
pub type Result<T> = core::result::Result<T, OrdlCliError>;

/// Errors that end a command.
#[derive(Error, Debug)]
pub enum OrdlCliError {
  /// A library operation failed.
  #[error(transparent)]
  Ordl(#[from] OrdlError),

  /// Reading or writing a local file failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// An interactive prompt could not be shown or answered.
  #[error(transparent)]
  Dialog(#[from] dialoguer::Error),
}
