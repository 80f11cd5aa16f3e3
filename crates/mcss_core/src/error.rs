use std::path::PathBuf;

use thiserror::Error;

/// Fatal misconfiguration, surfaced before any partial work happens
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
  #[error("Public directory not set (while processing {})", .source_file.display())]
  MissingPublicDir { source_file: PathBuf },

  #[error("Output directory not set")]
  MissingDestDir,

  #[error("Failed to load configuration from {}: {message}", .path.display())]
  InvalidConfigFile { path: PathBuf, message: String },
}

/// A referenced stylesheet could not be located on disk
#[derive(Debug, Error, PartialEq)]
#[error(
  "File cannot be found\n\nFrom: {}\nFile: {file}\nResolved to: {}",
  .from.display(),
  .resolved.display()
)]
pub struct ResolutionError {
  /// The stylesheet containing the reference
  pub from: PathBuf,
  /// The reference as written in the source
  pub file: String,
  /// The absolute path the reference resolved to
  pub resolved: PathBuf,
}
