use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Local selector name to the global selector names it expands to
pub type Composition = BTreeMap<String, Vec<String>>;

/// Name of the single bundle every tracked stylesheet is assembled into
pub const DEFAULT_BUNDLE_NAME: &str = "styles.css";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BundlerError {
  #[error("File is not tracked: {}", .0.display())]
  NotTracked(PathBuf),
}

#[derive(Clone, Debug)]
pub struct OutputOptions {
  /// Where the bundle will be written
  pub to: PathBuf,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BundleOutput {
  pub css: String,
  /// Composition of every tracked file, keyed by project-relative path
  pub compositions: BTreeMap<String, Composition>,
}

pub type BundlerRef = Box<dyn Bundler>;

/// The host that compiles tracked stylesheets and owns the structural module graph
#[async_trait]
pub trait Bundler: Send + Sync {
  /// Track and compile the file at `path`, along with every file it structurally imports.
  ///
  /// Tracking a file that is already tracked is a no-op; it must be removed first to be
  /// recompiled.
  async fn file(&mut self, path: &Path) -> Result<(), anyhow::Error>;

  /// Evict a file from the module store
  fn remove(&mut self, path: &Path) -> Result<(), BundlerError>;

  /// Files that structurally import `path`
  fn dependents(&self, path: &Path) -> Result<Vec<PathBuf>, BundlerError>;

  fn is_tracked(&self, path: &Path) -> bool;

  /// Assemble every tracked file into a single bundle
  async fn output(&mut self, options: &OutputOptions) -> Result<BundleOutput, anyhow::Error>;
}
