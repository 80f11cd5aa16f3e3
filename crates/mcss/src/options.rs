use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use mcss_core::error::ConfigurationError;
use mcss_core::types::BuildMode;
use mcss_filesystem::FileSystem;
use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_EXTENSION: &str = ".mcss";

/// Where the output maps are persisted as JSON. Maps without a path are kept in memory only.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPaths {
  pub resources_to_assets_json: Option<PathBuf>,
  pub hashed_assets_json: Option<PathBuf>,
  pub selectors_json: Option<PathBuf>,
}

impl MapPaths {
  /// Conventional file names for every map inside `dir`
  pub fn in_dir(dir: &Path) -> Self {
    Self {
      resources_to_assets_json: Some(dir.join("resources-to-assets.json")),
      hashed_assets_json: Some(dir.join("hashed-assets.json")),
      selectors_json: Some(dir.join("selectors.json")),
    }
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessorOptions {
  /// Directory the hashed bundle is written to
  pub dest_dir: Option<PathBuf>,

  /// Project root; source paths are relative to it. Defaults to the current directory.
  pub basedir: Option<PathBuf>,

  pub env: BuildMode,

  /// Extensions, with the leading dot, of the files the processor handles
  pub extensions: Vec<String>,

  pub map_paths: MapPaths,

  /// Namespace to directory, for references such as `img::logo.png`
  pub namespaces: BTreeMap<String, PathBuf>,

  /// Prefix for asset URLs written into the bundle
  pub public_url: String,
}

impl Default for ProcessorOptions {
  fn default() -> Self {
    Self {
      dest_dir: None,
      basedir: None,
      env: BuildMode::default(),
      extensions: vec![String::from(DEFAULT_EXTENSION)],
      map_paths: MapPaths::default(),
      namespaces: BTreeMap::new(),
      public_url: String::from("/"),
    }
  }
}

impl ProcessorOptions {
  /// Load options from a JSON file. Missing fields take their default value.
  pub fn from_file(fs: &dyn FileSystem, path: &Path) -> Result<Self, ConfigurationError> {
    let invalid = |message: String| ConfigurationError::InvalidConfigFile {
      path: path.to_path_buf(),
      message,
    };

    let contents = fs
      .read_to_string(path)
      .map_err(|error| invalid(error.to_string()))?;

    serde_json::from_str(&contents).map_err(|error| invalid(error.to_string()))
  }

  pub fn has_extension(&self, path: &Path) -> bool {
    let Some(extension) = path.extension().and_then(|extension| extension.to_str()) else {
      return false;
    };

    self
      .extensions
      .iter()
      .any(|expected| expected.trim_start_matches('.') == extension)
  }
}
