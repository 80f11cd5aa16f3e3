use std::fmt::Display;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

/// A stylesheet source file, identified by its path relative to the project root
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SourceFile {
  pub path: PathBuf,
}

impl SourceFile {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

/// Environment mode of a build session
///
/// Development prints unminified CSS with readable selector names, every other mode produces
/// optimized output.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub enum BuildMode {
  Development,
  #[default]
  Production,
  Other(String),
}

impl BuildMode {
  pub fn is_development(&self) -> bool {
    matches!(self, BuildMode::Development)
  }
}

impl Display for BuildMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      BuildMode::Development => write!(f, "development"),
      BuildMode::Production => write!(f, "production"),
      BuildMode::Other(mode) => write!(f, "{}", mode.to_lowercase()),
    }
  }
}

impl From<&str> for BuildMode {
  fn from(mode: &str) -> Self {
    match mode {
      "development" => BuildMode::Development,
      "production" => BuildMode::Production,
      other => BuildMode::Other(other.to_string()),
    }
  }
}

impl Serialize for BuildMode {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for BuildMode {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;

    Ok(BuildMode::from(s.as_str()))
  }
}
