use std::path::PathBuf;

use mcss_core::types::SourceFile;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEventKind {
  /// The file was present when the session started
  Init,
  Add,
  Change,
  Unlink,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEvent {
  pub kind: FileEventKind,
  pub file: SourceFile,
}

impl FileEvent {
  pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
    Self {
      kind,
      file: SourceFile::new(path),
    }
  }
}

pub type FileEvents = Vec<FileEvent>;
