use std::fmt::Display;
use std::fmt::Formatter;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// A user facing message produced while compiling a stylesheet.
///
/// Usually but not always this is linked to a source file.
#[derive(Error, Debug, Deserialize, PartialEq, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
  /// A summary user-facing message
  pub message: String,

  /// Indicates where this diagnostic was emitted from, usually a transform name
  pub origin: Option<String>,

  /// The stylesheet the diagnostic relates to
  pub file: Option<PathBuf>,

  /// Hints for the user
  pub hints: Option<Vec<String>>,
}

impl Display for Diagnostic {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match &self.file {
      Some(file) => write!(f, "{}: {}", file.display(), self.message),
      None => f.write_str(&self.message),
    }
  }
}

impl Diagnostic {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      ..Self::default()
    }
  }

  pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
    self.origin = Some(origin.into());
    self
  }

  pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
    self.file = Some(file.into());
    self
  }
}

#[derive(Error, Default, Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
  pub fn push(&mut self, diagnostic: Diagnostic) {
    self.0.push(diagnostic);
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
    self.0.iter()
  }

  pub fn into_inner(self) -> Vec<Diagnostic> {
    self.0
  }
}

impl Display for Diagnostics {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for diagnostic in &self.0 {
      writeln!(f, "{}", diagnostic)?;
    }
    Ok(())
  }
}

impl From<Vec<Diagnostic>> for Diagnostics {
  fn from(diagnostics: Vec<Diagnostic>) -> Self {
    Diagnostics(diagnostics)
  }
}
