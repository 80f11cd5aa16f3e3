//! Parents of files pulled in through `@import`.
//!
//! Inlined imports are invisible to the module store, so the only record that `b.mcss` was
//! compiled into `a.mcss` is the `Dependency` message emitted while inlining it. Those messages
//! are collected here and consulted when `b.mcss` is invalidated.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;

pub type ImportDependenciesRef = Arc<RwLock<ImportDependencies>>;

/// Absolute dependency path to the ordered set of absolute paths that imported it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportDependencies {
  parents: BTreeMap<PathBuf, IndexSet<PathBuf>>,
}

impl ImportDependencies {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record that `parent` imported `dependency`, returning false when already known
  pub fn record_edge(&mut self, dependency: &Path, parent: &Path) -> bool {
    self
      .parents
      .entry(dependency.to_path_buf())
      .or_default()
      .insert(parent.to_path_buf())
  }

  /// Drop every parent recorded for `path`
  pub fn forget(&mut self, path: &Path) -> bool {
    self.parents.remove(path).is_some()
  }

  pub fn parents(&self, path: &Path) -> Vec<PathBuf> {
    self
      .parents
      .get(path)
      .map(|parents| parents.iter().cloned().collect())
      .unwrap_or_default()
  }

  pub fn contains(&self, path: &Path) -> bool {
    self.parents.contains_key(path)
  }

  pub fn is_empty(&self) -> bool {
    self.parents.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn records_parents_once_in_insertion_order() {
    let mut import_dependencies = ImportDependencies::new();

    assert!(import_dependencies.record_edge(Path::new("/b.mcss"), Path::new("/c.mcss")));
    assert!(import_dependencies.record_edge(Path::new("/b.mcss"), Path::new("/a.mcss")));
    assert!(!import_dependencies.record_edge(Path::new("/b.mcss"), Path::new("/c.mcss")));

    assert_eq!(
      import_dependencies.parents(Path::new("/b.mcss")),
      vec![PathBuf::from("/c.mcss"), PathBuf::from("/a.mcss")]
    );
  }

  #[test]
  fn forgets_a_dependency() {
    let mut import_dependencies = ImportDependencies::new();
    import_dependencies.record_edge(Path::new("/b.mcss"), Path::new("/a.mcss"));

    assert!(import_dependencies.forget(Path::new("/b.mcss")));
    assert!(!import_dependencies.forget(Path::new("/b.mcss")));
    assert!(import_dependencies.parents(Path::new("/b.mcss")).is_empty());
    assert!(import_dependencies.is_empty());
  }
}
