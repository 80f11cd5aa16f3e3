//! Eviction of a changed file together with every file compiled from it.
//!
//! Dependents are found through two channels: the module store's structural `composes` edges and
//! the `@import` parents recorded in [`ImportDependencies`]. Each file is visited once, so cyclic
//! graphs terminate without consuming depth.

use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexSet;
use mcss_core::bundler::Bundler;
use mcss_core::bundler::BundlerError;
use thiserror::Error;

use crate::import_dependencies::ImportDependencies;

/// Longest chain of distinct dependents followed from the invalidated file
pub const MAX_TRAVERSAL_DEPTH: usize = 1000;

/// Files to evict, in discovery order. The first entry is the invalidated file.
pub type DependentsTree = IndexSet<PathBuf>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraversalError {
  #[error(
    "Dependents of {} are more than {} levels deep",
    .path.display(),
    MAX_TRAVERSAL_DEPTH
  )]
  DepthExceeded { path: PathBuf },

  #[error(transparent)]
  Bundler(#[from] BundlerError),
}

/// Add `path` and everything that depends on it to `tree`.
///
/// A failing branch is logged and skipped so its siblings are still visited. The returned error
/// only concerns `path` itself: either the depth bound was hit, or the module store does not track
/// `path`, in which case its import parents have still been visited.
pub fn find_dependents_tree(
  bundler: &dyn Bundler,
  import_dependencies: &ImportDependencies,
  path: &Path,
  tree: &mut DependentsTree,
  level: usize,
) -> Result<(), TraversalError> {
  if level > MAX_TRAVERSAL_DEPTH {
    return Err(TraversalError::DepthExceeded {
      path: path.to_path_buf(),
    });
  }

  if !tree.insert(path.to_path_buf()) {
    return Ok(());
  }

  let dependents = bundler.dependents(path);

  for dependent in dependents.as_deref().unwrap_or_default() {
    visit_branch(bundler, import_dependencies, dependent, tree, level + 1);
  }

  for parent in import_dependencies.parents(path) {
    visit_branch(bundler, import_dependencies, &parent, tree, level + 1);
  }

  dependents.map(|_| ()).map_err(TraversalError::from)
}

fn visit_branch(
  bundler: &dyn Bundler,
  import_dependencies: &ImportDependencies,
  path: &Path,
  tree: &mut DependentsTree,
  level: usize,
) {
  if let Err(error) = find_dependents_tree(bundler, import_dependencies, path, tree, level) {
    tracing::warn!(path = %path.display(), %error, "Skipping dependents branch");
  }
}

/// Evict `path` and all of its dependents from the module store and from the import
/// dependencies, returning the evicted files
pub fn remove_file_graph_tree(
  bundler: &mut dyn Bundler,
  import_dependencies: &mut ImportDependencies,
  path: &Path,
) -> DependentsTree {
  let mut tree = DependentsTree::new();

  if let Err(error) = find_dependents_tree(&*bundler, import_dependencies, path, &mut tree, 0) {
    // The file may never have compiled successfully
    tracing::debug!(path = %path.display(), %error, "Invalidated file has no structural dependents");
  }

  for node in &tree {
    if let Err(error) = bundler.remove(node) {
      tracing::debug!(%error, "Nothing to evict");
    }
    import_dependencies.forget(node);
  }

  tracing::debug!(path = %path.display(), evicted = tree.len(), "Removed file graph tree");

  tree
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;
  use std::sync::Arc;

  use mcss_core::plugin::StagedTransforms;
  use mcss_core::resolver::NamespacePathResolver;
  use mcss_filesystem::in_memory_file_system::InMemoryFileSystem;
  use mcss_module_store::ModuleStore;
  use mcss_module_store::ModuleStoreOptions;
  use pretty_assertions::assert_eq;

  use super::*;

  fn module_store(files: &[(&str, &str)]) -> ModuleStore {
    let fs = InMemoryFileSystem::default();
    for (path, contents) in files {
      fs.write_file(Path::new(path), contents.to_string());
    }

    ModuleStore::new(
      Arc::new(fs),
      Arc::new(NamespacePathResolver::new(BTreeMap::new())),
      ModuleStoreOptions {
        root: PathBuf::from("/"),
        transforms: StagedTransforms::new(),
        ..ModuleStoreOptions::default()
      },
    )
  }

  fn paths(tree: &DependentsTree) -> Vec<&str> {
    tree.iter().filter_map(|path| path.to_str()).collect()
  }

  #[tokio::test]
  async fn follows_structural_dependents() {
    let mut store = module_store(&[
      ("/a.mcss", ".a { composes: b from \"./b\"; }"),
      ("/b.mcss", ".b { composes: c from \"./c\"; }"),
      ("/c.mcss", ".c { top: 0; }"),
    ]);
    store.file(Path::new("/a.mcss")).await.unwrap();

    let mut tree = DependentsTree::new();
    find_dependents_tree(
      &store,
      &ImportDependencies::new(),
      Path::new("/c.mcss"),
      &mut tree,
      0,
    )
    .unwrap();

    assert_eq!(paths(&tree), vec!["/c.mcss", "/b.mcss", "/a.mcss"]);
  }

  #[test]
  fn follows_import_parents_of_untracked_files() {
    let store = module_store(&[]);
    let mut import_dependencies = ImportDependencies::new();
    import_dependencies.record_edge(Path::new("/c.mcss"), Path::new("/b.mcss"));
    import_dependencies.record_edge(Path::new("/b.mcss"), Path::new("/a.mcss"));

    let mut tree = DependentsTree::new();
    let result = find_dependents_tree(
      &store,
      &import_dependencies,
      Path::new("/c.mcss"),
      &mut tree,
      0,
    );

    assert_eq!(
      result,
      Err(TraversalError::Bundler(BundlerError::NotTracked(
        PathBuf::from("/c.mcss")
      )))
    );
    assert_eq!(paths(&tree), vec!["/c.mcss", "/b.mcss", "/a.mcss"]);
  }

  #[tokio::test]
  async fn visits_each_file_of_a_cycle_once() {
    let mut store = module_store(&[
      ("/a.mcss", ".a { composes: b from \"./b\"; }"),
      ("/b.mcss", ".b { composes: a from \"./a\"; }"),
    ]);
    store.file(Path::new("/a.mcss")).await.unwrap();

    let mut import_dependencies = ImportDependencies::new();
    import_dependencies.record_edge(Path::new("/a.mcss"), Path::new("/b.mcss"));

    let mut tree = DependentsTree::new();
    find_dependents_tree(&store, &import_dependencies, Path::new("/a.mcss"), &mut tree, 0).unwrap();

    assert_eq!(paths(&tree), vec!["/a.mcss", "/b.mcss"]);
  }

  #[test]
  fn stops_after_the_depth_bound() {
    let store = module_store(&[]);
    let mut import_dependencies = ImportDependencies::new();
    for index in 0..MAX_TRAVERSAL_DEPTH + 10 {
      import_dependencies.record_edge(
        &PathBuf::from(format!("/{index}.mcss")),
        &PathBuf::from(format!("/{}.mcss", index + 1)),
      );
    }

    let mut tree = DependentsTree::new();
    let _ = find_dependents_tree(&store, &import_dependencies, Path::new("/0.mcss"), &mut tree, 0);

    assert_eq!(tree.len(), MAX_TRAVERSAL_DEPTH + 1);
    assert_eq!(
      tree.last(),
      Some(&PathBuf::from(format!("/{MAX_TRAVERSAL_DEPTH}.mcss")))
    );
  }

  #[tokio::test]
  async fn removes_the_whole_tree() {
    let mut store = module_store(&[
      ("/a.mcss", ".a { composes: b from \"./b\"; }"),
      ("/b.mcss", ".b { top: 0; }"),
      ("/d.mcss", ".d { top: 0; }"),
    ]);
    store.file(Path::new("/a.mcss")).await.unwrap();
    store.file(Path::new("/d.mcss")).await.unwrap();

    let mut import_dependencies = ImportDependencies::new();
    import_dependencies.record_edge(Path::new("/b.mcss"), Path::new("/x.mcss"));
    import_dependencies.record_edge(Path::new("/d.mcss"), Path::new("/y.mcss"));

    let tree = remove_file_graph_tree(&mut store, &mut import_dependencies, Path::new("/b.mcss"));

    assert_eq!(paths(&tree), vec!["/b.mcss", "/a.mcss", "/x.mcss"]);
    assert!(!store.is_tracked(Path::new("/a.mcss")));
    assert!(!store.is_tracked(Path::new("/b.mcss")));
    assert!(store.is_tracked(Path::new("/d.mcss")));
    assert!(!import_dependencies.contains(Path::new("/b.mcss")));
    assert!(import_dependencies.contains(Path::new("/d.mcss")));
  }

  #[tokio::test]
  async fn keeps_the_files_an_evicted_file_depends_on() {
    let mut store = module_store(&[
      ("/a.mcss", ".a { composes: b from \"./b\"; }"),
      ("/b.mcss", ".b { composes: c from \"./c\"; }"),
      ("/c.mcss", ".c { top: 0; }"),
    ]);
    store.file(Path::new("/a.mcss")).await.unwrap();

    let tree = remove_file_graph_tree(
      &mut store,
      &mut ImportDependencies::new(),
      Path::new("/b.mcss"),
    );

    assert_eq!(paths(&tree), vec!["/b.mcss", "/a.mcss"]);
    assert!(!store.is_tracked(Path::new("/a.mcss")));
    assert!(!store.is_tracked(Path::new("/b.mcss")));
    assert!(store.is_tracked(Path::new("/c.mcss")));
    assert_eq!(store.dependents(Path::new("/c.mcss")), Ok(Vec::new()));
  }

  #[test]
  fn removing_an_untracked_file_is_not_an_error() {
    let mut store = module_store(&[]);
    let mut import_dependencies = ImportDependencies::new();

    let tree = remove_file_graph_tree(&mut store, &mut import_dependencies, Path::new("/a.mcss"));

    assert_eq!(paths(&tree), vec!["/a.mcss"]);
  }
}
