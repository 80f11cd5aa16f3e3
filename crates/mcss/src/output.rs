//! Content-addressed bundle output and the maps describing it.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use mcss_core::bundler::BundleOutput;
use mcss_core::bundler::Composition;
use mcss_core::bundler::DEFAULT_BUNDLE_NAME;
use mcss_core::hash::content_digest;
use mcss_core::project_path::to_resource_key;
use mcss_filesystem::FileSystem;
use serde::Serialize;

/// Source path to the bundle it was compiled into
pub type ResourceToAssetMap = BTreeMap<String, String>;

/// Bundle name to its content-hashed file name
pub type HashedAssetsMap = BTreeMap<String, String>;

/// Source path to its composition
pub type SelectorsMap = BTreeMap<String, Composition>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputMaps {
  pub resources_to_assets: ResourceToAssetMap,
  pub hashed_assets: HashedAssetsMap,
  pub selectors: SelectorsMap,
}

impl OutputMaps {
  /// Drop the entries of a source file that is no longer part of the bundle
  pub fn remove_source(&mut self, key: &str) {
    self.resources_to_assets.remove(key);
    self.selectors.remove(key);
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSummary {
  /// File name of the written bundle, such as `b4fd9e9e6a6a.css`
  pub hashed_name: String,
  pub path: PathBuf,
  pub size: usize,
}

pub fn hashed_bundle_name(css: &str) -> String {
  format!("{}.css", content_digest(css))
}

/// Write `bundle` to `<dest_dir>/<digest>.css` and record it in `maps`.
///
/// An empty bundle writes nothing and leaves `maps` untouched.
pub fn write_bundle(
  fs: &dyn FileSystem,
  dest_dir: &Path,
  bundle: BundleOutput,
  maps: &mut OutputMaps,
) -> anyhow::Result<Option<OutputSummary>> {
  if bundle.css.is_empty() {
    tracing::debug!("Bundle is empty, nothing to write");
    return Ok(None);
  }

  let hashed_name = hashed_bundle_name(&bundle.css);
  let path = dest_dir.join(&hashed_name);

  fs.write(&path, bundle.css.as_bytes())
    .with_context(|| format!("Failed to write bundle {}", path.display()))?;

  maps
    .hashed_assets
    .insert(String::from(DEFAULT_BUNDLE_NAME), hashed_name.clone());

  for (relative_path, composition) in bundle.compositions {
    let key = to_resource_key(Path::new(&relative_path));
    maps
      .resources_to_assets
      .insert(key.clone(), String::from(DEFAULT_BUNDLE_NAME));
    maps.selectors.insert(key, composition);
  }

  tracing::info!(bundle = %path.display(), size = bundle.css.len(), "Wrote bundle");

  Ok(Some(OutputSummary {
    hashed_name,
    path,
    size: bundle.css.len(),
  }))
}

/// Persist `value` as JSON at `path`, when a path is configured
pub fn write_json<T: Serialize>(
  fs: &dyn FileSystem,
  path: Option<&Path>,
  value: &T,
) -> anyhow::Result<()> {
  let Some(path) = path else {
    return Ok(());
  };

  let json = serde_json::to_string_pretty(value)?;
  fs.write(path, json.as_bytes())
    .with_context(|| format!("Failed to write {}", path.display()))?;

  tracing::debug!(path = %path.display(), "Wrote map");
  Ok(())
}
