//! Resolution of logical stylesheet references into physical paths and asset identifiers.
//!
//! References take two shapes: relative paths (`./img/logo.png`, `../base`) and namespaced
//! references (`img::logo.png`), where the namespace maps to a directory.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use mcss_filesystem::normalize_path;
use once_cell::sync::Lazy;
use path_slash::PathExt;
use regex::Regex;

pub type PathResolverRef = Arc<dyn PathResolver>;
pub type AssetResolverRef = Arc<dyn AssetResolver>;

/// Separator between a namespace and the path inside it
pub const NAMESPACE_SEPARATOR: &str = "::";

static SCHEME_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z]+://").unwrap());

/// Whether `reference` must be passed through untouched: absolute paths, `data:` URIs, fragments
/// and anything with a URL scheme
pub fn is_external_reference(reference: &str) -> bool {
  reference.starts_with('/')
    || reference.starts_with("data:")
    || reference.starts_with('#')
    || SCHEME_URL.is_match(reference)
}

pub fn is_namespaced_reference(reference: &str) -> bool {
  reference.contains(NAMESPACE_SEPARATOR)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolveOptions {
  /// Extension, without the dot, appended when the reference has none
  pub extension: Option<String>,
  /// Treat `from` as a directory rather than as the file containing the reference
  pub is_from_dir: bool,
  /// Prefix relative results with `./` when they do not already start with a dot
  pub prepend_dot: bool,
}

impl ResolveOptions {
  pub fn stylesheet(is_from_dir: bool) -> Self {
    Self {
      extension: Some(String::from("mcss")),
      is_from_dir,
      prepend_dot: false,
    }
  }
}

/// Turns references written in a stylesheet into paths
#[mockall::automock]
pub trait PathResolver: Debug + Send + Sync {
  /// Absolute path of `reference` as seen from `from`, or `None` when it is not resolvable
  fn absolute(&self, reference: &str, from: &Path, options: &ResolveOptions) -> Option<PathBuf>;

  /// Path of `reference` relative to the directory of `from`, or `None` when it should be left as is
  fn relative(&self, reference: &str, from: &Path, options: &ResolveOptions) -> Option<String>;
}

/// Turns a project resource path into the identifier written into the bundle
#[mockall::automock]
pub trait AssetResolver: Debug + Send + Sync {
  fn from_resource(&self, resource: &str) -> String;
}

/// Resolves relative references against the referencing file and namespaced references against a
/// configured directory per namespace
#[derive(Clone, Debug, Default)]
pub struct NamespacePathResolver {
  namespaces: BTreeMap<String, PathBuf>,
}

impl NamespacePathResolver {
  pub fn new(namespaces: BTreeMap<String, PathBuf>) -> Self {
    Self { namespaces }
  }

  fn base_dir<'p>(from: &'p Path, options: &ResolveOptions) -> Option<&'p Path> {
    if options.is_from_dir {
      Some(from)
    } else {
      from.parent()
    }
  }
}

impl PathResolver for NamespacePathResolver {
  fn absolute(&self, reference: &str, from: &Path, options: &ResolveOptions) -> Option<PathBuf> {
    if reference.is_empty() || is_external_reference(reference) {
      return None;
    }

    let target = match reference.split_once(NAMESPACE_SEPARATOR) {
      Some((namespace, path)) => {
        let Some(namespace_dir) = self.namespaces.get(namespace) else {
          tracing::debug!(namespace, reference, "Unknown namespace");
          return None;
        };
        namespace_dir.join(path)
      }
      None => Self::base_dir(from, options)?.join(reference),
    };

    let mut target = normalize_path(&target);
    if let Some(extension) = &options.extension {
      if target.extension().is_none() {
        target.set_extension(extension);
      }
    }

    Some(target)
  }

  fn relative(&self, reference: &str, from: &Path, options: &ResolveOptions) -> Option<String> {
    let target = self.absolute(reference, from, options)?;
    let base_dir = Self::base_dir(from, options)?;
    let relative = pathdiff::diff_paths(&target, base_dir)?;

    let relative = relative.to_slash_lossy().to_string();
    if options.prepend_dot && !relative.starts_with('.') {
      return Some(format!("./{relative}"));
    }

    Some(relative)
  }
}

/// Serves every resource from below a public URL prefix
#[derive(Clone, Debug, Default)]
pub struct PublicUrlAssetResolver {
  public_url: String,
}

impl PublicUrlAssetResolver {
  pub fn new(public_url: impl Into<String>) -> Self {
    Self {
      public_url: public_url.into(),
    }
  }
}

impl AssetResolver for PublicUrlAssetResolver {
  fn from_resource(&self, resource: &str) -> String {
    let resource = Path::new(resource).to_slash_lossy().to_string();
    let prefix = self.public_url.trim_end_matches('/');

    format!("{prefix}/{}", resource.trim_start_matches('/'))
  }
}
