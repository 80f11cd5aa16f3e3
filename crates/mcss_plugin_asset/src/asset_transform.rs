use std::convert::Infallible;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Error;
use lightningcss::values::url::Url;
use lightningcss::visit_types;
use lightningcss::visitor::Visit;
use lightningcss::visitor::VisitTypes;
use lightningcss::visitor::Visitor;
use mcss_core::error::ConfigurationError;
use mcss_core::plugin::StylesheetTransform;
use mcss_core::plugin::TransformContext;
use mcss_core::resolver::is_external_reference;
use mcss_core::resolver::AssetResolverRef;
use mcss_core::stylesheet::Stylesheet;
use mcss_filesystem::normalize_path;
use path_slash::PathExt;

const TRANSFORM_NAME: &str = "mcss-asset";

#[derive(Clone, Debug)]
pub struct AssetTransformOptions {
  /// Directory assets are published to. Transforming fails while this is unset.
  pub public_dir: Option<PathBuf>,
  /// Root that resource paths handed to the asset resolver are relative to
  pub resource_basedir: PathBuf,
  pub asset_resolver: AssetResolverRef,
}

/// Replaces every local `url()` argument with the identifier the asset resolver returns for the
/// referenced resource
#[derive(Debug)]
pub struct AssetTransform {
  options: AssetTransformOptions,
}

impl AssetTransform {
  pub fn new(options: AssetTransformOptions) -> Self {
    Self { options }
  }

  fn to_resource(&self, path: &Path) -> String {
    let full_path = normalize_path(path);
    let resource = pathdiff::diff_paths(&full_path, &self.options.resource_basedir)
      .unwrap_or(full_path);

    resource.to_slash_lossy().to_string()
  }
}

impl StylesheetTransform for AssetTransform {
  fn name(&self) -> &str {
    TRANSFORM_NAME
  }

  fn transform(
    &self,
    stylesheet: &mut Stylesheet,
    _context: &mut TransformContext,
  ) -> Result<(), Error> {
    let has_public_dir = self
      .options
      .public_dir
      .as_ref()
      .is_some_and(|dir| !dir.as_os_str().is_empty());

    if !has_public_dir {
      return Err(
        ConfigurationError::MissingPublicDir {
          source_file: stylesheet.source_file.clone(),
        }
        .into(),
      );
    }

    stylesheet.edit_chunks(|file, stylesheet| {
      let Some(file) = file else {
        return Ok(());
      };

      stylesheet.visit(&mut UrlRewriter {
        transform: self,
        dir: file.parent().unwrap_or(Path::new("")),
      })?;

      Ok(())
    })
  }
}

struct UrlRewriter<'a> {
  transform: &'a AssetTransform,
  /// Directory of the file the urls were written in
  dir: &'a Path,
}

impl<'i> Visitor<'i> for UrlRewriter<'_> {
  type Error = Infallible;

  fn visit_types(&self) -> VisitTypes {
    visit_types!(URLS)
  }

  fn visit_url(&mut self, url: &mut Url<'i>) -> Result<(), Self::Error> {
    if url.url.is_empty() || is_external_reference(&url.url) {
      return Ok(());
    }

    let resource = self.transform.to_resource(&self.dir.join(&*url.url));
    let asset = self.transform.options.asset_resolver.from_resource(&resource);

    tracing::trace!(from = %url.url, to = %asset, "Rewrite asset reference");
    url.url = asset.into();

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use mcss_core::resolver::MockAssetResolver;
  use mcss_core::resolver::PublicUrlAssetResolver;
  use mcss_core::stylesheet::StyleChunk;
  use pretty_assertions::assert_eq;

  use super::*;

  const SOURCE_FILE: &str = "/project/src/components/a.mcss";

  fn options() -> AssetTransformOptions {
    AssetTransformOptions {
      public_dir: Some(PathBuf::from("/project/public")),
      resource_basedir: PathBuf::from("/project"),
      asset_resolver: Arc::new(PublicUrlAssetResolver::new("/static")),
    }
  }

  fn run(options: AssetTransformOptions, code: &str) -> String {
    let mut stylesheet = Stylesheet::parse(SOURCE_FILE, code).unwrap();
    AssetTransform::new(options)
      .transform(&mut stylesheet, &mut TransformContext::default())
      .unwrap();
    stylesheet.to_css(true).unwrap()
  }

  fn unused_resolver() -> AssetTransformOptions {
    let mut asset_resolver = MockAssetResolver::new();
    asset_resolver.expect_from_resource().never();

    AssetTransformOptions {
      asset_resolver: Arc::new(asset_resolver),
      ..options()
    }
  }

  #[test]
  fn rewrites_relative_urls_into_public_urls() {
    let css = run(
      options(),
      ".a { background: url(../../assets/img/logo.png) no-repeat; }
      .b { background: url(\"./icons/x.svg\"); }
      .c { background: url( 'img.png' ); }",
    );

    assert!(css.contains("/static/assets/img/logo.png"));
    assert!(css.contains("/static/src/components/icons/x.svg"));
    assert!(css.contains("/static/src/components/img.png"));
  }

  #[test]
  fn leaves_external_references_untouched() {
    let css = run(
      unused_resolver(),
      ".a { background: url(/abs/x.png); }
      .b { background: url(data:image/png;base64,iVBORw0KGgo=); }
      .c { background: url(#frag); }
      .d { background: url(http://host/x.png); }
      .e { background: url('HTTPS://host/x.png'); }",
    );

    for reference in [
      "/abs/x.png",
      "data:image/png;base64,iVBORw0KGgo=",
      "#frag",
      "http://host/x.png",
      "HTTPS://host/x.png",
    ] {
      assert!(css.contains(reference), "{reference} missing from {css}");
    }
  }

  #[test]
  fn ignores_values_without_urls() {
    let css = run(
      unused_resolver(),
      ".a { content: \"./not-a-url.png\"; color: red; }",
    );

    assert!(css.contains("./not-a-url.png"));
  }

  #[test]
  fn passes_project_relative_resources_to_the_resolver() {
    let mut asset_resolver = MockAssetResolver::new();
    asset_resolver
      .expect_from_resource()
      .withf(|resource| resource == "src/img/logo.png")
      .times(1)
      .returning(|_| String::from("logo.3f2a.png"));

    let css = run(
      AssetTransformOptions {
        asset_resolver: Arc::new(asset_resolver),
        ..options()
      },
      ".a { background: url(../img/logo.png); }",
    );

    assert!(css.contains("logo.3f2a.png"));
    assert!(!css.contains("../img"));
  }

  #[test]
  fn fails_without_a_public_dir() {
    for public_dir in [None, Some(PathBuf::new())] {
      let chunk = StyleChunk::parse(
        Some(PathBuf::from(SOURCE_FILE)),
        ".a { background: url(./x.png); }",
      )
      .unwrap();
      let mut stylesheet = Stylesheet::new(SOURCE_FILE, vec![chunk.clone()]);

      let error = AssetTransform::new(AssetTransformOptions {
        public_dir,
        ..unused_resolver()
      })
      .transform(&mut stylesheet, &mut TransformContext::default())
      .unwrap_err();

      assert_eq!(
        error.downcast_ref::<ConfigurationError>(),
        Some(&ConfigurationError::MissingPublicDir {
          source_file: PathBuf::from(SOURCE_FILE)
        })
      );
      assert_eq!(stylesheet.chunks, vec![chunk]);
    }
  }
}
