use std::convert::Infallible;
use std::path::Path;

use anyhow::Error;
use lightningcss::properties::custom::Token;
use lightningcss::properties::custom::TokenOrValue;
use lightningcss::values::url::Url;
use lightningcss::visit_types;
use lightningcss::visitor::Visit;
use lightningcss::visitor::VisitTypes;
use lightningcss::visitor::Visitor;
use mcss_core::plugin::StylesheetTransform;
use mcss_core::plugin::TransformContext;
use mcss_core::resolver::is_external_reference;
use mcss_core::resolver::is_namespaced_reference;
use mcss_core::resolver::PathResolver;
use mcss_core::resolver::PathResolverRef;
use mcss_core::resolver::ResolveOptions;
use mcss_core::stylesheet::Stylesheet;

const TRANSFORM_NAME: &str = "mcss-path-resolver";

/// Rewrites namespaced (`img::logo.png`) and relative (`./a.png`) references found in string
/// literals and `url()` arguments into paths relative to the declaring file.
///
/// ```text
/// background: url(img::logo.png)  ->  background: url(../assets/img/logo.png)
/// ```
#[derive(Debug)]
pub struct PathResolverTransform {
  path_resolver: PathResolverRef,
}

impl PathResolverTransform {
  pub fn new(path_resolver: PathResolverRef) -> Self {
    Self { path_resolver }
  }
}

impl StylesheetTransform for PathResolverTransform {
  fn name(&self) -> &str {
    TRANSFORM_NAME
  }

  fn transform(
    &self,
    stylesheet: &mut Stylesheet,
    _context: &mut TransformContext,
  ) -> Result<(), Error> {
    stylesheet.edit_chunks(|file, stylesheet| {
      let Some(file) = file else {
        return Ok(());
      };

      stylesheet.visit(&mut ReferenceRewriter {
        path_resolver: &*self.path_resolver,
        file,
      })?;

      Ok(())
    })
  }
}

struct ReferenceRewriter<'a> {
  path_resolver: &'a dyn PathResolver,
  file: &'a Path,
}

impl ReferenceRewriter<'_> {
  fn resolve_path(&self, reference: &str) -> Option<String> {
    if is_external_reference(reference) {
      return None;
    }

    // Replace only namespaced and relative paths
    if !is_namespaced_reference(reference) && !reference.starts_with('.') {
      return None;
    }

    let path = self.path_resolver.relative(
      reference,
      self.file,
      &ResolveOptions {
        extension: None,
        is_from_dir: false,
        prepend_dot: true,
      },
    )?;

    tracing::trace!(from = %reference, to = %path, "Rewrite path reference");
    Some(path)
  }
}

impl<'i> Visitor<'i> for ReferenceRewriter<'_> {
  type Error = Infallible;

  fn visit_types(&self) -> VisitTypes {
    visit_types!(URLS | TOKENS)
  }

  fn visit_url(&mut self, url: &mut Url<'i>) -> Result<(), Self::Error> {
    if let Some(path) = self.resolve_path(&url.url) {
      url.url = path.into();
    }

    Ok(())
  }

  fn visit_token(&mut self, token: &mut TokenOrValue<'i>) -> Result<(), Self::Error> {
    match token {
      TokenOrValue::Token(Token::String(value)) => {
        if let Some(path) = self.resolve_path(value) {
          *value = path.into();
        }

        Ok(())
      }
      _ => token.visit_children(self),
    }
  }
}
