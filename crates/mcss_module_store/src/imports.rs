use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use lightningcss::rules::CssRule;
use mcss_core::error::ResolutionError;
use mcss_core::plugin::TransformContext;
use mcss_core::plugin::TransformMessage;
use mcss_core::resolver::is_external_reference;
use mcss_core::resolver::PathResolver;
use mcss_core::resolver::ResolveOptions;
use mcss_core::stylesheet::StyleChunk;
use mcss_core::stylesheet::Stylesheet;
use mcss_filesystem::normalize_path;
use mcss_filesystem::FileSystem;

/// Replaces `@import "<ref>";` statements with the contents of the referenced stylesheet.
///
/// Imported files become chunks placed before the chunk that imported them. Each inlined file
/// produces a [`TransformMessage::Dependency`] naming the file that imported it. A file is inlined
/// at most once per stylesheet, which also breaks import cycles.
pub struct ImportInliner<'a> {
  pub fs: &'a dyn FileSystem,
  pub path_resolver: &'a dyn PathResolver,
}

impl ImportInliner<'_> {
  pub fn inline(
    &self,
    stylesheet: &mut Stylesheet,
    context: &mut TransformContext,
  ) -> anyhow::Result<()> {
    let mut inlined = HashSet::from([stylesheet.source_file.clone()]);
    let mut chunks = Vec::with_capacity(stylesheet.chunks.len());

    for chunk in std::mem::take(&mut stylesheet.chunks) {
      chunks.extend(self.inline_chunk(chunk, &mut inlined, context)?);
    }

    stylesheet.chunks = chunks;
    Ok(())
  }

  fn inline_chunk(
    &self,
    mut chunk: StyleChunk,
    inlined: &mut HashSet<PathBuf>,
    context: &mut TransformContext,
  ) -> anyhow::Result<Vec<StyleChunk>> {
    let Some(file) = chunk.file().map(Path::to_path_buf) else {
      return Ok(vec![chunk]);
    };

    let mut references = Vec::new();
    chunk.edit(|stylesheet| {
      stylesheet.rules.0.retain(|rule| match import_reference(rule) {
        Some(reference) if !is_external_reference(&reference) => {
          references.push(reference);
          false
        }
        _ => true,
      });
      Ok(())
    })?;

    let mut output = Vec::new();
    for reference in references {
      let resolved = self.resolve(&reference, &file)?;
      if !inlined.insert(resolved.clone()) {
        tracing::debug!(file = %resolved.display(), "Skip stylesheet imported twice");
        continue;
      }

      let source = self
        .fs
        .read_to_string(&resolved)
        .with_context(|| format!("Failed to read imported stylesheet {}", resolved.display()))?;
      let imported = StyleChunk::parse(Some(resolved.clone()), &source)?;

      output.extend(self.inline_chunk(imported, inlined, context)?);

      context.messages.push(TransformMessage::Dependency {
        file: resolved,
        parent: file.clone(),
      });
    }

    output.push(chunk);
    Ok(output)
  }

  fn resolve(&self, reference: &str, file: &Path) -> Result<PathBuf, ResolutionError> {
    let base_dir = file.parent().unwrap_or(Path::new(""));
    let resolved = self
      .path_resolver
      .absolute(reference, base_dir, &ResolveOptions::stylesheet(true))
      .unwrap_or_else(|| normalize_path(&base_dir.join(reference)));

    if !self.fs.is_file(&resolved) {
      return Err(ResolutionError {
        from: file.to_path_buf(),
        file: reference.to_string(),
        resolved,
      });
    }

    Ok(resolved)
  }
}

/// The stylesheet an `@import` rule points at.
///
/// Imports carrying media queries, `supports()` or layers are kept as plain CSS imports.
fn import_reference(rule: &CssRule<'_>) -> Option<String> {
  let CssRule::Import(import) = rule else {
    return None;
  };

  if !import.media.media_queries.is_empty() || import.supports.is_some() || import.layer.is_some()
  {
    return None;
  }

  Some(import.url.to_string())
}
