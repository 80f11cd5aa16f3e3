//! Stylesheets parsed and printed with lightningcss.
//!
//! A [`Stylesheet`] is a list of chunks, one per file that contributed rules to it. Each chunk
//! remembers the file it was written in, which stays true after `@import` inlining moves it into
//! another stylesheet. Transforms edit one chunk at a time: the chunk is parsed, handed to the
//! transform as a lightningcss [`StyleSheet`] and printed back.
//!
//! Comments are dropped while parsing, except `/*! ... */` comments leading a file.

use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;

use anyhow::anyhow;
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::style::StyleRule;
use lightningcss::rules::CssRule;
use lightningcss::rules::CssRuleList;
use lightningcss::stylesheet::MinifyOptions;
use lightningcss::stylesheet::ParserOptions;
use lightningcss::stylesheet::StyleSheet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Failed to parse {}: {message}", .file.display())]
pub struct StylesheetParseError {
  pub file: PathBuf,
  pub message: String,
}

/// Normalized CSS written in one file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleChunk {
  file: Option<PathBuf>,
  code: String,
}

impl StyleChunk {
  /// Parse `code`, failing with a [`StylesheetParseError`] on invalid CSS
  pub fn parse(file: Option<PathBuf>, code: &str) -> anyhow::Result<Self> {
    let mut chunk = Self {
      file,
      code: String::new(),
    };

    let stylesheet = StyleSheet::parse(code, parser_options(chunk.file()))
      .map_err(|error| chunk.parse_error(error))?;
    chunk.code = print(&stylesheet, chunk.file())?;

    Ok(chunk)
  }

  /// The file this chunk was written in
  pub fn file(&self) -> Option<&Path> {
    self.file.as_deref()
  }

  pub fn code(&self) -> &str {
    &self.code
  }

  pub fn is_empty(&self) -> bool {
    self.code.trim().is_empty()
  }

  /// Parse the chunk, let `edit` rewrite the parsed stylesheet and store the printed result
  pub fn edit<F>(&mut self, edit: F) -> anyhow::Result<()>
  where
    F: FnOnce(&mut StyleSheet<'_, '_>) -> anyhow::Result<()>,
  {
    let code = {
      let mut stylesheet = StyleSheet::parse(&self.code, parser_options(self.file()))
        .map_err(|error| self.parse_error(error))?;
      edit(&mut stylesheet)?;
      print(&stylesheet, self.file())?
    };

    self.code = code;
    Ok(())
  }

  fn parse_error(&self, error: impl Display) -> StylesheetParseError {
    StylesheetParseError {
      file: self.file.clone().unwrap_or_default(),
      message: error.to_string(),
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
  /// The file being compiled, or the bundle path once files are concatenated
  pub source_file: PathBuf,
  pub chunks: Vec<StyleChunk>,
}

impl Stylesheet {
  pub fn new(source_file: impl Into<PathBuf>, chunks: Vec<StyleChunk>) -> Self {
    Self {
      source_file: source_file.into(),
      chunks,
    }
  }

  /// Parse the contents of `source_file` into a single chunk
  pub fn parse(source_file: impl Into<PathBuf>, code: &str) -> anyhow::Result<Self> {
    let source_file = source_file.into();
    let chunk = StyleChunk::parse(Some(source_file.clone()), code)?;

    Ok(Self::new(source_file, vec![chunk]))
  }

  pub fn is_empty(&self) -> bool {
    self.chunks.iter().all(StyleChunk::is_empty)
  }

  /// Edit every chunk in order, stopping at the first error
  pub fn edit_chunks<F>(&mut self, mut edit: F) -> anyhow::Result<()>
  where
    F: FnMut(Option<&Path>, &mut StyleSheet<'_, '_>) -> anyhow::Result<()>,
  {
    for chunk in &mut self.chunks {
      let file = chunk.file.clone();
      chunk.edit(|stylesheet| edit(file.as_deref(), stylesheet))?;
    }

    Ok(())
  }

  /// Print every chunk as one stylesheet.
  ///
  /// `@import` rules kept by the chunks are moved to the top, where CSS requires them.
  pub fn to_css(&self, minify: bool) -> anyhow::Result<String> {
    let mut imports = Vec::new();
    let mut rules = Vec::new();
    let mut license_comments = Vec::new();
    let mut sources = Vec::new();

    for chunk in &self.chunks {
      let mut stylesheet = StyleSheet::parse(&chunk.code, parser_options(chunk.file()))
        .map_err(|error| chunk.parse_error(error))?;

      license_comments.append(&mut stylesheet.license_comments);
      sources.append(&mut stylesheet.sources);

      for rule in std::mem::take(&mut stylesheet.rules.0) {
        if matches!(rule, CssRule::Import(_)) {
          imports.push(rule);
        } else {
          rules.push(rule);
        }
      }
    }

    imports.append(&mut rules);

    let mut bundle = StyleSheet::new(sources, CssRuleList(imports), ParserOptions::default());
    bundle.license_comments = license_comments;

    if minify {
      bundle
        .minify(MinifyOptions::default())
        .map_err(|error| anyhow!("Failed to minify {}: {error}", self.source_file.display()))?;
    }

    let output = bundle
      .to_css(PrinterOptions {
        minify,
        ..PrinterOptions::default()
      })
      .map_err(|error| anyhow!("Failed to print {}: {error}", self.source_file.display()))?;

    Ok(output.code)
  }
}

fn parser_options<'o, 'i>(file: Option<&Path>) -> ParserOptions<'o, 'i> {
  ParserOptions {
    filename: file
      .map(|file| file.display().to_string())
      .unwrap_or_default(),
    ..ParserOptions::default()
  }
}

fn print(stylesheet: &StyleSheet<'_, '_>, file: Option<&Path>) -> anyhow::Result<String> {
  let output = stylesheet.to_css(PrinterOptions::default()).map_err(|error| {
    anyhow!(
      "Failed to print {}: {error}",
      file.unwrap_or(Path::new("<anonymous>")).display()
    )
  })?;

  Ok(output.code)
}

/// Rules nested directly inside `rule`
pub fn child_rules<'a, 'i>(rule: &'a mut CssRule<'i>) -> Option<&'a mut CssRuleList<'i>> {
  match rule {
    CssRule::Style(style) => Some(&mut style.rules),
    CssRule::Media(media) => Some(&mut media.rules),
    CssRule::Supports(supports) => Some(&mut supports.rules),
    CssRule::LayerBlock(layer) => Some(&mut layer.rules),
    CssRule::Container(container) => Some(&mut container.rules),
    CssRule::MozDocument(document) => Some(&mut document.rules),
    _ => None,
  }
}

/// Visit every style rule in document order, including rules nested in grouping at-rules
pub fn walk_style_rules<'i, F>(rules: &mut CssRuleList<'i>, visit: &mut F)
where
  F: FnMut(&mut StyleRule<'i>),
{
  for rule in rules.0.iter_mut() {
    if let CssRule::Style(style) = rule {
      visit(style);
    }

    if let Some(children) = child_rules(rule) {
      walk_style_rules(children, visit);
    }
  }
}

/// Remove every rule, at any depth, for which `keep` returns false.
///
/// Children are filtered before their parent is tested, so a block emptied by this call can be
/// removed by the same call.
pub fn retain_rules<'i, F>(rules: &mut CssRuleList<'i>, keep: &mut F)
where
  F: FnMut(&CssRule<'i>) -> bool,
{
  for rule in rules.0.iter_mut() {
    if let Some(children) = child_rules(rule) {
      retain_rules(children, keep);
    }
  }

  rules.0.retain(|rule| keep(rule));
}
