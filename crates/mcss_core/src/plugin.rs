use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use crate::diagnostic::Diagnostic;
use crate::diagnostic::Diagnostics;
use crate::stylesheet::Stylesheet;

pub type StylesheetTransformRef = Arc<dyn StylesheetTransform>;

/// A message emitted while a stylesheet moves through the pipeline, for later transforms to consume
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransformMessage {
  /// `file` was pulled into `parent` by a mechanism the module graph does not record,
  /// such as `@import` inlining
  Dependency { file: PathBuf, parent: PathBuf },
}

/// Mutable state shared by every transform that runs over one stylesheet
#[derive(Debug, Default)]
pub struct TransformContext {
  pub messages: Vec<TransformMessage>,
  pub diagnostics: Diagnostics,
}

impl TransformContext {
  pub fn warn(&mut self, diagnostic: Diagnostic) {
    self.diagnostics.push(diagnostic);
  }
}

/// Rewrite a parsed stylesheet in place
///
/// Transforms are grouped by [`PluginStage`] and run in insertion order within a stage.
pub trait StylesheetTransform: Debug + Send + Sync {
  fn name(&self) -> &str;

  fn transform(
    &self,
    stylesheet: &mut Stylesheet,
    context: &mut TransformContext,
  ) -> Result<(), anyhow::Error>;
}

/// When a transform runs relative to module scoping and bundling
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluginStage {
  /// Before local selectors are scoped, once per file
  Before,
  /// While the file's exports are being computed
  Processing,
  /// After a file has been fully processed
  After,
  /// Once, over the concatenated bundle
  Done,
}

/// Ordered transforms, keyed by the stage they run in
#[derive(Clone, Debug, Default)]
pub struct StagedTransforms {
  stages: BTreeMap<PluginStage, Vec<StylesheetTransformRef>>,
}

impl StagedTransforms {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, stage: PluginStage, transform: StylesheetTransformRef) {
    self.stages.entry(stage).or_default().push(transform);
  }

  /// Append every transform of `other` after the transforms already registered for each stage
  pub fn extend(&mut self, other: &StagedTransforms) {
    for (stage, transforms) in &other.stages {
      self
        .stages
        .entry(*stage)
        .or_default()
        .extend(transforms.iter().cloned());
    }
  }

  pub fn get(&self, stage: PluginStage) -> &[StylesheetTransformRef] {
    self
      .stages
      .get(&stage)
      .map(|transforms| transforms.as_slice())
      .unwrap_or_default()
  }

  pub fn names(&self, stage: PluginStage) -> Vec<&str> {
    self.get(stage).iter().map(|t| t.name()).collect()
  }

  pub fn run(
    &self,
    stage: PluginStage,
    stylesheet: &mut Stylesheet,
    context: &mut TransformContext,
  ) -> Result<(), anyhow::Error> {
    for transform in self.get(stage) {
      tracing::trace!(
        transform = transform.name(),
        ?stage,
        file = %stylesheet.source_file.display(),
        "Run transform"
      );
      transform.transform(stylesheet, context)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use crate::stylesheet::StyleChunk;

  use super::*;

  #[derive(Debug)]
  struct AppendRule {
    name: &'static str,
  }

  impl StylesheetTransform for AppendRule {
    fn name(&self) -> &str {
      self.name
    }

    fn transform(
      &self,
      stylesheet: &mut Stylesheet,
      _context: &mut TransformContext,
    ) -> Result<(), anyhow::Error> {
      let chunk = StyleChunk::parse(None, &format!(".{} {{ top: 0; }}", self.name))?;
      stylesheet.chunks.push(chunk);
      Ok(())
    }
  }

  #[derive(Debug, Default)]
  struct RecordMessages {
    seen: Mutex<Vec<TransformMessage>>,
  }

  impl StylesheetTransform for RecordMessages {
    fn name(&self) -> &str {
      "record"
    }

    fn transform(
      &self,
      _stylesheet: &mut Stylesheet,
      context: &mut TransformContext,
    ) -> Result<(), anyhow::Error> {
      self
        .seen
        .lock()
        .unwrap()
        .extend(context.messages.iter().cloned());
      Ok(())
    }
  }

  fn classes(stylesheet: &Stylesheet) -> Vec<String> {
    stylesheet
      .chunks
      .iter()
      .filter_map(|chunk| chunk.code().split_whitespace().next())
      .map(String::from)
      .collect()
  }

  #[test]
  fn can_be_defined_in_dyn_vec() {
    let mut transforms = Vec::<StylesheetTransformRef>::new();

    transforms.push(Arc::new(AppendRule { name: "a" }));

    assert_eq!(transforms.len(), 1);
  }

  #[test]
  fn runs_only_the_requested_stage_in_order() {
    let mut staged = StagedTransforms::new();
    staged.push(PluginStage::After, Arc::new(AppendRule { name: "after" }));
    staged.push(PluginStage::Before, Arc::new(AppendRule { name: "first" }));
    staged.push(PluginStage::Before, Arc::new(AppendRule { name: "second" }));

    let mut stylesheet = Stylesheet::default();
    staged
      .run(
        PluginStage::Before,
        &mut stylesheet,
        &mut TransformContext::default(),
      )
      .unwrap();

    assert_eq!(classes(&stylesheet), vec![".first", ".second"]);
  }

  #[test]
  fn extend_appends_after_existing_transforms() {
    let mut staged = StagedTransforms::new();
    staged.push(PluginStage::Done, Arc::new(AppendRule { name: "builtin" }));

    let mut user = StagedTransforms::new();
    user.push(PluginStage::Done, Arc::new(AppendRule { name: "user" }));
    user.push(PluginStage::Processing, Arc::new(AppendRule { name: "p" }));

    staged.extend(&user);

    assert_eq!(staged.names(PluginStage::Done), vec!["builtin", "user"]);
    assert_eq!(staged.names(PluginStage::Processing), vec!["p"]);
    assert!(staged.get(PluginStage::Before).is_empty());
  }

  #[test]
  fn transforms_can_read_messages() {
    let recorder = Arc::new(RecordMessages::default());
    let mut staged = StagedTransforms::new();
    staged.push(PluginStage::Before, recorder.clone());

    let message = TransformMessage::Dependency {
      file: PathBuf::from("/b.mcss"),
      parent: PathBuf::from("/a.mcss"),
    };
    let mut context = TransformContext {
      messages: vec![message.clone()],
      ..TransformContext::default()
    };

    staged
      .run(PluginStage::Before, &mut Stylesheet::default(), &mut context)
      .unwrap();

    assert_eq!(*recorder.seen.lock().unwrap(), vec![message]);
  }
}
