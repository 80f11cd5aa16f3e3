//! Transforms owned by the processor and the stage layout they run in.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Error;
use lightningcss::rules::CssRule;
use mcss_core::plugin::PluginStage;
use mcss_core::plugin::StagedTransforms;
use mcss_core::plugin::StylesheetTransform;
use mcss_core::plugin::TransformContext;
use mcss_core::plugin::TransformMessage;
use mcss_core::resolver::AssetResolverRef;
use mcss_core::resolver::PathResolverRef;
use mcss_core::stylesheet::retain_rules;
use mcss_core::stylesheet::Stylesheet;
use mcss_plugin_asset::AssetTransform;
use mcss_plugin_asset::AssetTransformOptions;
use mcss_plugin_path_resolver::PathResolverTransform;

use crate::import_dependencies::ImportDependenciesRef;

/// Feeds `@import` dependency messages into the shared import dependency map
#[derive(Debug)]
pub struct DependencyCollector {
  import_dependencies: ImportDependenciesRef,
}

impl DependencyCollector {
  pub fn new(import_dependencies: ImportDependenciesRef) -> Self {
    Self {
      import_dependencies,
    }
  }
}

impl StylesheetTransform for DependencyCollector {
  fn name(&self) -> &str {
    "mcss-dependency-collector"
  }

  fn transform(
    &self,
    _stylesheet: &mut Stylesheet,
    context: &mut TransformContext,
  ) -> Result<(), Error> {
    let mut import_dependencies = self.import_dependencies.write();

    for message in &context.messages {
      let TransformMessage::Dependency { file, parent } = message;
      import_dependencies.record_edge(file, parent);
    }

    Ok(())
  }
}

/// Removes style rules without declarations and grouping at-rules without rules
#[derive(Debug, Default)]
pub struct DiscardEmpty;

impl StylesheetTransform for DiscardEmpty {
  fn name(&self) -> &str {
    "mcss-discard-empty"
  }

  fn transform(
    &self,
    stylesheet: &mut Stylesheet,
    _context: &mut TransformContext,
  ) -> Result<(), Error> {
    stylesheet.edit_chunks(|_, stylesheet| {
      retain_rules(&mut stylesheet.rules, &mut |rule| match rule {
        CssRule::Style(style) => {
          !style.declarations.declarations.is_empty()
            || !style.declarations.important_declarations.is_empty()
            || !style.rules.0.is_empty()
        }
        CssRule::Media(media) => !media.rules.0.is_empty(),
        CssRule::Supports(supports) => !supports.rules.0.is_empty(),
        CssRule::LayerBlock(layer) => !layer.rules.0.is_empty(),
        CssRule::Container(container) => !container.rules.0.is_empty(),
        CssRule::MozDocument(document) => !document.rules.0.is_empty(),
        CssRule::FontFace(font_face) => !font_face.properties.is_empty(),
        _ => true,
      });
      Ok(())
    })
  }
}

pub struct PipelineOptions {
  pub asset_resolver: AssetResolverRef,
  pub import_dependencies: ImportDependenciesRef,
  pub path_resolver: PathResolverRef,
  pub public_dir: Option<PathBuf>,
  pub resource_basedir: PathBuf,
}

/// Built-in transforms for every stage, followed by the user supplied `extra` transforms
pub fn staged_transforms(options: PipelineOptions, extra: &StagedTransforms) -> StagedTransforms {
  let mut transforms = StagedTransforms::new();

  transforms.push(
    PluginStage::Before,
    Arc::new(DependencyCollector::new(options.import_dependencies)),
  );

  // 'img::logo.png' -> '../assets/img/logo.png'
  transforms.push(
    PluginStage::After,
    Arc::new(PathResolverTransform::new(options.path_resolver)),
  );
  transforms.push(
    PluginStage::After,
    Arc::new(AssetTransform::new(AssetTransformOptions {
      public_dir: options.public_dir,
      resource_basedir: options.resource_basedir,
      asset_resolver: options.asset_resolver,
    })),
  );

  transforms.push(PluginStage::Done, Arc::new(DiscardEmpty));

  transforms.extend(extra);
  transforms
}
