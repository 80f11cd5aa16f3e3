use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use mcss_core::bundler::BundleOutput;
use mcss_core::bundler::Bundler;
use mcss_core::bundler::BundlerError;
use mcss_core::bundler::Composition;
use mcss_core::bundler::OutputOptions;
use mcss_core::diagnostic::Diagnostic;
use mcss_core::error::ResolutionError;
use mcss_core::namer::Namer;
use mcss_core::plugin::PluginStage;
use mcss_core::plugin::StagedTransforms;
use mcss_core::plugin::TransformContext;
use mcss_core::project_path::to_project_path;
use mcss_core::project_path::to_resource_key;
use mcss_core::resolver::PathResolverRef;
use mcss_core::resolver::ResolveOptions;
use mcss_core::stylesheet::walk_style_rules;
use mcss_core::stylesheet::Stylesheet;
use mcss_core::types::BuildMode;
use mcss_filesystem::normalize_path;
use mcss_filesystem::FileSystemRef;

use crate::composes::extract_composes;
use crate::composes::local_classes;
use crate::composes::scope_rule;
use crate::composes::Composes;
use crate::composes::ComposesSource;
use crate::imports::ImportInliner;
use crate::module_graph::ModuleGraph;

#[derive(Clone, Debug, Default)]
pub struct ModuleStoreOptions {
  /// Project root. Relative paths are resolved against it and scoped names are derived from
  /// paths relative to it.
  pub root: PathBuf,
  pub mode: BuildMode,
  pub transforms: StagedTransforms,
}

#[derive(Debug)]
struct Module {
  stylesheet: Stylesheet,
  composition: Composition,
}

/// Compiles modular stylesheets one file at a time and assembles every tracked file into one
/// bundle.
///
/// For each file: `@import` statements are inlined, the `Before` stage runs, `composes`
/// declarations are collected and the files they reference are tracked, the `Processing` stage
/// runs, local classes are renamed with the [`Namer`] and the `After` stage runs. The `Done` stage
/// runs once over the concatenated bundle.
#[derive(Debug)]
pub struct ModuleStore {
  fs: FileSystemRef,
  graph: ModuleGraph,
  minify: bool,
  modules: BTreeMap<PathBuf, Module>,
  namer: Namer,
  path_resolver: PathResolverRef,
  root: PathBuf,
  transforms: StagedTransforms,
}

impl ModuleStore {
  pub fn new(fs: FileSystemRef, path_resolver: PathResolverRef, options: ModuleStoreOptions) -> Self {
    Self {
      fs,
      graph: ModuleGraph::new(),
      minify: !options.mode.is_development(),
      modules: BTreeMap::new(),
      namer: Namer::new(options.mode),
      path_resolver,
      root: options.root,
      transforms: options.transforms,
    }
  }

  /// Selector map of a tracked file
  pub fn composition(&self, path: &Path) -> Option<&Composition> {
    self
      .modules
      .get(&self.absolute(path))
      .map(|module| &module.composition)
  }

  fn absolute(&self, path: &Path) -> PathBuf {
    normalize_path(&self.root.join(path))
  }

  fn source_key(&self, path: &Path) -> String {
    to_resource_key(&to_project_path(&self.root, path))
  }

  fn track(&mut self, path: &Path, stack: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    if self.modules.contains_key(path) {
      return Ok(());
    }

    // Composes cycle, the file is already being compiled further up
    if stack.iter().any(|parent| parent == path) {
      return Ok(());
    }

    tracing::debug!(path = %path.display(), "Compiling stylesheet");

    let source = self
      .fs
      .read_to_string(path)
      .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut stylesheet = Stylesheet::parse(path, &source)?;
    let mut context = TransformContext::default();

    ImportInliner {
      fs: &*self.fs,
      path_resolver: &*self.path_resolver,
    }
    .inline(&mut stylesheet, &mut context)?;

    self
      .transforms
      .run(PluginStage::Before, &mut stylesheet, &mut context)?;

    let mut composes = Vec::new();
    for declaration in extract_composes(&mut stylesheet)? {
      match declaration {
        Ok(declaration) => composes.push(declaration),
        Err(value) => context.warn(
          Diagnostic::new(format!("Ignoring invalid composes: {value}"))
            .with_origin("mcss-module-store")
            .with_file(path),
        ),
      }
    }

    stack.push(path.to_path_buf());
    let dependencies = self.track_dependencies(path, &composes, stack);
    stack.pop();
    let dependencies = dependencies?;

    for dependency in dependencies.values() {
      self.graph.add_dependency(path, dependency);
    }

    self
      .transforms
      .run(PluginStage::Processing, &mut stylesheet, &mut context)?;

    let composition = self.scope(path, &mut stylesheet, &composes, &dependencies)?;

    self
      .transforms
      .run(PluginStage::After, &mut stylesheet, &mut context)?;

    for diagnostic in context.diagnostics.iter() {
      tracing::warn!("{diagnostic}");
    }

    self.modules.insert(
      path.to_path_buf(),
      Module {
        stylesheet,
        composition,
      },
    );

    Ok(())
  }

  /// Resolve and track every stylesheet composed from, keyed by the reference as written
  fn track_dependencies(
    &mut self,
    path: &Path,
    composes: &[Composes],
    stack: &mut Vec<PathBuf>,
  ) -> anyhow::Result<HashMap<String, PathBuf>> {
    let mut dependencies = HashMap::new();

    for declaration in composes {
      let ComposesSource::File(reference) = &declaration.source else {
        continue;
      };

      if dependencies.contains_key(reference) {
        continue;
      }

      let dependency = self.resolve_composes(path, reference)?;
      self.track(&dependency, stack)?;
      dependencies.insert(reference.clone(), dependency);
    }

    Ok(dependencies)
  }

  fn resolve_composes(&self, path: &Path, reference: &str) -> Result<PathBuf, ResolutionError> {
    let resolved = self
      .path_resolver
      .absolute(reference, path, &ResolveOptions::stylesheet(false))
      .unwrap_or_else(|| PathBuf::from(reference));

    if !self.fs.is_file(&resolved) {
      return Err(ResolutionError {
        from: path.to_path_buf(),
        file: reference.to_string(),
        resolved,
      });
    }

    Ok(resolved)
  }

  /// Rename local classes and build the file's composition
  fn scope(
    &self,
    path: &Path,
    stylesheet: &mut Stylesheet,
    composes: &[Composes],
    dependencies: &HashMap<String, PathBuf>,
  ) -> anyhow::Result<Composition> {
    let source_key = self.source_key(path);
    let mut composition = Composition::new();

    stylesheet.edit_chunks(|_, stylesheet| {
      walk_style_rules(&mut stylesheet.rules, &mut |rule| {
        for class in local_classes(rule) {
          composition
            .entry(class.clone())
            .or_insert_with(|| vec![self.namer.name(&source_key, &class)]);
        }

        scope_rule(rule, &mut |class| self.namer.name(&source_key, class));
      });
      Ok(())
    })?;

    for declaration in composes {
      let mut composed = Vec::new();

      for name in &declaration.names {
        let names = match &declaration.source {
          ComposesSource::Local => composition
            .get(name)
            .cloned()
            .unwrap_or_else(|| vec![self.namer.name(&source_key, name)]),
          ComposesSource::Global => vec![name.clone()],
          ComposesSource::File(reference) => dependencies
            .get(reference)
            .map(|dependency| self.exported_names(dependency, name))
            .unwrap_or_default(),
        };

        composed.extend(names);
      }

      for target in &declaration.targets {
        let entry = composition
          .entry(target.clone())
          .or_insert_with(|| vec![self.namer.name(&source_key, target)]);

        for name in &composed {
          if !entry.contains(name) {
            entry.push(name.clone());
          }
        }
      }
    }

    Ok(composition)
  }

  /// Global names `class` of `dependency` expands to
  fn exported_names(&self, dependency: &Path, class: &str) -> Vec<String> {
    self
      .modules
      .get(dependency)
      .and_then(|module| module.composition.get(class).cloned())
      .unwrap_or_else(|| vec![self.namer.name(&self.source_key(dependency), class)])
  }

  /// Tracked files with every file they compose from placed before them
  fn bundle_order(&self) -> Vec<PathBuf> {
    let mut visited = HashSet::new();
    let mut order = Vec::with_capacity(self.modules.len());

    for path in self.modules.keys() {
      self.visit(path, &mut visited, &mut order);
    }

    order
  }

  fn visit(&self, path: &Path, visited: &mut HashSet<PathBuf>, order: &mut Vec<PathBuf>) {
    if !visited.insert(path.to_path_buf()) {
      return;
    }

    for dependency in self.graph.dependencies(path) {
      if self.modules.contains_key(&dependency) {
        self.visit(&dependency, visited, order);
      }
    }

    order.push(path.to_path_buf());
  }
}

#[async_trait]
impl Bundler for ModuleStore {
  async fn file(&mut self, path: &Path) -> anyhow::Result<()> {
    let path = self.absolute(path);
    self.track(&path, &mut Vec::new())
  }

  fn remove(&mut self, path: &Path) -> Result<(), BundlerError> {
    let path = self.absolute(path);

    if self.modules.remove(&path).is_none() {
      return Err(BundlerError::NotTracked(path));
    }

    tracing::debug!(path = %path.display(), "Removed stylesheet");
    self.graph.remove_dependencies(&path);

    Ok(())
  }

  fn dependents(&self, path: &Path) -> Result<Vec<PathBuf>, BundlerError> {
    let path = self.absolute(path);

    if !self.modules.contains_key(&path) {
      return Err(BundlerError::NotTracked(path));
    }

    Ok(
      self
        .graph
        .dependents(&path)
        .into_iter()
        .filter(|dependent| self.modules.contains_key(dependent))
        .collect(),
    )
  }

  fn is_tracked(&self, path: &Path) -> bool {
    self.modules.contains_key(&self.absolute(path))
  }

  async fn output(&mut self, options: &OutputOptions) -> anyhow::Result<BundleOutput> {
    let mut bundle = Stylesheet::new(&options.to, Vec::new());

    for path in self.bundle_order() {
      if let Some(module) = self.modules.get(&path) {
        bundle
          .chunks
          .extend(module.stylesheet.chunks.iter().cloned());
      }
    }

    let mut context = TransformContext::default();
    self
      .transforms
      .run(PluginStage::Done, &mut bundle, &mut context)?;

    for diagnostic in context.diagnostics.iter() {
      tracing::warn!("{diagnostic}");
    }

    let compositions = self
      .modules
      .iter()
      .map(|(path, module)| (self.source_key(path), module.composition.clone()))
      .collect();

    Ok(BundleOutput {
      css: bundle.to_css(self.minify)?,
      compositions,
    })
  }
}
