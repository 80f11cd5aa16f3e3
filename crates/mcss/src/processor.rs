use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use mcss_core::bundler::BundlerRef;
use mcss_core::bundler::OutputOptions;
use mcss_core::bundler::DEFAULT_BUNDLE_NAME;
use mcss_core::error::ConfigurationError;
use mcss_core::plugin::StagedTransforms;
use mcss_core::project_path::to_project_path;
use mcss_core::project_path::to_resource_key;
use mcss_core::resolver::AssetResolverRef;
use mcss_core::resolver::NamespacePathResolver;
use mcss_core::resolver::PathResolverRef;
use mcss_core::resolver::PublicUrlAssetResolver;
use mcss_core::types::SourceFile;
use mcss_filesystem::normalize_path;
use mcss_filesystem::FileSystemRef;
use mcss_module_store::ModuleStore;
use mcss_module_store::ModuleStoreOptions;
use parking_lot::RwLock;

use crate::import_dependencies::ImportDependencies;
use crate::import_dependencies::ImportDependenciesRef;
use crate::invalidation;
use crate::invalidation::DependentsTree;
use crate::options::ProcessorOptions;
use crate::output;
use crate::output::OutputMaps;
use crate::output::OutputSummary;
use crate::plugins::staged_transforms;
use crate::plugins::PipelineOptions;
use crate::watch::FileEvent;
use crate::watch::FileEventKind;

/// Collaborators injected into a [`Processor`]. Anything left unset gets a default built from
/// [`ProcessorOptions`].
#[derive(Clone, Debug, Default)]
pub struct ProcessorPlugins {
  pub path_resolver: Option<PathResolverRef>,
  pub asset_resolver: Option<AssetResolverRef>,
  /// Run after the built-in transforms of each stage
  pub transforms: StagedTransforms,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FileFailure {
  pub file: PathBuf,
  pub error: String,
}

/// Outcome of one [`Processor::process`] call
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
  pub processed: usize,
  pub failures: Vec<FileFailure>,
  /// The written bundle, `None` when the bundle was empty
  pub output: Option<OutputSummary>,
}

impl BatchReport {
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }
}

/// One build session: tracks source files in the module store, evicts stale files when they
/// change and writes the hashed bundle together with its maps.
pub struct Processor {
  basedir: PathBuf,
  bundler: BundlerRef,
  dest_dir: PathBuf,
  fs: FileSystemRef,
  import_dependencies: ImportDependenciesRef,
  maps: OutputMaps,
  options: ProcessorOptions,
}

impl Processor {
  pub fn new(
    fs: FileSystemRef,
    options: ProcessorOptions,
    plugins: ProcessorPlugins,
  ) -> anyhow::Result<Self> {
    let cwd = fs.cwd()?;
    let basedir = match &options.basedir {
      Some(basedir) => normalize_path(&cwd.join(basedir)),
      None => cwd,
    };

    let dest_dir = options
      .dest_dir
      .as_ref()
      .filter(|dest_dir| !dest_dir.as_os_str().is_empty())
      .map(|dest_dir| normalize_path(&basedir.join(dest_dir)))
      .ok_or(ConfigurationError::MissingDestDir)?;

    let path_resolver = plugins.path_resolver.unwrap_or_else(|| {
      Arc::new(NamespacePathResolver::new(
        options
          .namespaces
          .iter()
          .map(|(namespace, dir)| (namespace.clone(), normalize_path(&basedir.join(dir))))
          .collect(),
      ))
    });

    let asset_resolver = plugins
      .asset_resolver
      .unwrap_or_else(|| Arc::new(PublicUrlAssetResolver::new(options.public_url.clone())));

    let import_dependencies = Arc::new(RwLock::new(ImportDependencies::new()));

    let transforms = staged_transforms(
      PipelineOptions {
        asset_resolver,
        import_dependencies: import_dependencies.clone(),
        path_resolver: path_resolver.clone(),
        public_dir: Some(dest_dir.clone()),
        resource_basedir: basedir.clone(),
      },
      &plugins.transforms,
    );

    let bundler = Box::new(ModuleStore::new(
      fs.clone(),
      path_resolver,
      ModuleStoreOptions {
        root: basedir.clone(),
        mode: options.env.clone(),
        transforms,
      },
    ));

    tracing::debug!(
      basedir = %basedir.display(),
      dest_dir = %dest_dir.display(),
      env = %options.env,
      "Created processor"
    );

    Ok(Self {
      basedir,
      bundler,
      dest_dir,
      fs,
      import_dependencies,
      maps: OutputMaps::default(),
      options,
    })
  }

  pub fn basedir(&self) -> &Path {
    &self.basedir
  }

  pub fn dest_dir(&self) -> &Path {
    &self.dest_dir
  }

  pub fn options(&self) -> &ProcessorOptions {
    &self.options
  }

  pub fn maps(&self) -> &OutputMaps {
    &self.maps
  }

  pub fn import_dependencies(&self) -> ImportDependencies {
    self.import_dependencies.read().clone()
  }

  pub fn is_tracked(&self, file: &Path) -> bool {
    self.bundler.is_tracked(&self.absolute(file))
  }

  /// Handle every event in order, then write the bundle and the maps.
  ///
  /// A file that fails to compile is reported without stopping the batch.
  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn process(&mut self, events: Vec<FileEvent>) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();

    for event in events {
      if !self.options.has_extension(&event.file.path) {
        tracing::debug!(file = %event.file.path.display(), "Skipping unhandled extension");
        continue;
      }

      let result = match event.kind {
        FileEventKind::Init => self.on_init(&event.file).await,
        FileEventKind::Add => self.on_add(&event.file).await,
        FileEventKind::Change => self.on_change(&event.file).await,
        FileEventKind::Unlink => self.on_unlink(&event.file).await,
      };

      report.processed += 1;

      if let Err(error) = result {
        tracing::error!(file = %event.file.path.display(), "{error:#}");
        report.failures.push(FileFailure {
          file: event.file.path,
          error: format!("{error:#}"),
        });
      }
    }

    report.output = self.output().await?;
    self.write_maps()?;

    tracing::info!(
      processed = report.processed,
      failed = report.failures.len(),
      "Processed batch"
    );

    Ok(report)
  }

  pub async fn on_init(&mut self, file: &SourceFile) -> anyhow::Result<()> {
    self.track(&file.path).await
  }

  pub async fn on_add(&mut self, file: &SourceFile) -> anyhow::Result<()> {
    self.track(&file.path).await
  }

  /// Evict the file with its dependents, then compile them again
  pub async fn on_change(&mut self, file: &SourceFile) -> anyhow::Result<()> {
    let evicted = self.remove_file_graph_tree(&file.path);
    self.track(&file.path).await?;
    self.retrack_dependents(&file.path, &evicted).await
  }

  /// Evict the file with its dependents and compile the dependents that still exist again.
  ///
  /// Map entries of every evicted file left untracked are removed, including dependents that no
  /// longer compile without the file.
  pub async fn on_unlink(&mut self, file: &SourceFile) -> anyhow::Result<()> {
    let evicted = self.remove_file_graph_tree(&file.path);
    let result = self.retrack_dependents(&file.path, &evicted).await;

    for path in &evicted {
      if !self.bundler.is_tracked(path) {
        let key = to_resource_key(&to_project_path(&self.basedir, path));
        self.maps.remove_source(&key);
      }
    }

    result
  }

  /// Compile again the evicted dependents of `file` that still exist and are not tracked yet
  async fn retrack_dependents(
    &mut self,
    file: &Path,
    evicted: &DependentsTree,
  ) -> anyhow::Result<()> {
    let mut failed = Vec::new();
    for dependent in evicted.iter().skip(1) {
      if !self.fs.is_file(dependent) || self.bundler.is_tracked(dependent) {
        continue;
      }

      if let Err(error) = self.bundler.file(dependent).await {
        tracing::error!(file = %dependent.display(), "{error:#}");
        failed.push(format!("{}: {error:#}", dependent.display()));
      }
    }

    if !failed.is_empty() {
      return Err(anyhow!(
        "Failed to recompile dependents of {}: {}",
        file.display(),
        failed.join(", ")
      ));
    }

    Ok(())
  }

  /// Evict `file` and its dependents without recompiling anything
  pub fn invalidate_file(&mut self, file: &Path) -> DependentsTree {
    self.remove_file_graph_tree(file)
  }

  pub fn remove_file_graph_tree(&mut self, file: &Path) -> DependentsTree {
    let path = self.absolute(file);
    let mut import_dependencies = self.import_dependencies.write();

    invalidation::remove_file_graph_tree(self.bundler.as_mut(), &mut import_dependencies, &path)
  }

  /// Assemble the bundle and write it under its content hash
  pub async fn output(&mut self) -> anyhow::Result<Option<OutputSummary>> {
    let bundle = self
      .bundler
      .output(&OutputOptions {
        to: self.dest_dir.join(DEFAULT_BUNDLE_NAME),
      })
      .await?;

    output::write_bundle(&*self.fs, &self.dest_dir, bundle, &mut self.maps)
  }

  pub fn write_maps(&self) -> anyhow::Result<()> {
    let map_paths = &self.options.map_paths;
    let resolve = |path: &Option<PathBuf>| path.as_ref().map(|path| self.basedir.join(path));

    output::write_json(
      &*self.fs,
      resolve(&map_paths.resources_to_assets_json).as_deref(),
      &self.maps.resources_to_assets,
    )?;
    output::write_json(
      &*self.fs,
      resolve(&map_paths.hashed_assets_json).as_deref(),
      &self.maps.hashed_assets,
    )?;
    output::write_json(
      &*self.fs,
      resolve(&map_paths.selectors_json).as_deref(),
      &self.maps.selectors,
    )?;

    Ok(())
  }

  async fn track(&mut self, file: &Path) -> anyhow::Result<()> {
    let path = self.absolute(file);
    tracing::debug!(file = %file.display(), "Tracking file");

    self.bundler.file(&path).await
  }

  fn absolute(&self, file: &Path) -> PathBuf {
    normalize_path(&self.basedir.join(file))
  }
}
