use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::Parser;
use mcss::file_system::os_file_system::OsFileSystem;
use mcss::file_system::FileSystemRef;
use mcss::FileEvent;
use mcss::FileEventKind;
use mcss::MapPaths;
use mcss::Processor;
use mcss::ProcessorOptions;
use mcss::ProcessorPlugins;
use mcss_core::project_path::to_project_path;
use mcss_core::types::BuildMode;
use tracing_subscriber::EnvFilter;

/// Compile modular stylesheets into a single content-hashed bundle
#[derive(Debug, Parser)]
#[command(name = "mcss", version)]
struct Args {
  /// Directory containing the source stylesheets
  src_dir: PathBuf,
  /// Directory the hashed bundle is written to
  #[arg(long)]
  dest: Option<PathBuf>,
  /// Print unminified CSS with readable selector names
  #[arg(long)]
  dev: bool,
  /// JSON file with processor options
  #[arg(long)]
  config: Option<PathBuf>,
  /// Directory the resources, hashed assets and selectors maps are written to
  #[arg(long)]
  maps: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();
  let fs: FileSystemRef = Arc::new(OsFileSystem);
  let cwd = fs.cwd()?;
  let src_dir = cwd.join(&args.src_dir);

  let mut options = match &args.config {
    Some(config) => ProcessorOptions::from_file(&*fs, config)?,
    None => ProcessorOptions::default(),
  };

  apply_args(&mut options, &args, &cwd);

  let mut processor = Processor::new(fs.clone(), options, ProcessorPlugins::default())?;
  let events = collect_sources(&src_dir, &processor)?;

  tracing::info!(files = events.len(), src_dir = %src_dir.display(), "Compiling");
  let report = processor.process(events).await?;

  if let Some(output) = &report.output {
    tracing::info!(bundle = %output.path.display(), size = output.size, "Done");
  }

  if !report.is_success() {
    bail!("{} stylesheet(s) failed to compile", report.failures.len());
  }

  Ok(())
}

/// Override `options` with the command line flags.
///
/// Command line paths are relative to `cwd`, not to the basedir.
fn apply_args(options: &mut ProcessorOptions, args: &Args, cwd: &Path) {
  options
    .basedir
    .get_or_insert_with(|| cwd.join(&args.src_dir));
  if let Some(dest) = &args.dest {
    options.dest_dir = Some(cwd.join(dest));
  }
  if args.dev {
    options.env = BuildMode::Development;
  }
  if let Some(maps) = &args.maps {
    options.map_paths = MapPaths::in_dir(&cwd.join(maps));
  }
}

/// An `Init` event for every source file below `src_dir`, in path order
fn collect_sources(src_dir: &Path, processor: &Processor) -> anyhow::Result<Vec<FileEvent>> {
  let mut events = Vec::new();

  for entry in jwalk::WalkDir::new(src_dir).sort(true) {
    let path = entry?.path();
    if !path.is_file() || !processor.options().has_extension(&path) {
      continue;
    }

    events.push(FileEvent::new(
      FileEventKind::Init,
      to_project_path(processor.basedir(), &path),
    ));
  }

  Ok(events)
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn command_line_paths_are_relative_to_the_working_directory() {
    let args = Args::parse_from(["mcss", "src", "--dest", "dist", "--maps", "maps", "--dev"]);
    let mut options = ProcessorOptions::default();

    apply_args(&mut options, &args, Path::new("/work"));

    assert_eq!(options.basedir, Some(PathBuf::from("/work/src")));
    assert_eq!(options.dest_dir, Some(PathBuf::from("/work/dist")));
    assert_eq!(options.map_paths, MapPaths::in_dir(Path::new("/work/maps")));
    assert_eq!(options.env, BuildMode::Development);
  }

  #[test]
  fn config_basedir_is_kept() {
    let args = Args::parse_from(["mcss", "src"]);
    let mut options = ProcessorOptions {
      basedir: Some(PathBuf::from("/project")),
      ..ProcessorOptions::default()
    };

    apply_args(&mut options, &args, Path::new("/work"));

    assert_eq!(options.basedir, Some(PathBuf::from("/project")));
    assert_eq!(options.dest_dir, None);
  }
}
