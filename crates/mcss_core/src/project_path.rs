use std::path::{Path, PathBuf};

use mcss_filesystem::normalize_path;
use path_slash::PathExt;

/// Converts the path so that it is relative to the project root
pub fn to_project_path(project_root: &Path, file_path: &Path) -> PathBuf {
  if file_path.is_relative() {
    return normalize_path(file_path);
  }

  pathdiff::diff_paths(file_path, project_root).unwrap_or_else(|| file_path.to_path_buf())
}

/// Normalized, forward-slash form of a project path, as used for keys of the output maps
pub fn to_resource_key(path: &Path) -> String {
  normalize_path(path).to_slash_lossy().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  mod to_project_path {
    use super::*;

    #[test]
    fn returns_relative_paths_normalized() {
      assert_eq!(
        to_project_path(Path::new("/project"), Path::new("./styles/../a.mcss")),
        PathBuf::from("a.mcss")
      );
    }

    #[test]
    fn returns_project_path_when_inside_project_root() {
      let project_root = Path::new("/project-root");
      let project_path = Path::new("styles").join("a.mcss");

      assert_eq!(
        to_project_path(project_root, &project_root.join(&project_path)),
        project_path
      );
    }

    #[test]
    fn walks_up_when_outside_project_root() {
      assert_eq!(
        to_project_path(Path::new("/project/src"), Path::new("/project/lib/a.mcss")),
        PathBuf::from("../lib/a.mcss")
      );
    }
  }

  mod to_resource_key {
    use super::*;

    #[test]
    fn normalizes_the_key() {
      assert_eq!(to_resource_key(Path::new("./src//a.mcss")), "src/a.mcss");
      assert_eq!(to_resource_key(Path::new("src/b/../a.mcss")), "src/a.mcss");
    }
  }
}
