use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Lexically normalize a path, removing `.` segments and folding `..` into their parent.
///
/// The file system is never consulted, so symlinks are not resolved. Leading `..` segments of a
/// relative path are kept since there is nothing to fold them into.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut result: Vec<Component<'_>> = Vec::new();

  for component in path.components() {
    match component {
      Component::Prefix(prefix) => {
        result = vec![Component::Prefix(prefix)];
      }
      Component::RootDir => {
        result.push(Component::RootDir);
      }
      Component::CurDir => {}
      Component::ParentDir => match result.last() {
        Some(Component::Normal(_)) => {
          result.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => result.push(Component::ParentDir),
      },
      Component::Normal(segment) => {
        result.push(Component::Normal(segment));
      }
    }
  }

  if result.is_empty() {
    return PathBuf::from(".");
  }

  PathBuf::from_iter(result)
}
