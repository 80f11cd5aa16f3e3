use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::normalize_path;
use crate::FileSystem;

#[cfg(not(target_os = "windows"))]
fn root_dir() -> PathBuf {
  PathBuf::from("/")
}

#[cfg(target_os = "windows")]
fn root_dir() -> PathBuf {
  PathBuf::from("C:/")
}

/// In memory implementation of a file-system entry
#[derive(Debug)]
enum InMemoryFileSystemEntry {
  File { contents: Vec<u8> },
  Directory,
}

/// In memory implementation of the `FileSystem` trait, for testing purposes.
#[derive(Debug)]
pub struct InMemoryFileSystem {
  files: RwLock<HashMap<PathBuf, InMemoryFileSystemEntry>>,
  current_working_directory: RwLock<PathBuf>,
}

impl Default for InMemoryFileSystem {
  fn default() -> Self {
    Self {
      files: Default::default(),
      current_working_directory: RwLock::new(root_dir()),
    }
  }
}

impl InMemoryFileSystem {
  /// Change the current working directory. Used for resolving relative paths.
  pub fn set_current_working_directory(&self, cwd: &Path) {
    let cwd = self.absolute(cwd);
    let mut state = self.current_working_directory.write();
    *state = cwd;
  }

  /// Convenience wrapper around [`FileSystem::write`] for test fixtures
  pub fn write_file(&self, path: &Path, contents: String) {
    let _ = self.write(path, contents.as_bytes());
  }

  /// Remove a file, returning whether it existed
  pub fn remove_file(&self, path: &Path) -> bool {
    let path = self.absolute(path);
    self.files.write().remove(&path).is_some()
  }

  /// Paths of every file currently stored, sorted
  pub fn files(&self) -> Vec<PathBuf> {
    let files = self.files.read();
    let mut paths = files
      .iter()
      .filter(|(_, entry)| matches!(entry, InMemoryFileSystemEntry::File { .. }))
      .map(|(path, _)| path.clone())
      .collect::<Vec<_>>();

    paths.sort();
    paths
  }

  fn absolute(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      normalize_path(path)
    } else {
      normalize_path(&self.current_working_directory.read().join(path))
    }
  }
}

impl FileSystem for InMemoryFileSystem {
  fn cwd(&self) -> io::Result<PathBuf> {
    Ok(self.current_working_directory.read().clone())
  }

  fn create_directory(&self, path: &Path) -> io::Result<()> {
    let path = self.absolute(path);
    let mut files = self.files.write();

    let mut dir = Some(path.as_path());
    while let Some(path) = dir {
      files.insert(path.to_path_buf(), InMemoryFileSystemEntry::Directory);
      dir = path.parent();
    }

    Ok(())
  }

  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    let path = self.absolute(path);
    let files = self.files.read();
    match files.get(&path) {
      None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
      Some(InMemoryFileSystemEntry::File { contents }) => Ok(contents.clone()),
      Some(InMemoryFileSystemEntry::Directory) => Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "Path is a directory",
      )),
    }
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    let bytes = self.read(path)?;
    String::from_utf8(bytes).map_err(|_| io::Error::other("Unable to read file as string"))
  }

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    let path = self.absolute(path);
    let mut files = self.files.write();

    if let Some(InMemoryFileSystemEntry::Directory) = files.get(&path) {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "Path is a directory",
      ));
    }

    files.insert(
      path.clone(),
      InMemoryFileSystemEntry::File {
        contents: contents.to_vec(),
      },
    );

    let mut dir = path.parent();
    while let Some(path) = dir {
      files.insert(path.to_path_buf(), InMemoryFileSystemEntry::Directory);
      dir = path.parent();
    }

    Ok(())
  }

  fn is_file(&self, path: &Path) -> bool {
    let path = self.absolute(path);
    matches!(
      self.files.read().get(&path),
      Some(InMemoryFileSystemEntry::File { .. })
    )
  }

  fn is_dir(&self, path: &Path) -> bool {
    let path = self.absolute(path);
    matches!(
      self.files.read().get(&path),
      Some(InMemoryFileSystemEntry::Directory)
    )
  }
}
