//! The per-invocation scratch tree.
//!
//! One `workDir` below the directory the job started in. It is wiped and recreated
//! before the pipeline body (kept as-is in framework-package mode, where the helper
//! manages it), filled from archives, and removed at the end unless debug mode keeps
//! it for inspection.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::WORK_DIR_NAME;

#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to remove stale workspace {}: {source}", path.display())]
  RemoveStale {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to expand {}: {source}", archive.display())]
  Extract {
    archive: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {}: {source}", path.display())]
  WriteFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

#[derive(Debug, Clone)]
pub struct Workspace {
  start_dir: PathBuf,
  root: PathBuf,
}

impl Workspace {
  /// Path of the workspace for a given starting directory, without creating it.
  pub fn path_for(start_dir: &Path) -> PathBuf {
    start_dir.join(WORK_DIR_NAME)
  }

  /// Create the workspace below `start_dir`.
  ///
  /// Without `reuse`, any existing tree is removed first. With `reuse`, an existing
  /// tree is kept and only created when missing.
  pub fn prepare(start_dir: &Path, reuse: bool) -> Result<Self, WorkspaceError> {
    let root = Self::path_for(start_dir);

    if !reuse && root.exists() {
      debug!(path = %root.display(), "removing stale workspace");
      fs::remove_dir_all(&root).map_err(|source| WorkspaceError::RemoveStale {
        path: root.clone(),
        source,
      })?;
    }

    fs::create_dir_all(&root).map_err(|source| WorkspaceError::CreateDir {
      path: root.clone(),
      source,
    })?;

    info!(path = %root.display(), reuse, "workspace ready");
    Ok(Self {
      start_dir: start_dir.to_path_buf(),
      root,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Resolve a caller-supplied path: absolute paths are kept, relative ones are taken
  /// relative to the starting directory.
  pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
    resolve_against(&self.start_dir, path.as_ref())
  }

  /// Create a directory (and parents) inside or below the workspace.
  pub fn create_dir(&self, path: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(path).map_err(|source| WorkspaceError::CreateDir {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Expand a tar archive into the workspace root. Returns the number of entries.
  pub fn expand(&self, archive: impl AsRef<Path>) -> Result<usize, WorkspaceError> {
    let archive = self.resolve(archive);
    self.expand_into(&archive, &self.root)
  }

  /// Expand a tar archive (gzip-compressed or plain) into `dest`.
  ///
  /// Entry modification times are not restored: extracted files get the current
  /// time so build tools see them as fresh.
  pub fn expand_into(&self, archive: &Path, dest: &Path) -> Result<usize, WorkspaceError> {
    info!(archive = %archive.display(), dest = %dest.display(), "expanding archive");
    let extract_err = |source| WorkspaceError::Extract {
      archive: archive.to_path_buf(),
      source,
    };

    self.create_dir(dest)?;

    let reader = open_archive(archive).map_err(extract_err)?;
    let mut tar = Archive::new(reader);
    tar.set_preserve_mtime(false);
    tar.set_preserve_permissions(true);

    let mut count = 0;
    for entry in tar.entries().map_err(extract_err)? {
      let mut entry = entry.map_err(extract_err)?;
      if let Ok(path) = entry.path() {
        debug!(entry = %path.display(), "extract");
      }
      entry.unpack_in(dest).map_err(extract_err)?;
      count += 1;
    }

    info!(entries = count, "archive expanded");
    Ok(count)
  }

  /// Write a generated file, creating its parent directory.
  pub fn write_file(&self, path: &Path, content: &str) -> Result<(), WorkspaceError> {
    if let Some(parent) = path.parent() {
      self.create_dir(parent)?;
    }
    fs::write(path, content).map_err(|source| WorkspaceError::WriteFile {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
  }

  /// Remove the workspace unless `keep` is set. Failures are logged, never returned.
  pub fn teardown(self, keep: bool) {
    if keep {
      info!(path = %self.root.display(), "keeping workspace for inspection");
      return;
    }
    match fs::remove_dir_all(&self.root) {
      Ok(()) => debug!(path = %self.root.display(), "workspace removed"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => warn!(path = %self.root.display(), error = %e, "failed to remove workspace"),
    }
  }
}

/// `path` if absolute, otherwise `base/path`.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  }
}

/// Best-effort removal of a file or directory. Missing paths are not an error.
pub fn remove_path(path: &Path) {
  let result = if path.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  };
  match result {
    Ok(()) => debug!(path = %path.display(), "removed"),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
    Err(e) => warn!(path = %path.display(), error = %e, "failed to remove"),
  }
}

/// Open an archive, transparently decompressing gzip.
fn open_archive(path: &Path) -> std::io::Result<Box<dyn Read>> {
  let mut file = File::open(path)?;
  let mut magic = [0u8; 2];
  let read = file.read(&mut magic)?;
  file.seek(SeekFrom::Start(0))?;

  let reader = BufReader::new(file);
  if read == 2 && magic == [0x1f, 0x8b] {
    Ok(Box::new(GzDecoder::new(reader)))
  } else {
    Ok(Box::new(reader))
  }
}
