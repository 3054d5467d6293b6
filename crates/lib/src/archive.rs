//! Packing the workspace into the output artifact.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("failed to create {}: {source}", path.display())]
  Create {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to add {} to archive: {source}", path.display())]
  Append {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read workspace {}: {source}", path.display())]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },
}

/// Write every top-level entry of `root` into a gzip tar at `output`.
///
/// Entries are stored relative to `root`. Hidden top-level entries are skipped, the
/// way a shell `*` glob skips them. Symlinks are stored as links. Returns the number
/// of top-level entries archived.
pub fn create_archive(root: &Path, output: &Path) -> Result<usize, ArchiveError> {
  info!(root = %root.display(), output = %output.display(), "archiving workspace");

  let create_err = |source| ArchiveError::Create {
    path: output.to_path_buf(),
    source,
  };

  if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(create_err)?;
  }

  let file = File::create(output).map_err(create_err)?;
  let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
  builder.follow_symlinks(false);

  let mut count = 0;
  let entries = WalkDir::new(root)
    .min_depth(1)
    .max_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| !is_hidden(e.file_name()));

  for entry in entries {
    let entry = entry.map_err(|source| ArchiveError::Walk {
      path: root.to_path_buf(),
      source,
    })?;
    let path = entry.path();
    if path == output {
      continue;
    }

    let name = entry.file_name();
    let append_err = |source| ArchiveError::Append {
      path: path.to_path_buf(),
      source,
    };

    if entry.file_type().is_dir() {
      builder.append_dir_all(name, path).map_err(append_err)?;
    } else {
      builder.append_path_with_name(path, name).map_err(append_err)?;
    }
    debug!(entry = %path.display(), "archived");
    count += 1;
  }

  builder
    .into_inner()
    .and_then(|encoder| encoder.finish())
    .map_err(create_err)?;

  info!(entries = count, output = %output.display(), "archive written");
  Ok(count)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
  name.to_str().is_some_and(|n| n.starts_with('.'))
}
