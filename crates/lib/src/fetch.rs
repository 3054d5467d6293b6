//! Remote artifact fetching.
//!
//! Downloads sandboxes and helper executables from the job cache. Every failure,
//! transport or HTTP status, comes back as a [`FetchError`] carrying a diagnostic the
//! driver prints verbatim.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FetchError {
  /// Connection, TLS or body transfer failure.
  #[error("failed to fetch {url}: {message}")]
  Transport { url: String, message: String },

  /// The server answered with a non-success status.
  #[error("failed to fetch {url}: HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Download `url` to `dest`, creating parent directories as needed.
///
/// Returns the number of bytes written.
pub async fn fetch(url: &str, dest: &Path) -> Result<u64, FetchError> {
  info!(url = %url, dest = %dest.display(), "fetching");

  let transport = |e: reqwest::Error| FetchError::Transport {
    url: url.to_string(),
    message: e.to_string(),
  };

  let response = reqwest::get(url).await.map_err(transport)?;

  let status = response.status();
  if !status.is_success() {
    return Err(FetchError::Status {
      url: url.to_string(),
      status: status.as_u16(),
    });
  }

  let bytes = response.bytes().await.map_err(transport)?;
  write_file(dest, &bytes).await?;

  info!(path = %dest.display(), size = bytes.len(), "download complete");
  Ok(bytes.len() as u64)
}

async fn write_file(dest: &Path, bytes: &[u8]) -> Result<(), FetchError> {
  let write_err = |source| FetchError::Write {
    path: dest.to_path_buf(),
    source,
  };

  if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).await.map_err(write_err)?;
  }

  let mut file = fs::File::create(dest).await.map_err(write_err)?;
  file.write_all(bytes).await.map_err(write_err)?;
  file.flush().await.map_err(write_err)?;

  debug!(path = %dest.display(), "wrote fetched artifact");
  Ok(())
}

/// Last path component of a URL, without query string, usable as a file name.
pub fn url_file_name(url: &str) -> Option<String> {
  let last = url.rsplit('/').next()?;
  let name = last.split('?').next().unwrap_or(last);

  let sanitized: String = name
    .chars()
    .map(|c| {
      if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
        c
      } else {
        '_'
      }
    })
    .collect();

  if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
    None
  } else {
    Some(sanitized)
  }
}
