//! Top-level error type and its mapping to process exit codes.

use thiserror::Error;

use crate::consts::{EC_CMT_FAILED, EC_INTERNAL, EC_MISSING_ARG, EC_NO_ROOT, EC_NO_TARBALL};
use crate::execute::ExecuteError;
use crate::fetch::FetchError;
use crate::request::RequestError;
use crate::workspace::WorkspaceError;

/// A failure that ends the run before the build could report a status of its own.
#[derive(Debug, Error)]
pub enum BuildgenError {
  #[error(transparent)]
  Request(#[from] RequestError),

  #[error("failed to get build helper: {0}")]
  HelperFetch(#[source] FetchError),

  #[error("failed to compile Athena packages: status {status}")]
  FrameworkCompile { status: u8 },

  #[error("{0}")]
  SandboxFetch(#[source] FetchError),

  #[error("failed to expand sandbox: {0}")]
  SandboxExpand(#[source] WorkspaceError),

  #[error("ROOT {key} is unavailable: {reason}")]
  ToolchainUnavailable { key: String, reason: String },

  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),
}

impl BuildgenError {
  /// Exit code reported to the job manager.
  pub fn exit_code(&self) -> u8 {
    match self {
      BuildgenError::Request(_) => EC_MISSING_ARG,
      BuildgenError::HelperFetch(_) => EC_CMT_FAILED,
      BuildgenError::FrameworkCompile { status } => *status,
      BuildgenError::SandboxFetch(_) | BuildgenError::SandboxExpand(_) => EC_NO_TARBALL,
      BuildgenError::ToolchainUnavailable { .. } => EC_NO_ROOT,
      BuildgenError::Workspace(_) | BuildgenError::Execute(_) => EC_INTERNAL,
    }
  }
}
