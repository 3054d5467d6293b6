//! Build execution.
//!
//! Runs the build step (a RootCore compile script, a user command, or both chained
//! in one shell) inside the resolved environment fragment.

pub mod cmd;
pub mod types;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::consts::ROOTCORE_WORK_DIR_NAME;
use crate::env::EnvironmentFragment;
use crate::request::PackageBuild;

pub use cmd::{ExecOptions, make_executable, run, run_script};
pub use types::{ExecuteError, ExecutionOutcome, normalize_status};

/// The build step of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
  /// Directory the build runs in; created on demand.
  pub run_dir: PathBuf,
  pub package_build: PackageBuild,
  /// User-supplied command, already percent-decoded.
  pub user_command: Option<String>,
}

impl BuildCommand {
  /// Working directory for `run_dir` below `workspace`; the workspace root when no
  /// subdirectory is given.
  pub fn run_dir_in(workspace: &Path, run_dir: Option<&str>) -> PathBuf {
    match run_dir {
      Some(dir) => workspace.join(dir),
      None => workspace.to_path_buf(),
    }
  }

  /// The command line to run, or `None` when there is nothing to build.
  ///
  /// A RootCore compile script is sourced first so the user command sees the
  /// environment it sets up.
  pub fn script(&self) -> Option<String> {
    let compile = match self.package_build {
      PackageBuild::None => None,
      PackageBuild::RootCore { no_compile } => {
        let work_dir = self.run_dir.join(ROOTCORE_WORK_DIR_NAME);
        let script = if no_compile {
          "grid_compile_nobuild.sh"
        } else {
          "grid_compile.sh"
        };
        Some(format!(
          "source {}/RootCore/scripts/{} {}",
          work_dir.display(),
          script,
          work_dir.display()
        ))
      }
    };

    match (compile, self.user_command.as_deref()) {
      (Some(compile), Some(user)) => Some(format!("{}; {}", compile, user)),
      (Some(compile), None) => Some(compile),
      (None, Some(user)) => Some(user.to_string()),
      (None, None) => None,
    }
  }
}

/// Run `build` under `fragment`.
///
/// Returns `Ok(None)` when there was nothing to run.
pub async fn execute_build(
  fragment: &EnvironmentFragment,
  build: &BuildCommand,
  shell: &str,
  attach: bool,
) -> Result<Option<ExecutionOutcome>, ExecuteError> {
  std::fs::create_dir_all(&build.run_dir).map_err(|source| ExecuteError::RunDir {
    path: build.run_dir.clone(),
    source,
  })?;
  info!(pwd = %build.run_dir.display(), "build directory");

  if let Some(user) = &build.user_command {
    make_executable(user, &build.run_dir);
  }

  let Some(script) = build.script() else {
    return Ok(None);
  };

  let options = ExecOptions {
    shell,
    cwd: &build.run_dir,
    attach,
  };
  run(fragment, &script, options).await.map(Some)
}
