//! Shell command execution.
//!
//! Runs a rendered environment fragment plus command through a shell, in a given
//! working directory, with `.` prepended to `PATH` for the child so fetched helper
//! scripts resolve without a `./` prefix. The parent's environment is otherwise
//! inherited unchanged: the setup scripts need it.

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::env::EnvironmentFragment;
use crate::execute::types::{ExecuteError, ExecutionOutcome, normalize_status};

/// How a command is run.
#[derive(Debug, Clone, Copy)]
pub struct ExecOptions<'a> {
  /// Shell binary; the script is passed with `-c`.
  pub shell: &'a str,
  /// Working directory of the child.
  pub cwd: &'a Path,
  /// Attach to the terminal instead of capturing output (debug mode).
  pub attach: bool,
}

/// Run `command` under `fragment`.
pub async fn run(
  fragment: &EnvironmentFragment,
  command: &str,
  options: ExecOptions<'_>,
) -> Result<ExecutionOutcome, ExecuteError> {
  run_script(&fragment.wrap(command), options).await
}

/// Run a complete shell script.
pub async fn run_script(script: &str, options: ExecOptions<'_>) -> Result<ExecutionOutcome, ExecuteError> {
  info!(script = %script, cwd = %options.cwd.display(), attach = options.attach, "executing");

  let mut command = Command::new(options.shell);
  command
    .arg("-c")
    .arg(script)
    .current_dir(options.cwd)
    .env("PATH", path_with_cwd());

  let spawn_err = |source| ExecuteError::Spawn {
    shell: options.shell.to_string(),
    source,
  };

  let outcome = if options.attach {
    let status = command
      .stdin(Stdio::inherit())
      .stdout(Stdio::inherit())
      .stderr(Stdio::inherit())
      .status()
      .await
      .map_err(spawn_err)?;
    outcome_from(status, None)
  } else {
    let output = command.stdin(Stdio::null()).output().await.map_err(spawn_err)?;
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    outcome_from(output.status, Some(combined))
  };

  if let Some(signal) = outcome.signal {
    warn!(signal, normalized = outcome.normalized, "command terminated by signal");
  }
  debug!(raw = outcome.raw, normalized = outcome.normalized, "command finished");

  Ok(outcome)
}

/// `PATH` for children: the current directory first, then the inherited value.
fn path_with_cwd() -> OsString {
  let mut path = OsString::from(".");
  if let Some(current) = std::env::var_os("PATH").filter(|p| !p.is_empty()) {
    path.push(if cfg!(windows) { ";" } else { ":" });
    path.push(current);
  }
  path
}

#[cfg(unix)]
fn outcome_from(status: ExitStatus, output: Option<String>) -> ExecutionOutcome {
  use std::os::unix::process::ExitStatusExt;

  let raw = status.into_raw();
  ExecutionOutcome {
    raw,
    normalized: normalize_status(raw),
    signal: status.signal(),
    output,
  }
}

#[cfg(not(unix))]
fn outcome_from(status: ExitStatus, output: Option<String>) -> ExecutionOutcome {
  let raw = status.code().unwrap_or(1);
  ExecutionOutcome {
    raw,
    normalized: normalize_status(raw),
    signal: None,
    output,
  }
}

/// Mark the program named by the first word of `command` as executable, if it
/// exists relative to `cwd`. Missing files are ignored: the word may be a shell
/// builtin or something on `PATH`.
#[cfg(unix)]
pub fn make_executable(command: &str, cwd: &Path) {
  use std::os::unix::fs::PermissionsExt;

  let Some(program) = command.split_whitespace().next() else {
    return;
  };
  let path = cwd.join(program);
  let Ok(metadata) = std::fs::metadata(&path) else {
    debug!(path = %path.display(), "not a local file, leaving permissions alone");
    return;
  };
  if !metadata.is_file() {
    return;
  }

  let mut permissions = metadata.permissions();
  permissions.set_mode(permissions.mode() | 0o111);
  match std::fs::set_permissions(&path, permissions) {
    Ok(()) => debug!(path = %path.display(), "marked executable"),
    Err(e) => warn!(path = %path.display(), error = %e, "failed to mark executable"),
  }
}

#[cfg(not(unix))]
pub fn make_executable(_command: &str, _cwd: &Path) {}
