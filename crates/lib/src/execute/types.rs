//! Types for external process execution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that keep a command from producing an outcome at all.
///
/// A command that runs and exits non-zero is not an error: it yields an
/// [`ExecutionOutcome`] with a non-zero [`normalized`](ExecutionOutcome::normalized).
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The shell could not be started.
  #[error("failed to spawn {shell}: {source}")]
  Spawn {
    shell: String,
    #[source]
    source: std::io::Error,
  },

  /// The working directory could not be created.
  #[error("failed to create run directory {}: {source}", path.display())]
  RunDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Status and output of one external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
  /// Platform status as reported by the OS. On Unix this is the raw wait status
  /// (`exit_code << 8 | signal`).
  pub raw: i32,
  /// Status folded into `0..255`. This is what the driver checks and what becomes
  /// the process exit code.
  pub normalized: u8,
  /// Signal that terminated the process, if any.
  pub signal: Option<i32>,
  /// Combined stdout and stderr. `None` when the command ran attached to the
  /// terminal.
  pub output: Option<String>,
}

impl ExecutionOutcome {
  pub fn is_success(&self) -> bool {
    self.normalized == 0
  }
}

/// Fold a raw status into `0..255`.
///
/// The raw Unix wait status keeps the exit code in the high byte, and
/// `code * 256 ≡ code (mod 255)`, so ordinary exit codes below 255 survive
/// unchanged. Signal terminations map to the signal number. An exit code of exactly
/// 255 folds to 0; callers that care can inspect [`ExecutionOutcome::raw`].
pub fn normalize_status(raw: i32) -> u8 {
  raw.rem_euclid(255) as u8
}
