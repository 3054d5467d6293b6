//! Node-level settings read from the process environment.
//!
//! The command line describes the job; these describe the worker node: where the
//! helper executable lives, where the shared ROOT distribution is mounted, and which
//! shell runs the setup fragments.

use std::path::PathBuf;

use crate::consts::{DEFAULT_ROOT_BASE, DEFAULT_SHELL, DEFAULT_TRF_BASE_URL};

pub const TRF_URL_VAR: &str = "BUILDGEN_TRF_URL";
pub const SHELL_VAR: &str = "BUILDGEN_SHELL";
pub const ROOT_BASE_VAR: &str = "ATLAS_LOCAL_ROOT_BASE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// Base URL the helper build-driver executable is fetched from.
  pub trf_base_url: String,
  /// Shell used to run rendered environment fragments.
  pub shell: String,
  /// Root of the shared ROOT distribution.
  pub root_base: PathBuf,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      trf_base_url: DEFAULT_TRF_BASE_URL.to_string(),
      shell: DEFAULT_SHELL.to_string(),
      root_base: PathBuf::from(DEFAULT_ROOT_BASE),
    }
  }
}

impl Settings {
  /// Build settings from the environment, falling back to the defaults for unset or
  /// empty variables.
  pub fn from_env() -> Self {
    let defaults = Self::default();
    Self {
      trf_base_url: non_empty_var(TRF_URL_VAR).unwrap_or(defaults.trf_base_url),
      shell: non_empty_var(SHELL_VAR).unwrap_or(defaults.shell),
      root_base: non_empty_var(ROOT_BASE_VAR)
        .map(PathBuf::from)
        .unwrap_or(defaults.root_base),
    }
  }

  /// Full URL of the helper executable.
  pub fn trf_url(&self, name: &str) -> String {
    if self.trf_base_url.ends_with('/') {
      format!("{}{}", self.trf_base_url, name)
    } else {
      format!("{}/{}", self.trf_base_url, name)
    }
  }
}

fn non_empty_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.is_empty())
}
