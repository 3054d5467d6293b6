//! The immutable description of one build invocation.
//!
//! Command-line flags arrive as [`RequestOptions`], a flat bag of optional values and
//! booleans. [`BuildRequest::from_options`] validates them once and folds the
//! booleans into closed variants so the driver never has to reason about flag
//! combinations.

use std::fmt;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use thiserror::Error;

use crate::consts::{DEFAULT_CMT_CONFIG, DEFAULT_SOURCE_URL};
use crate::toolchain::{RootVersion, ToolchainError};

#[derive(Debug, Error)]
pub enum RequestError {
  #[error("missing required argument: {0}")]
  MissingArgument(&'static str),

  #[error(transparent)]
  Toolchain(#[from] ToolchainError),
}

/// Raw options as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
  pub source: Option<String>,
  pub output: Option<String>,
  pub run_dir: Option<String>,
  /// Build command, still percent-encoded.
  pub bexec: Option<String>,
  pub debug: bool,
  pub source_url: Option<String>,
  pub use_athena_packages: bool,
  pub root_version: Option<String>,
  pub use_root_core: bool,
  pub cmt_config: Option<String>,
  pub no_compile: bool,
  pub use_mana: bool,
  pub mana_version: Option<String>,
  pub use_cmake: bool,
  pub use_local_root: bool,
}

/// How the user's sources reach the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
  /// Fetch the sandbox from the cache and expand it.
  Generic,
  /// Athena packages, compiled by the helper executable unless skipped.
  FrameworkPackages(FrameworkCompile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkCompile {
  /// `--noCompile`: the sandbox is expanded locally instead.
  Skipped,
  /// The helper compiles the packages. With `cmake` the helper produces the final
  /// artifact and the run ends there.
  Helper { cmake: bool },
}

/// Package-manager build chained in front of the user command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageBuild {
  None,
  RootCore { no_compile: bool },
}

/// Which ROOT installation the build runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolchainRequest {
  None,
  /// Network-mounted distribution addressed by `{version}-{platform}`.
  Shared { version: RootVersion, platform: String },
  /// `root_v{version}` tarball shipped next to the job.
  LocalTarball { version: RootVersion },
}

impl ToolchainRequest {
  pub fn version(&self) -> Option<&RootVersion> {
    match self {
      ToolchainRequest::None => None,
      ToolchainRequest::Shared { version, .. } | ToolchainRequest::LocalTarball { version } => Some(version),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildRequest {
  pub source: String,
  pub output: String,
  pub run_dir: Option<String>,
  pub command: Option<String>,
  pub source_mode: SourceMode,
  pub package_build: PackageBuild,
  pub toolchain: ToolchainRequest,
  pub use_mana: bool,
  pub mana_version: Option<String>,
  pub debug: bool,
  pub source_url: String,
}

impl BuildRequest {
  /// Validate raw options into a request.
  ///
  /// Fails before anything touches the network or the filesystem, so a missing
  /// `-i`/`-o` never leaves partial work behind.
  pub fn from_options(options: RequestOptions) -> Result<Self, RequestError> {
    let source = non_empty(options.source).ok_or(RequestError::MissingArgument("-i"))?;
    let output = non_empty(options.output).ok_or(RequestError::MissingArgument("-o"))?;

    let source_mode = if options.use_athena_packages {
      if options.no_compile {
        SourceMode::FrameworkPackages(FrameworkCompile::Skipped)
      } else {
        SourceMode::FrameworkPackages(FrameworkCompile::Helper {
          cmake: options.use_cmake,
        })
      }
    } else {
      SourceMode::Generic
    };

    let package_build = if options.use_root_core {
      PackageBuild::RootCore {
        no_compile: options.no_compile,
      }
    } else {
      PackageBuild::None
    };

    let toolchain = match non_empty(options.root_version) {
      None => ToolchainRequest::None,
      Some(raw) => {
        let version = RootVersion::normalize(&raw)?;
        if options.use_local_root {
          ToolchainRequest::LocalTarball { version }
        } else {
          let platform = non_empty(options.cmt_config).unwrap_or_else(|| DEFAULT_CMT_CONFIG.to_string());
          ToolchainRequest::Shared { version, platform }
        }
      }
    };

    let command = non_empty(options.bexec).map(|raw| percent_decode_str(&raw).decode_utf8_lossy().into_owned());

    Ok(Self {
      source,
      output,
      run_dir: non_empty(options.run_dir),
      command,
      source_mode,
      package_build,
      toolchain,
      use_mana: options.use_mana,
      mana_version: non_empty(options.mana_version),
      debug: options.debug,
      source_url: non_empty(options.source_url).unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
    })
  }

  /// Whether the sandbox is fetched and expanded by this process.
  pub fn expands_sandbox(&self) -> bool {
    matches!(
      self.source_mode,
      SourceMode::Generic | SourceMode::FrameworkPackages(FrameworkCompile::Skipped)
    )
  }

  /// Framework-package mode keeps an existing workspace and sets up CMT.
  pub fn uses_framework_packages(&self) -> bool {
    matches!(self.source_mode, SourceMode::FrameworkPackages(_))
  }

  /// Whether the Build stage has anything to run.
  pub fn runs_build(&self) -> bool {
    self.command.is_some() || matches!(self.package_build, PackageBuild::RootCore { .. })
  }

  /// Cache URL of the source sandbox.
  pub fn sandbox_url(&self) -> String {
    format!("{}/cache/{}", self.source_url.trim_end_matches('/'), self.source)
  }
}

impl fmt::Display for BuildRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "sources {}", self.source)?;
    writeln!(f, "libraries {}", self.output)?;
    writeln!(f, "debugFlag {}", self.debug)?;
    writeln!(f, "sourceURL {}", self.source_url)?;
    writeln!(f, "runDir {}", self.run_dir.as_deref().unwrap_or(""))?;
    writeln!(f, "bexec {}", self.command.as_deref().unwrap_or(""))?;
    writeln!(f, "sourceMode {:?}", self.source_mode)?;
    writeln!(f, "packageBuild {:?}", self.package_build)?;
    writeln!(f, "toolchain {:?}", self.toolchain)?;
    writeln!(f, "useMana {}", self.use_mana)?;
    write!(f, "manaVer {}", self.mana_version.as_deref().unwrap_or(""))
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}
