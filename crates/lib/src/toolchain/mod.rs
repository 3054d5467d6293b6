//! Toolchain resolution.
//!
//! Turns the toolchain part of a [`BuildRequest`] into an [`EnvironmentFragment`]
//! plus the side effects the driver must carry out for it (files to generate, a
//! tarball to expand, a probe to run, a setup script to persist). Resolution itself
//! touches neither the filesystem nor the process environment.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::consts::{CMT_REQUIREMENTS, CVMFS_SETUP_FILE, ROOT_BIN_DIR_NAME, ROOT_TARBALL_PREFIX};
use crate::env::{Directive, EnvironmentFragment};
use crate::request::{BuildRequest, ToolchainRequest};

/// Command used to check that ROOT actually starts in the resolved environment.
pub const ROOT_PROBE_COMMAND: &str = "root.exe -q";

#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("invalid ROOT version '{0}': expected X.Y or X.Y.Z")]
  InvalidVersion(String),
}

/// A ROOT version in three-component dotted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RootVersion(String);

impl RootVersion {
  /// `5.34` becomes `5.34.00`; `5.34.02` is kept. Anything else is rejected.
  pub fn normalize(raw: &str) -> Result<Self, ToolchainError> {
    let raw = raw.trim();
    if raw.split('.').any(str::is_empty) {
      return Err(ToolchainError::InvalidVersion(raw.to_string()));
    }
    match raw.matches('.').count() {
      1 => Ok(Self(format!("{}.00", raw))),
      2 => Ok(Self(raw.to_string())),
      _ => Err(ToolchainError::InvalidVersion(raw.to_string())),
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Key of this version in the shared distribution.
  pub fn shared_key(&self, platform: &str) -> String {
    format!("{}-{}", self.0, platform)
  }

  /// File name of the locally shipped binary tarball.
  pub fn tarball_name(&self) -> String {
    format!("{}{}", ROOT_TARBALL_PREFIX, self.0)
  }
}

impl fmt::Display for RootVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Directories the resolver refers to.
#[derive(Debug, Clone)]
pub struct Layout {
  /// Directory the invocation started in.
  pub start_dir: PathBuf,
  /// Workspace root.
  pub workspace: PathBuf,
  /// Generated CMT project directory (`{workspace}/{uuid}/cmt`).
  pub cmt_dir: PathBuf,
}

impl Layout {
  pub fn new(start_dir: &Path, workspace: &Path) -> Self {
    let cmt_dir = workspace.join(Uuid::new_v4().to_string()).join("cmt");
    Self {
      start_dir: start_dir.to_path_buf(),
      workspace: workspace.to_path_buf(),
      cmt_dir,
    }
  }

  pub fn root_bin_dir(&self) -> PathBuf {
    self.workspace.join(ROOT_BIN_DIR_NAME)
  }
}

/// A file the driver writes on behalf of the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
  pub path: PathBuf,
  pub content: String,
}

/// Availability check for the shared distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
  /// The shared setup name (`{version}-{platform}`), for diagnostics.
  pub key: String,
  pub setup: EnvironmentFragment,
  pub command: String,
}

impl Probe {
  pub fn script(&self) -> String {
    self.setup.wrap(&self.command)
  }
}

/// A local ROOT tarball to unpack before building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTarball {
  pub archive: PathBuf,
  pub dest: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
  /// Fragment every build command runs under.
  pub fragment: EnvironmentFragment,
  /// Files that must exist before the fragment runs.
  pub generated: Vec<GeneratedFile>,
  /// Directories that must exist before the fragment runs.
  pub directories: Vec<PathBuf>,
  pub probe: Option<Probe>,
  /// Shared setup persisted for later job stages.
  pub persist: Option<GeneratedFile>,
  pub local_tarball: Option<LocalTarball>,
}

/// Resolve the environment for `request`.
///
/// Package-manager directives come first, toolchain directives second: the ROOT
/// setup may rely on variables CMT exports.
pub fn resolve(request: &BuildRequest, root_base: &Path, layout: &Layout) -> Resolution {
  let mut resolution = Resolution::default();

  if request.uses_framework_packages() {
    resolve_cmt(layout, &mut resolution);
  }

  match &request.toolchain {
    ToolchainRequest::None => {}
    ToolchainRequest::Shared { version, platform } => {
      resolve_shared(version, platform, root_base, layout, &mut resolution);
    }
    ToolchainRequest::LocalTarball { version } => {
      resolve_local(version, layout, &mut resolution);
    }
  }

  resolution
}

fn resolve_cmt(layout: &Layout, resolution: &mut Resolution) {
  let cmt_dir = layout.cmt_dir.display().to_string();

  resolution.directories.push(layout.cmt_dir.clone());
  resolution.generated.push(GeneratedFile {
    path: layout.cmt_dir.join("requirements"),
    content: CMT_REQUIREMENTS.to_string(),
  });

  resolution.fragment.extend(
    [
      Directive::export("CMTPATH", format!("{}:$CMTPATH", layout.workspace.display())),
      Directive::change_dir(cmt_dir),
      Directive::run("cmt config"),
      Directive::source("./setup.sh", Vec::<String>::new()),
      Directive::ReturnDir,
    ]
    .into_iter()
    .collect(),
  );
}

/// Setup directives for the shared distribution, without the probe command.
pub fn shared_setup(root_base: &Path, key: &str) -> EnvironmentFragment {
  EnvironmentFragment::new()
    .with(Directive::export("ATLAS_LOCAL_ROOT_BASE", root_base.display().to_string()))
    .with(Directive::source(
      "$ATLAS_LOCAL_ROOT_BASE/user/atlasLocalSetup.sh",
      ["--quiet"],
    ))
    .with(Directive::source(
      "$ATLAS_LOCAL_ROOT_BASE/packageSetups/atlasLocalROOTSetup.sh",
      [format!("--rootVersion={}", key), "--skipConfirm".to_string()],
    ))
}

fn resolve_shared(version: &RootVersion, platform: &str, root_base: &Path, layout: &Layout, resolution: &mut Resolution) {
  let key = version.shared_key(platform);
  let setup = shared_setup(root_base, &key);
  let root_bin_dir = layout.root_bin_dir();

  resolution.directories.push(root_bin_dir.clone());
  resolution.persist = Some(GeneratedFile {
    path: root_bin_dir.join(CVMFS_SETUP_FILE),
    content: setup.render(),
  });
  resolution.probe = Some(Probe {
    key,
    setup: setup.clone(),
    command: ROOT_PROBE_COMMAND.to_string(),
  });

  resolution.fragment.extend(setup);
  resolution.fragment.push(Directive::run(ROOT_PROBE_COMMAND));
}

fn resolve_local(version: &RootVersion, layout: &Layout, resolution: &mut Resolution) {
  let root_bin_dir = layout.root_bin_dir();

  resolution.directories.push(root_bin_dir.clone());
  resolution.local_tarball = Some(LocalTarball {
    archive: layout.start_dir.join(version.tarball_name()),
    dest: root_bin_dir.clone(),
  });

  resolution.fragment.extend(
    [
      Directive::export("ROOTSYS", root_bin_dir.join("root").display().to_string()),
      Directive::export("PATH", "$ROOTSYS/bin:$PATH"),
      Directive::export("LD_LIBRARY_PATH", "$ROOTSYS/lib:$LD_LIBRARY_PATH"),
      Directive::run(ROOT_PROBE_COMMAND),
    ]
    .into_iter()
    .collect(),
  );
}
