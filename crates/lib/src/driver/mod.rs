//! The orchestration driver.
//!
//! Sequences one invocation:
//!
//! `Init → Fetch → (FrameworkCompile | ExpandSource) → ResolveToolchain → [Build] →
//! Archive → Cleanup → Done`
//!
//! Argument, fetch and toolchain failures abort before the build. A failing build
//! does not: the workspace is still archived so partial output reaches the user, and
//! the build's status becomes the exit code. Cleanup always runs and never changes
//! the status.

mod stage;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::archive::create_archive;
use crate::config::Settings;
use crate::consts::{EC_INTERNAL, TRF_NAME};
use crate::error::BuildgenError;
use crate::execute::{self, BuildCommand, ExecOptions, execute_build, make_executable};
use crate::fetch::{fetch, url_file_name};
use crate::report;
use crate::request::{BuildRequest, FrameworkCompile, SourceMode};
use crate::toolchain::{self, Layout, Resolution};
use crate::workspace::{Workspace, remove_path};

pub use stage::Stage;

/// What a finished run reports back to the caller.
#[derive(Debug, Clone)]
pub struct RunReport {
  /// Process exit code.
  pub status: u8,
  /// Stages entered, in order.
  pub stages: Vec<Stage>,
  /// Where the archive was written, if archiving succeeded.
  pub archive: Option<PathBuf>,
  pub elapsed: Duration,
}

impl RunReport {
  pub fn reached(&self, stage: Stage) -> bool {
    self.stages.contains(&stage)
  }
}

/// Resources the cleanup stage is responsible for.
#[derive(Default)]
struct RunState {
  stages: Vec<Stage>,
  workspace: Option<Workspace>,
  root_tarball: Option<PathBuf>,
  archive: Option<PathBuf>,
}

impl RunState {
  fn enter(&mut self, stage: Stage) {
    debug!(stage = %stage, "entering stage");
    self.stages.push(stage);
  }
}

/// Run the whole pipeline for `request`, starting from `start_dir`.
pub async fn run(request: &BuildRequest, settings: &Settings, start_dir: &Path) -> RunReport {
  let started = Instant::now();
  let mut state = RunState::default();

  state.enter(Stage::Init);
  report::marker("start");
  println!("{}", request);
  println!("Running in {}", start_dir.display());

  let status = match pipeline(request, settings, start_dir, &mut state).await {
    Ok(status) => status,
    Err(err) => {
      let code = err.exit_code();
      error!(error = %err, exit_code = code, "run aborted");
      println!("ERROR : {}", err);
      report::marker(&format!("failed with {}", code));
      code
    }
  };

  state.enter(Stage::Cleanup);
  cleanup(&mut state, request.debug);

  state.enter(Stage::Done);
  report::marker(&format!("finished with {}", status));
  let elapsed = started.elapsed();
  println!("elapsed {}", humantime::format_duration(Duration::from_secs(elapsed.as_secs())));

  RunReport {
    status,
    stages: state.stages,
    archive: state.archive,
    elapsed,
  }
}

async fn pipeline(
  request: &BuildRequest,
  settings: &Settings,
  start_dir: &Path,
  state: &mut RunState,
) -> Result<u8, BuildgenError> {
  if let Some(version) = request.toolchain.version() {
    state.root_tarball = Some(start_dir.join(version.tarball_name()));
  }

  state.enter(Stage::Fetch);
  report::marker("wget");

  if let SourceMode::FrameworkPackages(FrameworkCompile::Helper { cmake }) = request.source_mode {
    state.enter(Stage::FrameworkCompile);
    let status = compile_framework_packages(request, settings, start_dir, cmake).await?;
    if status != 0 {
      return Err(BuildgenError::FrameworkCompile { status });
    }
    report::marker("Successfully compiled Athena packages");
    if cmake {
      // The helper wrote the final artifact itself.
      return Ok(status);
    }
  } else {
    fetch_sandbox(request, start_dir).await?;
  }

  let workspace = Workspace::prepare(start_dir, request.uses_framework_packages())?;
  println!("Goto workDir {}", workspace.root().display());
  state.workspace = Some(workspace.clone());

  let layout = Layout::new(start_dir, workspace.root());
  let resolution = toolchain::resolve(request, &settings.root_base, &layout);
  for dir in &resolution.directories {
    workspace.create_dir(dir)?;
  }
  expand_local_toolchain(&workspace, &resolution)?;

  if request.expands_sandbox() {
    state.enter(Stage::ExpandSource);
    report::marker("expand source");
    let count = workspace
      .expand(&request.source)
      .map_err(BuildgenError::SandboxExpand)?;
    println!("expanded {} entries", count);
  }

  state.enter(Stage::ResolveToolchain);
  apply_resolution(request, settings, &workspace, &resolution).await?;

  let mut status = 0;
  if request.runs_build() {
    state.enter(Stage::Build);
    status = match build(request, settings, &workspace, &resolution).await {
      Ok(status) => status,
      Err(err) => {
        error!(error = %err, "build could not run");
        println!("ERROR : {}", err);
        EC_INTERNAL
      }
    };
  }

  state.enter(Stage::Archive);
  report::marker("archive libraries");
  let output = workspace.resolve(&request.output);
  match create_archive(workspace.root(), &output) {
    Ok(_) => state.archive = Some(output),
    Err(err) => {
      error!(error = %err, "failed to archive workspace");
      println!("ERROR : {}", err);
      if status == 0 {
        status = EC_INTERNAL;
      }
    }
  }

  Ok(status)
}

/// Fetch the helper build driver and let it compile the Athena packages.
///
/// Returns the helper's normalized status.
async fn compile_framework_packages(
  request: &BuildRequest,
  settings: &Settings,
  start_dir: &Path,
  cmake: bool,
) -> Result<u8, BuildgenError> {
  let url = settings.trf_url(TRF_NAME);
  let helper = url_file_name(&url).unwrap_or_else(|| TRF_NAME.to_string());
  fetch(&url, &start_dir.join(&helper))
    .await
    .map_err(BuildgenError::HelperFetch)?;
  make_executable(&helper, start_dir);

  let library = if cmake {
    request.output.clone()
  } else {
    format!("tmplib.{}", Uuid::new_v4())
  };

  let mut command = format!(
    "./{} -i {} -o {} --debug --sourceURL {}",
    helper, request.source, library, request.source_url
  );
  if cmake {
    command.push_str(" --useCMake");
  }

  report::marker("Compile Athena packages");
  println!("{}", command);

  let options = ExecOptions {
    shell: &settings.shell,
    cwd: start_dir,
    attach: request.debug,
  };
  let outcome = execute::run_script(&command, options).await?;
  report::output(outcome.output.as_deref());

  if !cmake {
    remove_path(&start_dir.join(&library));
  }

  info!(status = outcome.normalized, "Athena package compilation finished");
  Ok(outcome.normalized)
}

async fn fetch_sandbox(request: &BuildRequest, start_dir: &Path) -> Result<(), BuildgenError> {
  let url = request.sandbox_url();
  println!("getting sandbox file from {}", url);

  let source = Path::new(&request.source);
  let dest = if source.is_absolute() {
    let name = url_file_name(&url).unwrap_or_else(|| request.source.replace('/', "_"));
    start_dir.join(name)
  } else {
    start_dir.join(source)
  };

  fetch(&url, &dest).await.map_err(BuildgenError::SandboxFetch)?;
  Ok(())
}

fn expand_local_toolchain(workspace: &Workspace, resolution: &Resolution) -> Result<(), BuildgenError> {
  let Some(tarball) = &resolution.local_tarball else {
    return Ok(());
  };

  let key = tarball
    .archive
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();

  if !tarball.archive.is_file() {
    return Err(BuildgenError::ToolchainUnavailable {
      key,
      reason: format!("{} not found", tarball.archive.display()),
    });
  }

  workspace
    .expand_into(&tarball.archive, &tarball.dest)
    .map_err(|e| BuildgenError::ToolchainUnavailable {
      key,
      reason: e.to_string(),
    })?;
  Ok(())
}

/// Write generated files, probe the shared distribution, and persist its setup.
async fn apply_resolution(
  request: &BuildRequest,
  settings: &Settings,
  workspace: &Workspace,
  resolution: &Resolution,
) -> Result<(), BuildgenError> {
  for file in &resolution.generated {
    println!("Making {}", file.path.display());
    workspace.write_file(&file.path, &file.content)?;
  }

  if let Some(probe) = &resolution.probe {
    report::marker("check ROOT availability");
    let script = probe.script();
    println!("{}", script);

    let options = ExecOptions {
      shell: &settings.shell,
      cwd: workspace.root(),
      attach: request.debug,
    };
    let outcome = execute::run_script(&script, options).await?;
    report::output(outcome.output.as_deref());

    if !outcome.is_success() {
      return Err(BuildgenError::ToolchainUnavailable {
        key: probe.key.clone(),
        reason: format!("setup probe exited with {}", outcome.normalized),
      });
    }
  }

  if let Some(persist) = &resolution.persist {
    workspace.write_file(&persist.path, &persist.content)?;
    info!(path = %persist.path.display(), "persisted ROOT setup");
  }

  match serde_json::to_string(&resolution.fragment) {
    Ok(json) => debug!(fragment = %json, "resolved environment"),
    Err(e) => debug!(error = %e, "could not serialize environment"),
  }
  Ok(())
}

/// Run the build step. Returns its normalized status.
async fn build(
  request: &BuildRequest,
  settings: &Settings,
  workspace: &Workspace,
  resolution: &Resolution,
) -> Result<u8, BuildgenError> {
  let command = BuildCommand {
    run_dir: BuildCommand::run_dir_in(workspace.root(), request.run_dir.as_deref()),
    package_build: request.package_build,
    user_command: request.command.clone(),
  };

  if !request.use_mana {
    report::marker("print env");
    let options = ExecOptions {
      shell: &settings.shell,
      cwd: workspace.root(),
      attach: false,
    };
    let outcome = execute::run(&resolution.fragment, "env", options).await?;
    report::output(outcome.output.as_deref());
  }

  report::marker("make");
  if let Some(script) = command.script() {
    println!("execute : {}", resolution.fragment.wrap(&script));
  }

  let Some(outcome) = execute_build(&resolution.fragment, &command, &settings.shell, request.debug).await? else {
    return Ok(0);
  };
  report::output(outcome.output.as_deref());

  if !outcome.is_success() {
    error!(status = outcome.normalized, "build failed");
    println!("ERROR : make failed");
  }
  Ok(outcome.normalized)
}

fn cleanup(state: &mut RunState, keep_workspace: bool) {
  if let Some(workspace) = state.workspace.take() {
    workspace.teardown(keep_workspace);
  }
  if let Some(tarball) = state.root_tarball.take() {
    remove_path(&tarball);
  }
}
