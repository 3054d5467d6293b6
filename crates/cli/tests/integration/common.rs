//! Shared test helpers for CLI integration tests.

use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// Isolated worker node.
///
/// Each test gets a job directory, a stand-in shared ROOT distribution, and a mock
/// HTTP server acting as both the sandbox cache and the helper download site.
pub struct TestEnv {
  pub temp: TempDir,
  pub server: mockito::ServerGuard,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("job")).unwrap();
    Self {
      temp,
      server: mockito::Server::new(),
    }
  }

  /// Directory the binary is started in.
  pub fn job_dir(&self) -> PathBuf {
    let p = self.temp.path().join("job");
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn root_base(&self) -> PathBuf {
    self.temp.path().join("alrb")
  }

  /// Serve `files` as a gzip tar at `/cache/{name}`.
  pub fn serve_sandbox(&mut self, name: &str, files: &[(&str, &str)]) -> mockito::Mock {
    self
      .server
      .mock("GET", format!("/cache/{}", name).as_str())
      .with_status(200)
      .with_body(tar_gz(files))
      .create()
  }

  /// Lay out a shared ROOT distribution that only knows `available`.
  pub fn install_root(&self, available: &str) {
    let base = self.root_base();
    write_script(&base.join("user").join("atlasLocalSetup.sh"), "true");
    write_script(&base.join("bin").join("root.exe"), "exit 0");
    write_script(
      &base.join("packageSetups").join("atlasLocalROOTSetup.sh"),
      &format!(
        "if [ \"$1\" = \"--rootVersion={}\" ]; then export PATH={}:$PATH; else false; fi",
        available,
        base.join("bin").display()
      ),
    );
  }

  /// A `buildgen` command started in the job directory.
  ///
  /// Sets environment variables for isolated testing:
  /// - `BUILDGEN_SHELL`: bash, so `source` works in setup fragments
  /// - `ATLAS_LOCAL_ROOT_BASE`: the stand-in distribution
  /// - `BUILDGEN_TRF_URL`: the mock server
  pub fn buildgen_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("buildgen");
    cmd.current_dir(self.job_dir());
    cmd.env("BUILDGEN_SHELL", "/bin/bash");
    cmd.env("ATLAS_LOCAL_ROOT_BASE", self.root_base());
    cmd.env("BUILDGEN_TRF_URL", format!("{}/trf/", self.server.url()));
    cmd.arg("--sourceURL").arg(self.server.url());
    cmd
  }
}

pub fn write_script(path: &Path, body: &str) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
  let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
  for (name, content) in files {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, content.as_bytes()).unwrap();
  }
  builder.into_inner().unwrap().finish().unwrap()
}

/// Entry names of a gzip tar, directories without their trailing slash.
pub fn archive_names(path: &Path) -> Vec<String> {
  let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
  archive
    .entries()
    .unwrap()
    .map(|e| e.unwrap().path().unwrap().to_string_lossy().trim_end_matches('/').to_string())
    .collect()
}
