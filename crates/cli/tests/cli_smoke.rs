//! CLI smoke tests for buildgen.
//!
//! Argument handling only; nothing here reaches the network.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn buildgen_cmd(dir: &TempDir) -> Command {
  let mut cmd: Command = cargo_bin_cmd!("buildgen");
  cmd.current_dir(dir.path());
  cmd
}

#[test]
fn help_flag_works() {
  let temp = TempDir::new().unwrap();
  buildgen_cmd(&temp)
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"))
    .stdout(predicate::str::contains("--useAthenaPackages"));
}

#[test]
fn legacy_flags_are_hidden_from_help() {
  let temp = TempDir::new().unwrap();
  buildgen_cmd(&temp)
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("--lfcHost").not());
}

#[test]
fn missing_source_exits_10() {
  let temp = TempDir::new().unwrap();
  buildgen_cmd(&temp)
    .args(["-o", "lib.tgz"])
    .assert()
    .code(10)
    .stdout(predicate::str::contains("--- start ---"))
    .stdout(predicate::str::contains("--- failed with 10 ---"))
    .stderr(predicate::str::contains("-i"));
}

#[test]
fn source_flag_without_value_exits_10() {
  let temp = TempDir::new().unwrap();
  buildgen_cmd(&temp)
    .args(["-o", "lib.tgz", "-i"])
    .assert()
    .code(10)
    .stdout(predicate::str::contains("--- failed with 10 ---"));
  assert!(!temp.path().join("workDir").exists());
}

#[test]
fn missing_output_exits_10() {
  let temp = TempDir::new().unwrap();
  buildgen_cmd(&temp).args(["-i", "job.tar.gz"]).assert().code(10);
  assert!(!temp.path().join("workDir").exists());
}

#[test]
fn empty_source_exits_10() {
  let temp = TempDir::new().unwrap();
  buildgen_cmd(&temp).args(["-i", "", "-o", "lib.tgz"]).assert().code(10);
}

#[test]
fn malformed_root_version_exits_10() {
  let temp = TempDir::new().unwrap();
  buildgen_cmd(&temp)
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--rootVer", "5"])
    .assert()
    .code(10);
}

#[test]
fn unknown_flag_is_a_usage_error() {
  let temp = TempDir::new().unwrap();
  buildgen_cmd(&temp).arg("--no-such-flag").assert().failure();
}

#[test]
fn unreachable_cache_exits_30() {
  let temp = TempDir::new().unwrap();
  buildgen_cmd(&temp)
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--sourceURL", "http://127.0.0.1:9"])
    .assert()
    .code(30)
    .stdout(predicate::str::contains("--- wget ---"))
    .stdout(predicate::str::contains("--- finished with 30 ---"));
}
