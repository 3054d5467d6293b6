//! End-to-end runs of the `buildgen` binary against a mock cache.

use predicates::prelude::*;

use super::common::{TestEnv, archive_names};

const PLATFORM: &str = "i686-slc5-gcc43-opt";

#[test]
fn builds_with_shared_root_and_archives() {
  let mut env = TestEnv::new();
  env.install_root(&format!("5.34.00-{}", PLATFORM));
  let sandbox = env.serve_sandbox("job.tar.gz", &[("build.sh", "#!/bin/sh\necho built > lib.so\n")]);

  env
    .buildgen_cmd()
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--rootVer", "5.34", "--bexec", "build.sh"])
    .assert()
    .code(0)
    .stdout(predicate::str::contains("--- check ROOT availability ---"))
    .stdout(predicate::str::contains("--- make ---"))
    .stdout(predicate::str::contains("--- finished with 0 ---"));

  sandbox.assert();
  let names = archive_names(&env.job_dir().join("lib.tgz"));
  assert!(names.contains(&"lib.so".to_string()), "archive: {:?}", names);
  assert!(!env.job_dir().join("workDir").exists());
}

#[test]
fn parameter_dump_is_printed() {
  let mut env = TestEnv::new();
  env.serve_sandbox("job.tar.gz", &[("a.txt", "a")]);

  env
    .buildgen_cmd()
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--bexec", "echo%20hi"])
    .assert()
    .code(0)
    .stdout(predicate::str::contains("sources job.tar.gz"))
    .stdout(predicate::str::contains("bexec echo hi"));
}

#[test]
fn build_failure_status_is_exit_code() {
  let mut env = TestEnv::new();
  env.serve_sandbox("job.tar.gz", &[("a.txt", "a")]);

  env
    .buildgen_cmd()
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--bexec", "exit%202"])
    .assert()
    .code(2)
    .stdout(predicate::str::contains("ERROR : make failed"));

  assert!(env.job_dir().join("lib.tgz").exists());
}

#[test]
fn missing_root_version_exits_40() {
  let mut env = TestEnv::new();
  env.install_root(&format!("5.34.00-{}", PLATFORM));
  env.serve_sandbox("job.tar.gz", &[("a.txt", "a")]);

  env
    .buildgen_cmd()
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--rootVer", "6.02", "--bexec", "true"])
    .assert()
    .code(40)
    .stdout(predicate::str::contains("--- make ---").not());

  assert!(!env.job_dir().join("lib.tgz").exists());
  assert!(!env.job_dir().join("workDir").exists());
}

#[test]
fn debug_keeps_workspace() {
  let mut env = TestEnv::new();
  env.serve_sandbox("job.tar.gz", &[("a.txt", "a")]);

  env
    .buildgen_cmd()
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--debug"])
    .assert()
    .code(0);

  assert!(env.job_dir().join("workDir").join("a.txt").exists());
}

#[test]
fn legacy_pilot_flags_do_not_change_the_run() {
  let mut env = TestEnv::new();
  env.serve_sandbox("job.tar.gz", &[("a.txt", "a")]);

  env
    .buildgen_cmd()
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--pilotpars", "--lfcHost", "lfc.example.org"])
    .assert()
    .code(0);

  assert_eq!(archive_names(&env.job_dir().join("lib.tgz")), vec!["a.txt"]);
}

#[test]
fn cmake_helper_skips_archive() {
  let mut env = TestEnv::new();
  env
    .server
    .mock("GET", "/trf/buildJob-00-00-03")
    .with_status(200)
    .with_body("#!/bin/sh\necho from-helper > \"$4\"\n")
    .create();

  env
    .buildgen_cmd()
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--useAthenaPackages", "--useCMake"])
    .assert()
    .code(0)
    .stdout(predicate::str::contains("--- Successfully compiled Athena packages ---"));

  let written = std::fs::read_to_string(env.job_dir().join("lib.tgz")).unwrap();
  assert_eq!(written.trim(), "from-helper");
  assert!(!env.job_dir().join("workDir").exists());
}

#[test]
fn environment_is_dumped_before_build() {
  let mut env = TestEnv::new();
  env.serve_sandbox("job.tar.gz", &[("a.txt", "a")]);

  env
    .buildgen_cmd()
    .env("BUILDGEN_MARKER", "dumped")
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--bexec", "true"])
    .assert()
    .code(0)
    .stdout(predicate::str::contains("--- print env ---"))
    .stdout(predicate::str::contains("BUILDGEN_MARKER=dumped"));
}

#[test]
fn mana_skips_environment_dump() {
  let mut env = TestEnv::new();
  env.serve_sandbox("job.tar.gz", &[("a.txt", "a")]);

  env
    .buildgen_cmd()
    .args(["-i", "job.tar.gz", "-o", "lib.tgz", "--bexec", "true", "--useMana"])
    .assert()
    .code(0)
    .stdout(predicate::str::contains("--- print env ---").not())
    .stdout(predicate::str::contains("--- make ---"));
}
