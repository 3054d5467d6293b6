//! Command-line surface.
//!
//! Flag spellings follow the grid pilot's conventions (`--useAthenaPackages`,
//! `--rootVer`, ...). `-i` and `-o` are optional at the clap level so a missing one
//! exits with the job manager's missing-argument code rather than clap's usage code.

use clap::{Args, Parser};

use buildgen_lib::RequestOptions;

/// Build a user sandbox on a grid worker node
#[derive(Parser, Debug)]
#[command(name = "buildgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
  /// Source sandbox name in the cache, or a path to a staged archive
  #[arg(short = 'i', value_name = "SOURCES")]
  pub source: Option<String>,

  /// Output archive path, absolute or relative to the starting directory
  #[arg(short = 'o', value_name = "LIBRARIES")]
  pub output: Option<String>,

  /// Subdirectory of the workspace to run the build in
  #[arg(short = 'r', value_name = "RUNDIR")]
  pub run_dir: Option<String>,

  /// Build command (percent-encoded)
  #[arg(long = "bexec", value_name = "COMMAND", allow_hyphen_values = true)]
  pub bexec: Option<String>,

  /// Run commands attached to the terminal and keep the workspace
  #[arg(long = "debug")]
  pub debug: bool,

  /// Base URL of the sandbox cache
  #[arg(long = "sourceURL", value_name = "URL")]
  pub source_url: Option<String>,

  /// Compile Athena packages with the build helper
  #[arg(long = "useAthenaPackages")]
  pub use_athena_packages: bool,

  /// ROOT version (X.Y or X.Y.Z)
  #[arg(long = "rootVer", value_name = "VERSION")]
  pub root_version: Option<String>,

  /// Build with RootCore
  #[arg(long = "useRootCore")]
  pub use_root_core: bool,

  /// Platform tag of the ROOT build
  #[arg(long = "cmtConfig", value_name = "TAG")]
  pub cmt_config: Option<String>,

  /// Skip compilation
  #[arg(long = "noCompile")]
  pub no_compile: bool,

  /// Use MANA
  #[arg(long = "useMana")]
  pub use_mana: bool,

  /// MANA version
  #[arg(long = "manaVer", value_name = "VERSION")]
  pub mana_version: Option<String>,

  /// Let the build helper run CMake and produce the output archive
  #[arg(long = "useCMake")]
  pub use_cmake: bool,

  /// Use the root_v<VERSION> tarball in the starting directory instead of the shared
  /// ROOT distribution
  #[arg(long = "useLocalRoot")]
  pub use_local_root: bool,

  /// Enable debug logging on stderr
  #[arg(short = 'v', long = "verbose")]
  pub verbose: bool,

  #[command(flatten)]
  pub legacy: LegacyArgs,
}

/// Pilot options that are accepted for compatibility and otherwise ignored.
#[derive(Args, Debug, Default)]
pub struct LegacyArgs {
  #[arg(short = 'u', hide = true)]
  user: Option<String>,
  #[arg(long = "pilotpars", hide = true)]
  pilotpars: bool,
  #[arg(long = "oldPrefix", hide = true)]
  old_prefix: Option<String>,
  #[arg(long = "newPrefix", hide = true)]
  new_prefix: Option<String>,
  #[arg(long = "directIn", hide = true)]
  direct_in: bool,
  #[arg(long = "lfcHost", hide = true)]
  lfc_host: Option<String>,
  #[arg(long = "envvarFile", hide = true)]
  envvar_file: Option<String>,
  #[arg(long = "useFileStager", hide = true)]
  use_file_stager: bool,
  #[arg(long = "accessmode", hide = true)]
  access_mode: Option<String>,
}

impl LegacyArgs {
  /// Names of the legacy options present on the command line.
  pub fn given(&self) -> Vec<&'static str> {
    [
      ("-u", self.user.is_some()),
      ("--pilotpars", self.pilotpars),
      ("--oldPrefix", self.old_prefix.is_some()),
      ("--newPrefix", self.new_prefix.is_some()),
      ("--directIn", self.direct_in),
      ("--lfcHost", self.lfc_host.is_some()),
      ("--envvarFile", self.envvar_file.is_some()),
      ("--useFileStager", self.use_file_stager),
      ("--accessmode", self.access_mode.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect()
  }
}

impl Cli {
  pub fn request_options(&self) -> RequestOptions {
    RequestOptions {
      source: self.source.clone(),
      output: self.output.clone(),
      run_dir: self.run_dir.clone(),
      bexec: self.bexec.clone(),
      debug: self.debug,
      source_url: self.source_url.clone(),
      use_athena_packages: self.use_athena_packages,
      root_version: self.root_version.clone(),
      use_root_core: self.use_root_core,
      cmt_config: self.cmt_config.clone(),
      no_compile: self.no_compile,
      use_mana: self.use_mana,
      mana_version: self.mana_version.clone(),
      use_cmake: self.use_cmake,
      use_local_root: self.use_local_root,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_pilot_style_flags() {
    let cli = Cli::try_parse_from([
      "buildgen",
      "-i",
      "job.tar.gz",
      "-o",
      "lib.tgz",
      "--rootVer",
      "5.34",
      "--cmtConfig",
      "x86_64-slc6-gcc47-opt",
      "--useRootCore",
      "--bexec",
      "make%20all",
    ])
    .unwrap();

    let options = cli.request_options();
    assert_eq!(options.source.as_deref(), Some("job.tar.gz"));
    assert_eq!(options.root_version.as_deref(), Some("5.34"));
    assert_eq!(options.cmt_config.as_deref(), Some("x86_64-slc6-gcc47-opt"));
    assert!(options.use_root_core);
    assert_eq!(options.bexec.as_deref(), Some("make%20all"));
  }

  #[test]
  fn required_paths_are_optional_for_clap() {
    let cli = Cli::try_parse_from(["buildgen"]).unwrap();
    assert!(cli.source.is_none());
    assert!(cli.output.is_none());
  }

  #[test]
  fn legacy_flags_are_accepted() {
    let cli = Cli::try_parse_from([
      "buildgen",
      "-i",
      "a",
      "-o",
      "b",
      "--pilotpars",
      "--lfcHost",
      "lfc.cern.ch",
      "-u",
      "user",
    ])
    .unwrap();
    assert_eq!(cli.legacy.given(), vec!["-u", "--pilotpars", "--lfcHost"]);
  }
}
