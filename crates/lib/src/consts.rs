//! Fixed names, endpoints and exit codes shared across the pipeline.

/// Exit code for a missing or malformed required argument.
pub const EC_MISSING_ARG: u8 = 10;
/// Exit code reserved for the legacy CMT build failure path.
pub const EC_CMT_FAILED: u8 = 20;
/// Exit code when the source sandbox cannot be fetched or expanded.
pub const EC_NO_TARBALL: u8 = 30;
/// Exit code when the requested ROOT version is not available on this node.
pub const EC_NO_ROOT: u8 = 40;

pub const DEFAULT_SOURCE_URL: &str = "https://gridui01.usatlas.bnl.gov:25443";

pub const TRF_NAME: &str = "buildJob-00-00-03";
pub const DEFAULT_TRF_BASE_URL: &str = "http://pandaserver.cern.ch:25080/trf/user/";

/// Platform tag used for the shared ROOT distribution when `--cmtConfig` is unset.
pub const DEFAULT_CMT_CONFIG: &str = "i686-slc5-gcc43-opt";
pub const DEFAULT_ROOT_BASE: &str = "/cvmfs/atlas.cern.ch/repo/ATLASLocalRootBase";

pub const WORK_DIR_NAME: &str = "workDir";
pub const ROOT_BIN_DIR_NAME: &str = "pandaRootBin";
pub const CVMFS_SETUP_FILE: &str = "pandaUseCvmfSetup.sh";
pub const ROOT_TARBALL_PREFIX: &str = "root_v";
pub const ROOTCORE_WORK_DIR_NAME: &str = "__panda_rootCoreWorkDir";

pub const CMT_REQUIREMENTS: &str = "use AtlasPolicy AtlasPolicy-*\n";

#[cfg(not(windows))]
pub const DEFAULT_SHELL: &str = "/bin/bash";
#[cfg(windows)]
pub const DEFAULT_SHELL: &str = "bash.exe";

/// Exit code for local failures outside the fixed set (workspace I/O, spawning the
/// shell, writing the archive).
pub const EC_INTERNAL: u8 = 1;
