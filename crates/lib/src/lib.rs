//! buildgen-lib: environment resolution and build execution for grid build jobs.
//!
//! One invocation fetches a user sandbox, provisions a ROOT toolchain (and optionally
//! a CMT project), runs a single build command inside that environment, and packs
//! the workspace into an output archive:
//! - `request`: validated, immutable description of the invocation
//! - `toolchain`: resolves the toolchain request into an environment fragment
//! - `env`: the typed fragment itself
//! - `execute`: runs commands under a fragment and normalizes their status
//! - `driver`: sequences the stages and decides the exit code

pub mod archive;
pub mod config;
pub mod consts;
pub mod driver;
pub mod env;
pub mod error;
pub mod execute;
pub mod fetch;
pub mod report;
pub mod request;
pub mod toolchain;
#[cfg(test)]
mod util;
pub mod workspace;

pub use config::Settings;
pub use driver::{RunReport, Stage, run};
pub use error::BuildgenError;
pub use request::{BuildRequest, RequestError, RequestOptions};
