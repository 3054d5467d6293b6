use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use buildgen_lib::consts::{EC_INTERNAL, EC_MISSING_ARG};
use buildgen_lib::report;
use buildgen_lib::{BuildRequest, BuildgenError, Settings};

mod args;
mod output;

use args::Cli;

fn main() -> ExitCode {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    // `-i` or `-o` given without a value counts as a missing argument.
    Err(err) if err.kind() == ErrorKind::InvalidValue => {
      return ExitCode::from(argument_error(&err.to_string()));
    }
    Err(err) => err.exit(),
  };

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(&cli) {
    Ok(status) => ExitCode::from(status),
    Err(err) => {
      output::print_error(&format!("{:#}", err));
      ExitCode::from(EC_INTERNAL)
    }
  }
}

/// Validate the request, run the pipeline, and return the exit code.
fn run(cli: &Cli) -> Result<u8> {
  let ignored = cli.legacy.given();
  if !ignored.is_empty() {
    debug!(options = ?ignored, "ignoring legacy pilot options");
  }

  let request = match BuildRequest::from_options(cli.request_options()) {
    Ok(request) => request,
    Err(err) => return Ok(argument_error(&BuildgenError::from(err).to_string())),
  };

  let start_dir = std::env::current_dir().context("Failed to determine the starting directory")?;
  let settings = Settings::from_env();
  debug!(?settings, "node settings");

  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;
  let report = rt.block_on(buildgen_lib::run(&request, &settings, &start_dir));

  let elapsed = output::format_duration(report.elapsed);
  match (report.status, &report.archive) {
    (0, Some(archive)) => output::print_success(&format!("{} written in {}", archive.display(), elapsed)),
    (0, None) => output::print_success(&format!("done in {}", elapsed)),
    (status, _) => output::print_warning(&format!("exiting with {} after {}", status, elapsed)),
  }

  Ok(report.status)
}

/// Report an argument error the way the pipeline reports fatal errors.
fn argument_error(message: &str) -> u8 {
  report::marker("start");
  println!("ERROR : {}", message.trim_end());
  report::marker(&format!("failed with {}", EC_MISSING_ARG));
  output::print_error(message.trim_end());
  EC_MISSING_ARG
}
