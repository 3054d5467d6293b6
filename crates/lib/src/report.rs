//! Operator-facing progress markers.
//!
//! Grid operators correlate job logs with scheduler logs by the timestamped
//! `--- stage ---` markers, so these go to stdout unconditionally, independent of the
//! tracing filter.

use std::time::SystemTime;

use tracing::info;

/// Print `--- {label} ---` followed by the current UTC time.
pub fn marker(label: &str) {
  let now = humantime::format_rfc3339_seconds(SystemTime::now());
  println!("--- {} ---", label);
  println!("{}", now);
  info!(stage = label, "marker");
}

/// Print captured command output, if any.
pub fn output(captured: Option<&str>) {
  if let Some(text) = captured.map(str::trim_end).filter(|t| !t.is_empty()) {
    println!("{}", text);
  }
}
