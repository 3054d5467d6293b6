//! Test utilities for buildgen-lib.
//!
//! Helpers that build sandboxes and stand-in toolchain installations on disk.

use std::fs::{self, File};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Write a gzip tar at `path` containing the given `(name, content)` files.
///
/// Entries get mtime 0 and mode 0644.
pub fn write_tar_gz(path: &Path, files: &[(&str, &str)]) {
  let file = File::create(path).unwrap();
  let encoder = GzEncoder::new(file, Compression::default());
  let mut builder = tar::Builder::new(encoder);

  for (name, content) in files {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();
    builder.append_data(&mut header, name, content.as_bytes()).unwrap();
  }

  builder.into_inner().unwrap().finish().unwrap();
}

/// Write an executable shell script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
  use std::os::unix::fs::PermissionsExt;

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Lay out a stand-in shared ROOT distribution under `base`.
///
/// The ROOT setup script accepts only `--rootVersion={available}` and puts a
/// `root.exe` stub on `PATH`; any other version makes it fail, as the real script
/// does for versions missing on the node.
#[cfg(unix)]
pub fn fake_root_base(base: &Path, available: &str) {
  write_script(&base.join("user").join("atlasLocalSetup.sh"), "true");
  write_script(&base.join("bin").join("root.exe"), "exit 0");
  write_script(
    &base.join("packageSetups").join("atlasLocalROOTSetup.sh"),
    &format!(
      "if [ \"$1\" = \"--rootVersion={available}\" ]; then export PATH={bin}:$PATH; else false; fi",
      available = available,
      bin = base.join("bin").display(),
    ),
  );
}
