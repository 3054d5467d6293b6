use std::fmt;

/// Pipeline stages, in the order a full run enters them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  Init,
  Fetch,
  FrameworkCompile,
  ExpandSource,
  ResolveToolchain,
  Build,
  Archive,
  Cleanup,
  Done,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Init => "init",
      Stage::Fetch => "fetch",
      Stage::FrameworkCompile => "framework-compile",
      Stage::ExpandSource => "expand-source",
      Stage::ResolveToolchain => "resolve-toolchain",
      Stage::Build => "build",
      Stage::Archive => "archive",
      Stage::Cleanup => "cleanup",
      Stage::Done => "done",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
