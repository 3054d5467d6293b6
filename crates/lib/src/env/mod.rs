//! Environment fragments.
//!
//! A fragment is the ordered list of shell-level environment mutations that must run
//! before a build command. It is built append-only by the toolchain resolver, passed
//! around as a plain value, and only turned into shell text when a command is about
//! to be executed (or persisted for a later job stage to replay).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single environment setup statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
  /// `export NAME=VALUE`. The value is emitted verbatim so it may reference other
  /// variables (`$ROOTSYS/bin:$PATH`).
  Export { name: String, value: String },
  /// `source SCRIPT ARGS...`
  Source { script: String, args: Vec<String> },
  /// `cd DIR`
  ChangeDir { dir: String },
  /// `cd -`, back to the directory before the last `ChangeDir`.
  ReturnDir,
  /// An arbitrary command run as part of the setup (`cmt config`, `root.exe -q`).
  Run { command: String },
}

impl Directive {
  pub fn export(name: impl Into<String>, value: impl Into<String>) -> Self {
    Directive::Export {
      name: name.into(),
      value: value.into(),
    }
  }

  pub fn source<I, S>(script: impl Into<String>, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Directive::Source {
      script: script.into(),
      args: args.into_iter().map(Into::into).collect(),
    }
  }

  pub fn change_dir(dir: impl Into<String>) -> Self {
    Directive::ChangeDir { dir: dir.into() }
  }

  pub fn run(command: impl Into<String>) -> Self {
    Directive::Run {
      command: command.into(),
    }
  }
}

impl fmt::Display for Directive {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Directive::Export { name, value } => write!(f, "export {}={}", name, value),
      Directive::Source { script, args } => {
        write!(f, "source {}", script)?;
        for arg in args {
          write!(f, " {}", arg)?;
        }
        Ok(())
      }
      Directive::ChangeDir { dir } => write!(f, "cd {}", dir),
      Directive::ReturnDir => write!(f, "cd -"),
      Directive::Run { command } => write!(f, "{}", command),
    }
  }
}

/// Ordered, append-only sequence of [`Directive`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentFragment {
  directives: Vec<Directive>,
}

impl EnvironmentFragment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, directive: Directive) {
    self.directives.push(directive);
  }

  /// Builder-style [`push`](Self::push).
  pub fn with(mut self, directive: Directive) -> Self {
    self.push(directive);
    self
  }

  /// Append every directive of `other`, keeping their order after ours.
  pub fn extend(&mut self, other: EnvironmentFragment) {
    self.directives.extend(other.directives);
  }

  pub fn directives(&self) -> &[Directive] {
    &self.directives
  }

  pub fn is_empty(&self) -> bool {
    self.directives.is_empty()
  }

  pub fn len(&self) -> usize {
    self.directives.len()
  }

  /// Render the fragment as a shell prefix. Every statement is terminated with `; `
  /// so a command can be appended directly.
  pub fn render(&self) -> String {
    self.directives.iter().map(|d| format!("{}; ", d)).collect()
  }

  /// The full script run for `command`: the whole fragment followed by the command.
  pub fn wrap(&self, command: &str) -> String {
    format!("{}{}", self.render(), command)
  }
}

impl FromIterator<Directive> for EnvironmentFragment {
  fn from_iter<T: IntoIterator<Item = Directive>>(iter: T) -> Self {
    Self {
      directives: iter.into_iter().collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_fragment_renders_nothing() {
    let fragment = EnvironmentFragment::new();
    assert!(fragment.is_empty());
    assert_eq!(fragment.render(), "");
    assert_eq!(fragment.wrap("make"), "make");
  }

  #[test]
  fn render_terminates_every_statement() {
    let fragment = EnvironmentFragment::new()
      .with(Directive::export("CMTPATH", "/work:$CMTPATH"))
      .with(Directive::change_dir("/work/x/cmt"))
      .with(Directive::run("cmt config"))
      .with(Directive::source("./setup.sh", Vec::<String>::new()))
      .with(Directive::ReturnDir);

    assert_eq!(
      fragment.render(),
      "export CMTPATH=/work:$CMTPATH; cd /work/x/cmt; cmt config; source ./setup.sh; cd -; "
    );
  }

  #[test]
  fn source_directive_keeps_arguments() {
    let directive = Directive::source("$BASE/setup.sh", ["--rootVersion=6.22.00-x", "--skipConfirm"]);
    assert_eq!(
      directive.to_string(),
      "source $BASE/setup.sh --rootVersion=6.22.00-x --skipConfirm"
    );
  }

  #[test]
  fn extend_preserves_order() {
    let mut first = EnvironmentFragment::new().with(Directive::export("A", "1"));
    let second = EnvironmentFragment::new().with(Directive::export("B", "$A"));
    first.extend(second);

    assert_eq!(first.len(), 2);
    assert_eq!(first.wrap("env"), "export A=1; export B=$A; env");
  }

  #[test]
  fn serializes_as_tagged_list() {
    let fragment: EnvironmentFragment = [Directive::export("ROOTSYS", "/r"), Directive::ReturnDir]
      .into_iter()
      .collect();
    let json = serde_json::to_string(&fragment).unwrap();
    assert_eq!(
      json,
      r#"[{"kind":"export","name":"ROOTSYS","value":"/r"},{"kind":"return_dir"}]"#
    );
  }
}
