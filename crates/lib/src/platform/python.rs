//! Python runtime versions.
//!
//! The module being built links against one specific Python `major.minor`, so
//! the caller's interpreter version is part of every compatibility check.

use std::fmt;
use std::process::Command;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

static VERSION_OUTPUT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"Python (\d+)\.(\d+)").expect("version output pattern is valid"));

/// Interpreters probed by [`RuntimeVersion::detect`], in order.
const INTERPRETERS: &[&str] = &["python3", "python"];

/// A Python `major.minor` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RuntimeVersion {
  pub major: u32,
  pub minor: u32,
}

impl RuntimeVersion {
  pub fn new(major: u32, minor: u32) -> Self {
    Self { major, minor }
  }

  /// Ask the interpreter on `PATH` for its version.
  ///
  /// Returns `None` when no interpreter can be run or its output is not
  /// recognized.
  pub fn detect() -> Option<Self> {
    INTERPRETERS.iter().find_map(|program| {
      let output = Command::new(program).arg("--version").output().ok()?;
      if !output.status.success() {
        return None;
      }
      // Python 2 prints its version to stderr
      let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
      );
      let version = parse_version_output(&text);
      debug!(program, ?version, "probed python interpreter");
      version
    })
  }
}

fn parse_version_output(text: &str) -> Option<RuntimeVersion> {
  let caps = VERSION_OUTPUT.captures(text)?;
  Some(RuntimeVersion::new(caps[1].parse().ok()?, caps[2].parse().ok()?))
}

impl fmt::Display for RuntimeVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.major, self.minor)
  }
}

impl FromStr for RuntimeVersion {
  type Err = String;

  /// Accepts `3.8`, `3.8.10` and `38`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || format!("invalid python version '{}' (expected MAJOR.MINOR, e.g. 3.8)", s);

    let mut parts = s.trim().split('.');
    let first = parts.next().ok_or_else(invalid)?;
    match parts.next() {
      Some(minor) => Ok(Self::new(
        first.parse().map_err(|_| invalid())?,
        minor.parse().map_err(|_| invalid())?,
      )),
      None if first.len() >= 2 && first.chars().all(|c| c.is_ascii_digit()) => {
        let (major, minor) = first.split_at(1);
        Ok(Self::new(
          major.parse().map_err(|_| invalid())?,
          minor.parse().map_err(|_| invalid())?,
        ))
      }
      None => Err(invalid()),
    }
  }
}
