use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Operating system families that Blender ships library bundles for.
///
/// `Unknown` is both the host fallback and the family of bundles whose name
/// does not identify an OS; such bundles apply to every OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
  Android,
  Darwin,
  Linux,
  Windows,
  Unknown,
}

impl OsFamily {
  /// Detect the current operating system at runtime
  pub fn current() -> Self {
    match std::env::consts::OS {
      "android" => Self::Android,
      "macos" => Self::Darwin,
      "linux" => Self::Linux,
      "windows" => Self::Windows,
      _ => Self::Unknown,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Android => "android",
      Self::Darwin => "darwin",
      Self::Linux => "linux",
      Self::Windows => "windows",
      Self::Unknown => "unknown",
    }
  }
}

impl fmt::Display for OsFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for OsFamily {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "android" => Ok(Self::Android),
      "darwin" | "macos" | "osx" => Ok(Self::Darwin),
      "linux" => Ok(Self::Linux),
      "windows" | "win" => Ok(Self::Windows),
      other => Err(format!(
        "unknown operating system '{}' (expected android, darwin, linux or windows)",
        other
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn macos_uses_darwin_identifier() {
    // Library bundles are named after Darwin, not macOS
    assert_eq!(OsFamily::Darwin.as_str(), "darwin");
    assert_eq!("macos".parse::<OsFamily>().unwrap(), OsFamily::Darwin);
  }

  #[test]
  fn parse_is_case_insensitive() {
    assert_eq!("Windows".parse::<OsFamily>().unwrap(), OsFamily::Windows);
    assert_eq!("LINUX".parse::<OsFamily>().unwrap(), OsFamily::Linux);
  }

  #[test]
  fn unknown_names_are_rejected() {
    assert!("freebsd".parse::<OsFamily>().is_err());
  }
}
