pub mod bitness;
pub mod os;
pub mod paths;
pub mod python;

use bitness::Bitness;
use os::OsFamily;
use serde::Serialize;
use std::fmt;

/// Host platform as seen by the compatibility matcher (e.g., "linux-64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Platform {
  pub os: OsFamily,
  pub bitness: Bitness,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(os: OsFamily, bitness: Bitness) -> Self {
    Self { os, bitness }
  }

  /// Detect the current platform at runtime
  pub fn current() -> Self {
    Self {
      os: OsFamily::current(),
      bitness: Bitness::current(),
    }
  }

  /// Returns the platform string (e.g., "windows-64")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.os, self.bitness.bits())
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
