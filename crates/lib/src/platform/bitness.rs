use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Processor word width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitness {
  X32,
  X64,
}

impl Bitness {
  /// Word width of the running binary
  pub fn current() -> Self {
    if cfg!(target_pointer_width = "64") {
      Self::X64
    } else {
      Self::X32
    }
  }

  pub fn from_bits(bits: u32) -> Option<Self> {
    match bits {
      32 => Some(Self::X32),
      64 => Some(Self::X64),
      _ => None,
    }
  }

  pub fn bits(&self) -> u32 {
    match self {
      Self::X32 => 32,
      Self::X64 => 64,
    }
  }
}

impl fmt::Display for Bitness {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-bit", self.bits())
  }
}

impl FromStr for Bitness {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let digits = s.trim_end_matches("-bit").trim_end_matches("bit");
    digits
      .parse()
      .ok()
      .and_then(Self::from_bits)
      .ok_or_else(|| format!("invalid word width '{}' (expected 32 or 64)", s))
  }
}

impl Serialize for Bitness {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u32(self.bits())
  }
}
