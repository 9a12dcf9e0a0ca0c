//! Platform library bundles.
//!
//! Every library tag carries a `lib/` directory with one bundle per platform,
//! e.g. `linux_centos7_x86_64`, `darwin-10.9-x86_64` or `win64_vc15`. The
//! bundle name says which OS, processor and toolchain it targets; the files
//! under its `python/lib` say which Python versions it ships.

use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::platform::bitness::Bitness;
use crate::platform::os::OsFamily;
use crate::platform::python::RuntimeVersion;
use crate::remote::{RemoteError, SvnEntry, SvnRemote, url_join};
use crate::version::{ComparableVersion, normalize};

static PYTHON_LIB: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\D*(\d)\.?(\d)").expect("python library pattern is valid"));

/// Parsed metadata of one platform bundle.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformDescriptor {
  /// Bundle directory name.
  pub name: String,
  /// Bundle URL in the library repository.
  pub url: String,
  pub os_family: OsFamily,
  /// Minimum Darwin version, e.g. `10.9` in `darwin-10.9-x86_64`.
  pub darwin_version: Option<ComparableVersion>,
  pub processor: Option<String>,
  /// Set for Windows bundles only.
  pub bitness: Option<Bitness>,
  /// Compiler marker such as `vc14`, Windows only.
  pub toolchain: Option<String>,
  #[serde(skip)]
  runtimes: OnceLock<Vec<RuntimeVersion>>,
}

impl PlatformDescriptor {
  /// Parse a bundle name. Never fails: names that identify no known OS yield
  /// [`OsFamily::Unknown`].
  pub fn parse(name: &str, url: impl Into<String>) -> Self {
    let lower = name.to_ascii_lowercase();
    let mut descriptor = Self {
      name: name.to_string(),
      url: url.into(),
      os_family: OsFamily::Unknown,
      darwin_version: None,
      processor: None,
      bitness: None,
      toolchain: None,
      runtimes: OnceLock::new(),
    };

    if lower.starts_with("android") {
      descriptor.os_family = OsFamily::Android;
    } else if lower.starts_with("darwin") {
      descriptor.os_family = OsFamily::Darwin;

      let tokens: Vec<&str> = name.split(['.', '-']).collect();
      if tokens.len() >= 4 {
        descriptor.darwin_version = Some(normalize(&tokens[1..tokens.len() - 1].join(".")));
        descriptor.processor = tokens.last().map(|p| p.to_string());
      }
    } else if lower.starts_with("linux") {
      descriptor.os_family = OsFamily::Linux;
    } else if lower.starts_with("win") {
      descriptor.os_family = OsFamily::Windows;
      descriptor.bitness = Some(if lower.contains("64") { Bitness::X64 } else { Bitness::X32 });

      if lower.contains("vc") {
        let suffix = lower.rsplit("vc").next().unwrap_or_default();
        descriptor.toolchain = Some(format!("vc{}", suffix));
      }
    }

    descriptor
  }

  /// Whether this bundle can serve `os` and `bitness`. An unknown OS family
  /// or unset bitness constrains nothing.
  pub fn accepts(&self, os: OsFamily, bitness: Bitness) -> bool {
    let os_ok = self.os_family == OsFamily::Unknown || self.os_family == os;
    let bitness_ok = self.bitness.is_none_or(|b| b == bitness);
    os_ok && bitness_ok
  }

  /// Numeric part of the toolchain marker (`vc15` -> 15), used to prefer
  /// newer compilers.
  pub fn toolchain_rank(&self) -> Option<u32> {
    let digits: String = self
      .toolchain
      .as_deref()?
      .trim_start_matches("vc")
      .chars()
      .take_while(|c| c.is_ascii_digit())
      .collect();
    digits.parse().ok()
  }

  /// Python versions this bundle ships libraries for.
  ///
  /// Lists `python/lib` below the bundle once; later calls return the cached
  /// result. A bundle without that directory supports nothing. Other remote
  /// failures are returned and not cached, so a later call tries again.
  pub fn supported_runtime_versions(&self, svn: &dyn SvnRemote) -> Result<&[RuntimeVersion], RemoteError> {
    if let Some(cached) = self.runtimes.get() {
      return Ok(cached);
    }

    let listing_url = url_join(&self.url, "python/lib");
    let versions = match svn.list(&listing_url) {
      Ok(entries) => runtime_versions(&entries),
      Err(RemoteError::PathNotFound { .. }) => Vec::new(),
      Err(e) => return Err(e),
    };

    debug!(bundle = %self.name, ?versions, "listed python versions");

    // A concurrent caller may have filled the cell first; both computed the
    // same listing.
    Ok(self.runtimes.get_or_init(|| versions))
  }
}

/// Extract `(major, minor)` from every file named like `python38` or
/// `python3.8`.
fn runtime_versions(entries: &[SvnEntry]) -> Vec<RuntimeVersion> {
  let mut versions: Vec<RuntimeVersion> = entries
    .iter()
    .filter(|entry| !entry.is_dir())
    .filter_map(|entry| {
      let caps = PYTHON_LIB.captures(&entry.name)?;
      Some(RuntimeVersion::new(caps[1].parse().ok()?, caps[2].parse().ok()?))
    })
    .collect();
  versions.sort();
  versions.dedup();
  versions
}
