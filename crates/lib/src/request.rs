//! One-call entry point: resolve a request and check the result out.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::checkout::checkout_matched;
use crate::error::Error;
use crate::platform::Platform;
use crate::platform::python::RuntimeVersion;
use crate::resolve::{BuildTarget, Resolver, Selection};

/// What the caller wants to build. Unset fields describe the host.
#[derive(Debug, Clone, Default)]
pub struct SourceRequest {
  /// Version in any spelling; `None` picks the newest compatible one.
  pub version: Option<String>,
  pub platform: Option<Platform>,
  pub runtime: Option<RuntimeVersion>,
}

impl SourceRequest {
  /// The build target, falling back to the host platform and the Python on
  /// `PATH`.
  pub fn target(&self) -> Result<BuildTarget, Error> {
    let platform = self.platform.unwrap_or_else(Platform::current);
    let runtime = self
      .runtime
      .or_else(RuntimeVersion::detect)
      .ok_or(Error::RuntimeUndetected)?;
    Ok(BuildTarget::new(platform, runtime))
  }
}

/// A selection and where it was checked out.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
  pub selection: Selection,
  pub path: PathBuf,
}

/// Resolve `request` and check the selected version out into
/// `{root}/{version}`.
pub fn fetch_sources(
  resolver: &Resolver,
  request: &SourceRequest,
  root: &Path,
  create_dirs: bool,
) -> Result<Resolution, Error> {
  let target = request.target()?;
  let selection = resolver.select(request.version.as_deref(), &target)?;

  let path = root.join(selection.version().to_string());
  checkout_matched(resolver, &selection.matched, &path, create_dirs)?;

  let path = dunce::canonicalize(&path).unwrap_or(path);
  info!(version = %selection.version(), path = %path.display(), "sources ready");

  Ok(Resolution { selection, path })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::bitness::Bitness;
  use crate::platform::os::OsFamily;
  use crate::testutil::{FakeGit, FakeSvn, resolver};
  use tempfile::TempDir;
  use tracing_test::traced_test;

  fn linux_request(version: Option<&str>) -> SourceRequest {
    SourceRequest {
      version: version.map(String::from),
      platform: Some(Platform::new(OsFamily::Linux, Bitness::X64)),
      runtime: Some(RuntimeVersion::new(3, 7)),
    }
  }

  fn fixture() -> (Resolver, std::sync::Arc<FakeGit>, std::sync::Arc<FakeSvn>) {
    resolver(
      FakeGit::with_tags(&["v2.80", "v2.81"]),
      FakeSvn::new()
        .library_tag("blender-2.80-release")
        .bundle("blender-2.80-release", "linux_centos7_x86_64", &["python3.7"])
        .library_tag("blender-2.81-release")
        .bundle("blender-2.81-release", "linux_centos7_x86_64", &["python3.8"]),
    )
  }

  #[test]
  fn explicit_fields_are_used_verbatim() {
    let target = linux_request(None).target().unwrap();

    assert_eq!(target.platform, Platform::new(OsFamily::Linux, Bitness::X64));
    assert_eq!(target.runtime, RuntimeVersion::new(3, 7));
  }

  #[test]
  #[traced_test]
  fn fetches_newest_compatible_version_under_root() {
    let (resolver, git, _) = fixture();
    let temp = TempDir::new().unwrap();

    let resolution = fetch_sources(&resolver, &linux_request(None), &temp.path().join("sources"), true).unwrap();

    assert_eq!(resolution.selection.version().to_string(), "2.80");
    assert!(resolution.path.ends_with("sources/2.80"));
    assert!(resolution.path.is_dir());
    assert_eq!(git.count("clone"), 1);
    assert!(logs_contain("sources ready"));
  }

  #[test]
  fn incompatible_version_checks_out_nothing() {
    let (resolver, git, _) = fixture();
    let temp = TempDir::new().unwrap();

    let err = fetch_sources(&resolver, &linux_request(Some("2.81")), temp.path(), false).unwrap_err();

    assert!(matches!(err, Error::IncompatiblePlatform { .. }));
    assert_eq!(git.count("clone"), 0);
    assert!(!temp.path().join("2.81").exists());
  }
}
