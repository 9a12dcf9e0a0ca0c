//! Materializing a version on disk.
//!
//! A checkout is the code tree at `{target}` plus, when the version has a
//! library tag, its platform libraries at `{target}/lib`. Running a checkout
//! again over an existing one updates it in place.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Error;
use crate::resolve::{MatchedVersion, Resolver};
use crate::sources::{Origin, SourceRepository};
use crate::version::{ComparableVersion, normalize};

/// Outcome of [`checkout_all`].
#[derive(Debug, Default)]
pub struct CheckoutReport {
  /// Versions checked out, with their directories.
  pub succeeded: Vec<(ComparableVersion, PathBuf)>,
  /// Versions with a library tag but no code tag.
  pub skipped: Vec<ComparableVersion>,
  pub failed: Vec<CheckoutFailure>,
}

impl CheckoutReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }
}

#[derive(Debug)]
pub struct CheckoutFailure {
  pub version: ComparableVersion,
  pub error: Error,
}

/// Check out `version` (any spelling) into `target`.
///
/// `target` is created when missing; with `create_dirs` its missing parents
/// are created too, otherwise a missing parent fails with
/// [`Error::CreateDir`].
pub fn checkout_version(
  resolver: &Resolver,
  target: &Path,
  version: &str,
  create_dirs: bool,
) -> Result<MatchedVersion, Error> {
  let index = resolver.matched_versions()?;
  let matched = index.get(&normalize(version)).ok_or_else(|| Error::VersionNotFound {
    version: version.to_string(),
  })?;

  checkout_matched(resolver, matched, target, create_dirs)?;
  Ok(matched.clone())
}

/// Check out an already matched version into `target`.
///
/// The code side is required. The library side is checked out after it, and
/// only when the version has a library tag.
pub fn checkout_matched(
  resolver: &Resolver,
  matched: &MatchedVersion,
  target: &Path,
  create_dirs: bool,
) -> Result<(), Error> {
  let Some(code_tag) = matched.primary_code() else {
    return Err(Error::Unbuildable {
      version: matched.version.to_string(),
      missing: Origin::Code,
    });
  };

  create_target(target, create_dirs)?;

  info!(version = %matched.version, path = %target.display(), "checking out sources");
  resolver.code().checkout(Some(&code_tag.raw), target)?;
  match matched.primary_library() {
    Some(library_tag) => resolver.library().checkout(Some(&library_tag.raw), target)?,
    None => debug!(version = %matched.version, "no library tag, skipping libraries"),
  }

  Ok(())
}

/// Check out every version with a code tag into `{target}/{version}`.
///
/// A failing version is recorded in the report and does not stop the others.
/// Only failing to list the repositories or to create `target` is an error.
pub fn checkout_all(resolver: &Resolver, target: &Path, create_dirs: bool) -> Result<CheckoutReport, Error> {
  let index = resolver.matched_versions()?;
  create_target(target, create_dirs)?;

  let mut report = CheckoutReport::default();
  for matched in index.values() {
    if matched.primary_code().is_none() {
      report.skipped.push(matched.version.clone());
      continue;
    }

    let dir = target.join(matched.version.to_string());
    match checkout_matched(resolver, matched, &dir, false) {
      Ok(()) => report.succeeded.push((matched.version.clone(), dir)),
      Err(error) => {
        warn!(version = %matched.version, error = %error, "checkout failed, continuing");
        report.failed.push(CheckoutFailure {
          version: matched.version.clone(),
          error,
        });
      }
    }
  }

  info!(
    succeeded = report.succeeded.len(),
    skipped = report.skipped.len(),
    failed = report.failed.len(),
    "checked out all versions"
  );
  Ok(report)
}

/// Create the checkout directory. An existing directory is reused.
fn create_target(path: &Path, create_dirs: bool) -> Result<(), Error> {
  if path.is_dir() {
    return Ok(());
  }

  let result = if create_dirs {
    fs::create_dir_all(path)
  } else {
    fs::create_dir(path)
  };
  result.map_err(|source| Error::CreateDir {
    path: path.to_path_buf(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::{FakeGit, FakeSvn, resolver};
  use tempfile::TempDir;

  fn released(tags: &[&str]) -> FakeSvn {
    tags.iter().fold(FakeSvn::new(), |svn, tag| {
      svn
        .library_tag(tag)
        .bundle(tag, "linux_centos7_x86_64", &["python3.7"])
    })
  }

  #[test]
  fn repeated_checkout_updates_in_place() {
    let (resolver, git, svn) = resolver(FakeGit::with_tags(&["v2.80"]), released(&["blender-2.80-release"]));
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("blender");

    checkout_version(&resolver, &target, "2.80", false).unwrap();
    checkout_version(&resolver, &target, "v2.80", false).unwrap();

    let lib_dir = target.join("lib");
    assert!(target.is_dir());
    assert_eq!(git.count("clone"), 1);
    assert_eq!(svn.count(&format!("checkout {}", lib_dir.display())), 1);
    assert_eq!(svn.count(&format!("switch {}", lib_dir.display())), 1);
  }

  #[test]
  fn missing_parent_needs_create_dirs() {
    let (resolver, git, _) = resolver(FakeGit::with_tags(&["v2.80"]), released(&["blender-2.80-release"]));
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("nested").join("blender");

    let err = checkout_version(&resolver, &target, "2.80", false).unwrap_err();
    assert!(matches!(err, Error::CreateDir { ref path, .. } if path == &target));
    assert_eq!(git.count("clone"), 0);

    checkout_version(&resolver, &target, "2.80", true).unwrap();
    assert!(target.is_dir());
  }

  #[test]
  fn unknown_version_touches_nothing() {
    let (resolver, git, _) = resolver(FakeGit::with_tags(&["v2.80"]), released(&["blender-2.80-release"]));
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("blender");

    let err = checkout_version(&resolver, &target, "2.99", true).unwrap_err();

    assert!(matches!(err, Error::VersionNotFound { .. }));
    assert!(!target.exists());
    assert_eq!(git.count("clone"), 0);
  }

  #[test]
  fn code_only_version_checks_out_code() {
    let (resolver, git, svn) = resolver(FakeGit::with_tags(&["v2.80", "v2.81"]), released(&["blender-2.80-release"]));
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("blender");

    let matched = checkout_version(&resolver, &target, "2.81", true).unwrap();

    assert!(matched.primary_library().is_none());
    assert!(target.is_dir());
    assert_eq!(git.count("clone"), 1);
    assert_eq!(svn.count("checkout"), 0);
  }

  #[test]
  fn library_only_version_is_unbuildable() {
    let (resolver, git, _) = resolver(
      FakeGit::with_tags(&["v2.80"]),
      released(&["blender-2.80-release", "blender-2.81-release"]),
    );
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("blender");

    let err = checkout_version(&resolver, &target, "2.81", true).unwrap_err();

    assert!(matches!(err, Error::Unbuildable { missing: Origin::Code, .. }));
    assert!(!target.exists());
    assert_eq!(git.count("clone"), 0);
  }

  #[test]
  fn checkout_all_isolates_failures() {
    let (resolver, _, svn) = resolver(
      FakeGit::with_tags(&["v2.79b", "v2.80", "v2.81", "v2.82"]).failing_ref("v2.81"),
      released(&[
        "blender-2.79b-release",
        "blender-2.80-release",
        "blender-2.81-release",
        "blender-2.83-release",
      ]),
    );
    let temp = TempDir::new().unwrap();

    let report = checkout_all(&resolver, temp.path(), false).unwrap();

    let succeeded: Vec<String> = report.succeeded.iter().map(|(v, _)| v.to_string()).collect();
    assert_eq!(succeeded, vec!["2.79b", "2.80", "2.82"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].version.to_string(), "2.81");
    assert_eq!(report.skipped, vec![normalize("2.83")]);
    assert!(!report.is_success());

    // Libraries land inside each version's own directory
    let lib_dir = temp.path().join("2.80").join("lib");
    assert_eq!(svn.count(&format!("checkout {}", lib_dir.display())), 1);
    // Code-only versions get no libraries
    let lib_dir = temp.path().join("2.82").join("lib");
    assert_eq!(svn.count(&format!("checkout {}", lib_dir.display())), 0);
  }
}
