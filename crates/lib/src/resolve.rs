//! Cross-referencing code tags, library tags and platform bundles.
//!
//! The [`Resolver`] joins both repositories' tags on their normalized version
//! into a [`VersionIndex`], then filters that index down to the versions whose
//! library tag ships a bundle for the caller's OS, word width and Python.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::consts::NON_PLATFORM_DIRS;
use crate::descriptor::PlatformDescriptor;
use crate::error::Error;
use crate::platform::Platform;
use crate::platform::bitness::Bitness;
use crate::platform::os::OsFamily;
use crate::platform::python::RuntimeVersion;
use crate::remote::{GitRemote, SvnRemote, url_join};
use crate::sources::{CodeRepo, LibraryRepo, Origin, SourceRepository, VersionTag};
use crate::version::{ComparableVersion, normalize};

/// Every known version, buildable or not, in ascending order.
pub type VersionIndex = BTreeMap<ComparableVersion, MatchedVersion>;

/// All tags from both repositories that normalize to one version.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedVersion {
  pub version: ComparableVersion,
  pub code: Vec<VersionTag>,
  pub library: Vec<VersionTag>,
}

impl MatchedVersion {
  fn new(version: ComparableVersion) -> Self {
    Self {
      version,
      code: Vec::new(),
      library: Vec::new(),
    }
  }

  /// Both a code tag and a library tag exist.
  pub fn is_buildable(&self) -> bool {
    !self.code.is_empty() && !self.library.is_empty()
  }

  /// The code tag checked out for this version.
  pub fn primary_code(&self) -> Option<&VersionTag> {
    self.code.first()
  }

  /// The library tag checked out for this version; the first one listed when
  /// several spellings normalize to the same version.
  pub fn primary_library(&self) -> Option<&VersionTag> {
    self.library.first()
  }

  /// The side with no tag, if any.
  pub fn missing(&self) -> Option<Origin> {
    if self.code.is_empty() {
      Some(Origin::Code)
    } else if self.library.is_empty() {
      Some(Origin::Library)
    } else {
      None
    }
  }
}

/// What the caller builds for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
  pub platform: Platform,
  pub runtime: RuntimeVersion,
}

impl BuildTarget {
  pub fn new(platform: Platform, runtime: RuntimeVersion) -> Self {
    Self { platform, runtime }
  }
}

/// A version chosen for a target together with the bundle that serves it.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
  pub matched: MatchedVersion,
  pub platform: PlatformDescriptor,
}

impl Selection {
  pub fn version(&self) -> &ComparableVersion {
    &self.matched.version
  }

  /// Compiler the bundle was built with, Windows only.
  pub fn toolchain(&self) -> Option<&str> {
    self.platform.toolchain.as_deref()
  }
}

/// A bundle of one version with the Python versions it ships.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformSupport {
  #[serde(flatten)]
  pub descriptor: PlatformDescriptor,
  pub runtimes: Vec<RuntimeVersion>,
}

/// Joins the code and library repositories.
pub struct Resolver {
  code: CodeRepo,
  library: LibraryRepo,
}

impl Resolver {
  pub fn new(code: CodeRepo, library: LibraryRepo) -> Self {
    Self { code, library }
  }

  /// Build a resolver for the repositories named in `settings`.
  pub fn from_settings(settings: &Settings, git: Arc<dyn GitRemote>, svn: Arc<dyn SvnRemote>) -> Self {
    Self::new(
      CodeRepo::new(git, &settings.git_url, &settings.branch),
      LibraryRepo::new(svn, &settings.svn_url),
    )
  }

  pub fn code(&self) -> &CodeRepo {
    &self.code
  }

  pub fn library(&self) -> &LibraryRepo {
    &self.library
  }

  /// Join both repositories' tags on their normalized version.
  ///
  /// Fails when either repository cannot be listed.
  pub fn matched_versions(&self) -> Result<VersionIndex, Error> {
    let mut index = VersionIndex::new();

    for tag in self.code.version_tags()? {
      index
        .entry(tag.normalized.clone())
        .or_insert_with_key(|v| MatchedVersion::new(v.clone()))
        .code
        .push(tag);
    }
    for tag in self.library.version_tags()? {
      index
        .entry(tag.normalized.clone())
        .or_insert_with_key(|v| MatchedVersion::new(v.clone()))
        .library
        .push(tag);
    }

    debug!(
      versions = index.len(),
      buildable = index.values().filter(|m| m.is_buildable()).count(),
      "matched versions"
    );
    Ok(index)
  }

  /// Platform bundles under the version's library tag.
  ///
  /// A listing failure only affects this version: it is logged and yields no
  /// bundles.
  pub fn platforms(&self, matched: &MatchedVersion) -> Vec<PlatformDescriptor> {
    let Some(tag) = matched.primary_library() else {
      return Vec::new();
    };

    let lib_url = self.library.lib_url(Some(&tag.raw));
    match self.library.remote().list(&lib_url) {
      Ok(entries) => entries
        .into_iter()
        .filter(|entry| entry.is_dir() && !NON_PLATFORM_DIRS.contains(&entry.name.as_str()))
        .map(|entry| {
          let url = url_join(&lib_url, &entry.name);
          PlatformDescriptor::parse(&entry.name, url)
        })
        .collect(),
      Err(e) => {
        warn!(version = %matched.version, url = %lib_url, error = %e, "could not list platform libraries");
        Vec::new()
      }
    }
  }

  /// Bundles of `matched` that serve the given OS, word width and Python.
  pub fn compatible_platforms(
    &self,
    matched: &MatchedVersion,
    os: OsFamily,
    bitness: Bitness,
    runtime: RuntimeVersion,
  ) -> Vec<PlatformDescriptor> {
    self
      .platforms(matched)
      .into_iter()
      .filter(|descriptor| descriptor.accepts(os, bitness) && self.ships_runtime(descriptor, runtime))
      .collect()
  }

  /// Whether `matched` can be built for the given target at all.
  pub fn is_compatible(&self, matched: &MatchedVersion, os: OsFamily, bitness: Bitness, runtime: RuntimeVersion) -> bool {
    matched.is_buildable() && !self.compatible_platforms(matched, os, bitness, runtime).is_empty()
  }

  /// The buildable versions with at least one bundle for the target.
  pub fn resolve(&self, os: OsFamily, bitness: Bitness, runtime: RuntimeVersion) -> Result<VersionIndex, Error> {
    let compatible: VersionIndex = self
      .matched_versions()?
      .into_iter()
      .filter(|(_, matched)| self.is_compatible(matched, os, bitness, runtime))
      .collect();

    info!(%os, %bitness, %runtime, count = compatible.len(), "resolved compatible versions");
    Ok(compatible)
  }

  /// Pick the version and bundle to build for `target`.
  ///
  /// An explicit `version` must exist, be buildable and serve the target.
  /// Without one, the newest version that serves the target wins.
  pub fn select(&self, version: Option<&str>, target: &BuildTarget) -> Result<Selection, Error> {
    let index = self.matched_versions()?;
    let Platform { os, bitness } = target.platform;
    let runtime = target.runtime;

    let (matched, candidates) = match version {
      Some(requested) => {
        let matched = index.get(&normalize(requested)).ok_or_else(|| Error::VersionNotFound {
          version: requested.to_string(),
        })?;
        if let Some(missing) = matched.missing() {
          return Err(Error::Unbuildable {
            version: matched.version.to_string(),
            missing,
          });
        }

        let candidates = self.compatible_platforms(matched, os, bitness, runtime);
        if candidates.is_empty() {
          return Err(Error::IncompatiblePlatform {
            version: matched.version.to_string(),
            os,
            bitness,
            runtime,
          });
        }
        (matched, candidates)
      }
      None => index
        .values()
        .rev()
        .filter(|matched| matched.is_buildable())
        .find_map(|matched| {
          let candidates = self.compatible_platforms(matched, os, bitness, runtime);
          (!candidates.is_empty()).then_some((matched, candidates))
        })
        .ok_or_else(|| Error::IncompatiblePlatform {
          version: "any".to_string(),
          os,
          bitness,
          runtime,
        })?,
    };

    let platform = choose_platform(matched, candidates, os, bitness)?;
    info!(version = %matched.version, bundle = %platform.name, "selected sources");

    Ok(Selection {
      matched: matched.clone(),
      platform,
    })
  }

  /// Every bundle of `version` with the Python versions it ships.
  pub fn platform_matrix(&self, version: &str) -> Result<Vec<PlatformSupport>, Error> {
    let index = self.matched_versions()?;
    let matched = index.get(&normalize(version)).ok_or_else(|| Error::VersionNotFound {
      version: version.to_string(),
    })?;

    Ok(
      self
        .platforms(matched)
        .into_iter()
        .map(|descriptor| {
          let runtimes = match descriptor.supported_runtime_versions(self.library.remote()) {
            Ok(runtimes) => runtimes.to_vec(),
            Err(e) => {
              warn!(bundle = %descriptor.name, error = %e, "could not list python libraries");
              Vec::new()
            }
          };
          PlatformSupport { descriptor, runtimes }
        })
        .collect(),
    )
  }

  fn ships_runtime(&self, descriptor: &PlatformDescriptor, runtime: RuntimeVersion) -> bool {
    match descriptor.supported_runtime_versions(self.library.remote()) {
      Ok(runtimes) => runtimes.contains(&runtime),
      Err(e) => {
        warn!(bundle = %descriptor.name, error = %e, "could not list python libraries");
        false
      }
    }
  }
}

/// Windows bundles are split by compiler, so Windows callers get the newest
/// toolchain. Elsewhere a bundle naming the OS beats a generic one.
fn choose_platform(
  matched: &MatchedVersion,
  mut candidates: Vec<PlatformDescriptor>,
  os: OsFamily,
  bitness: Bitness,
) -> Result<PlatformDescriptor, Error> {
  if os == OsFamily::Windows {
    return candidates
      .into_iter()
      .filter_map(|d| d.toolchain_rank().map(|rank| (rank, d)))
      .max_by_key(|(rank, _)| *rank)
      .map(|(_, d)| d)
      .ok_or_else(|| Error::AmbiguousToolchain {
        version: matched.version.to_string(),
        os,
        bitness,
      });
  }

  let exact = candidates.iter().position(|d| d.os_family == os).unwrap_or(0);
  Ok(candidates.swap_remove(exact))
}
