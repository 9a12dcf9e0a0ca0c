//! The two source repositories Blender is built from.
//!
//! - [`CodeRepo`] - the git repository holding the source tree
//! - [`LibraryRepo`] - the svn repository holding precompiled platform libraries
//!
//! Both implement [`SourceRepository`]: they list their release tags and can
//! materialize one of them on disk. They share the contract, not any state.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::remote::{GitRemote, SvnRemote, url_join};
use crate::version::{ComparableVersion, normalize};

/// Which repository a tag came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
  Code,
  Library,
}

impl fmt::Display for Origin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Origin::Code => write!(f, "code"),
      Origin::Library => write!(f, "library"),
    }
  }
}

/// One release tag as reported by a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionTag {
  /// The tag verbatim.
  pub raw: String,
  /// The tag with repository-specific decoration stripped.
  pub normalized: ComparableVersion,
  pub origin: Origin,
}

impl VersionTag {
  pub fn new(raw: impl Into<String>, origin: Origin) -> Self {
    let raw = raw.into();
    let normalized = normalize(&raw);
    Self { raw, normalized, origin }
  }
}

/// A repository that publishes release tags and can check them out.
pub trait SourceRepository {
  fn origin(&self) -> Origin;

  /// Raw names of the release tags the repository carries.
  fn list_tags(&self) -> Result<Vec<String>, Error>;

  /// Create or update a checkout of `tag` (or the development line when
  /// `None`) at `target`.
  ///
  /// A tag that the repository does not carry fails with
  /// [`Error::VersionNotFound`] before anything is written.
  fn checkout(&self, tag: Option<&str>, target: &Path) -> Result<(), Error>;

  /// [`list_tags`](Self::list_tags) with every tag normalized.
  fn version_tags(&self) -> Result<Vec<VersionTag>, Error> {
    let origin = self.origin();
    Ok(
      self
        .list_tags()?
        .into_iter()
        .map(|raw| VersionTag::new(raw, origin))
        .collect(),
    )
  }

  /// Fail with [`Error::VersionNotFound`] unless `tag` is listed.
  fn ensure_tag(&self, tag: &str) -> Result<(), Error> {
    if self.list_tags()?.iter().any(|t| t == tag) {
      Ok(())
    } else {
      Err(Error::VersionNotFound {
        version: tag.to_string(),
      })
    }
  }
}

/// The Blender git repository.
pub struct CodeRepo {
  remote: Arc<dyn GitRemote>,
  url: String,
  branch: String,
}

impl CodeRepo {
  pub fn new(remote: Arc<dyn GitRemote>, url: impl Into<String>, branch: impl Into<String>) -> Self {
    Self {
      remote,
      url: url.into(),
      branch: branch.into(),
    }
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// Move the submodule at `path` to the development branch, update it and
  /// pin it to `tag` when given.
  fn pin_submodule(&self, path: &Path, tag: Option<&str>) -> Result<(), Error> {
    self.remote.checkout_ref(path, &self.branch)?;
    self.remote.pull(path, &self.branch)?;
    if let Some(tag) = tag {
      self.remote.checkout_ref(path, tag)?;
    }
    Ok(())
  }
}

impl SourceRepository for CodeRepo {
  fn origin(&self) -> Origin {
    Origin::Code
  }

  fn list_tags(&self) -> Result<Vec<String>, Error> {
    let refs = self.remote.list_remote_tags(&self.url)?;

    let tags: Vec<String> = refs
      .into_iter()
      .filter(|r| !r.name.ends_with("^{}"))
      .map(|r| r.name.rsplit('/').next().unwrap_or(&r.name).to_string())
      .filter(|name| !name.starts_with("Studio") && normalize(name).has_release())
      .collect();

    debug!(url = %self.url, count = tags.len(), "listed code tags");
    Ok(tags)
  }

  fn checkout(&self, tag: Option<&str>, target: &Path) -> Result<(), Error> {
    if let Some(tag) = tag {
      self.ensure_tag(tag)?;
    }

    if self.remote.is_repository(target) {
      debug!(path = %target.display(), "updating existing clone");
      self.remote.checkout_ref(target, &self.branch)?;
      self.remote.pull(target, &self.branch)?;
    } else {
      info!(url = %self.url, path = %target.display(), "cloning sources");
      self.remote.clone_repo(&self.url, target)?;
    }

    if let Some(tag) = tag {
      info!(tag, path = %target.display(), "checking out tag");
      self.remote.checkout_ref(target, tag)?;
    }

    self.remote.update_submodules(target, true, true)?;

    // Not every submodule carries every release tag
    for submodule in self.remote.submodules(target)? {
      let path = target.join(&submodule);
      if let Err(e) = self.pin_submodule(&path, tag) {
        warn!(submodule = %submodule.display(), tag = ?tag, error = %e, "could not update submodule");
      }
    }

    Ok(())
  }
}

/// The Blender svn library repository.
pub struct LibraryRepo {
  remote: Arc<dyn SvnRemote>,
  base_url: String,
}

impl LibraryRepo {
  pub fn new(remote: Arc<dyn SvnRemote>, base_url: impl Into<String>) -> Self {
    Self {
      remote,
      base_url: base_url.into(),
    }
  }

  pub fn url(&self) -> &str {
    &self.base_url
  }

  pub fn remote(&self) -> &dyn SvnRemote {
    self.remote.as_ref()
  }

  pub fn tags_url(&self) -> String {
    url_join(&self.base_url, "tags")
  }

  /// URL of the `lib` directory of `tag`, or of trunk when `None`.
  pub fn lib_url(&self, tag: Option<&str>) -> String {
    match tag {
      Some(tag) => url_join(&url_join(&self.tags_url(), tag), "lib"),
      None => url_join(&self.base_url, "trunk/lib"),
    }
  }
}

impl SourceRepository for LibraryRepo {
  fn origin(&self) -> Origin {
    Origin::Library
  }

  fn list_tags(&self) -> Result<Vec<String>, Error> {
    let tags: Vec<String> = self
      .remote
      .list(&self.tags_url())?
      .into_iter()
      .map(|entry| entry.name)
      .filter(|name| name.starts_with("blender"))
      .collect();

    debug!(url = %self.base_url, count = tags.len(), "listed library tags");
    Ok(tags)
  }

  fn checkout(&self, tag: Option<&str>, target: &Path) -> Result<(), Error> {
    if let Some(tag) = tag {
      self.ensure_tag(tag)?;
    }

    let url = self.lib_url(tag);
    let lib_dir = target.join("lib");

    if self.remote.is_working_copy(&lib_dir) {
      self.remote.switch(&url, &lib_dir)?;
    } else {
      self.remote.checkout(&url, &lib_dir)?;
    }

    Ok(())
  }
}
