//! Remote repository collaborators.
//!
//! The resolver never talks to git or svn directly. It goes through the two
//! traits defined here so the matching and checkout logic can run against
//! in-memory fakes in tests.
//!
//! # Modules
//!
//! - [`git`] - [`GitCli`], backed by `gix` and the `git` executable
//! - [`svn`] - [`SvnCli`], backed by the `svn` executable

mod command;
pub mod git;
pub mod svn;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub use git::GitCli;
pub use svn::SvnCli;

/// Errors raised by remote operations.
#[derive(Debug, Error)]
pub enum RemoteError {
  /// The remote could not be reached.
  #[error("remote '{url}' is unreachable: {reason}")]
  Unavailable { url: String, reason: String },

  /// The remote answered but the requested path does not exist.
  #[error("remote path '{url}' does not exist")]
  PathNotFound { url: String },

  /// Failed to start an external program.
  #[error("failed to run '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// An external program exited unsuccessfully.
  #[error("'{command}' exited with status {code:?}: {stderr}")]
  Command {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// Failed to open an existing git repository.
  #[error("failed to open repository at '{path}': {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: Box<gix::open::Error>,
  },

  /// Failed to clone a git repository.
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to fetch from a git remote.
  #[error("failed to fetch from '{url}': {source}")]
  Fetch {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// The local repository has no remote to fetch from.
  #[error("no remote configured for repository at '{0}'")]
  NoRemote(PathBuf),
}

/// One tag reference reported by `git ls-remote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
  /// Object id the reference points at.
  pub oid: String,
  /// Full reference name, e.g. `refs/tags/v2.80`.
  pub name: String,
}

/// Kind of an entry in an svn directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
  File,
  Dir,
}

/// One entry of an svn directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvnEntry {
  pub name: String,
  pub kind: EntryKind,
}

impl SvnEntry {
  pub fn file(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: EntryKind::File,
    }
  }

  pub fn dir(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: EntryKind::Dir,
    }
  }

  pub fn is_dir(&self) -> bool {
    self.kind == EntryKind::Dir
  }
}

/// A distributed-history (git) remote.
pub trait GitRemote: Send + Sync {
  /// List the tag references of `url` without cloning it.
  fn list_remote_tags(&self, url: &str) -> Result<Vec<RemoteRef>, RemoteError>;

  /// Whether `path` already holds a usable clone.
  fn is_repository(&self, path: &Path) -> bool;

  /// Clone `url` into `path`.
  fn clone_repo(&self, url: &str, path: &Path) -> Result<(), RemoteError>;

  /// Fetch from origin and fast-forward `branch`.
  fn pull(&self, path: &Path, branch: &str) -> Result<(), RemoteError>;

  /// Check out a branch, tag or commit in the worktree at `path`.
  fn checkout_ref(&self, path: &Path, reference: &str) -> Result<(), RemoteError>;

  /// Update the submodules of the repository at `path`.
  fn update_submodules(&self, path: &Path, recursive: bool, init: bool) -> Result<(), RemoteError>;

  /// Paths of the submodules of the repository at `path`, relative to it.
  fn submodules(&self, path: &Path) -> Result<Vec<PathBuf>, RemoteError>;
}

/// A path-hierarchical (svn) remote.
pub trait SvnRemote: Send + Sync {
  /// List the entries directly below `url`.
  fn list(&self, url: &str) -> Result<Vec<SvnEntry>, RemoteError>;

  /// Whether `path` already holds a working copy.
  fn is_working_copy(&self, path: &Path) -> bool;

  /// Check out `url` into `path`.
  fn checkout(&self, url: &str, path: &Path) -> Result<(), RemoteError>;

  /// Point the working copy at `path` to `url` and update it.
  fn switch(&self, url: &str, path: &Path) -> Result<(), RemoteError>;
}

/// Join a URL and a relative path with exactly one `/` between them.
pub fn url_join(base: &str, path: &str) -> String {
  format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_join_normalizes_slashes() {
    assert_eq!(url_join("https://svn.example/bf/", "/tags"), "https://svn.example/bf/tags");
    assert_eq!(url_join("https://svn.example/bf", "tags/x"), "https://svn.example/bf/tags/x");
  }
}
