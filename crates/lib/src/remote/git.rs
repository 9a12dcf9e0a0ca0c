//! Git remote backed by `gix` and the `git` executable.
//!
//! Cloning and fetching go through `gix`. Listing remote tags, moving the
//! worktree between refs, fast-forwarding and submodule handling shell out to
//! `git`, which already implements them on top of the same repository.

use std::path::{Path, PathBuf};

use gix::remote::Direction;
use tracing::{debug, info};

use super::command::run;
use super::{GitRemote, RemoteError, RemoteRef};

/// [`GitRemote`] implementation used outside of tests.
#[derive(Debug, Clone)]
pub struct GitCli {
  program: String,
}

impl GitCli {
  pub fn new() -> Self {
    Self {
      program: "git".to_string(),
    }
  }

  fn git(&self, args: &[&str], cwd: Option<&Path>) -> Result<String, RemoteError> {
    run(&self.program, args, cwd)
  }
}

impl Default for GitCli {
  fn default() -> Self {
    Self::new()
  }
}

impl GitRemote for GitCli {
  fn list_remote_tags(&self, url: &str) -> Result<Vec<RemoteRef>, RemoteError> {
    debug!(url, "listing remote tags");
    let output = self
      .git(&["ls-remote", "--tags", url], None)
      .map_err(|e| unavailable(url, e))?;
    Ok(parse_ls_remote(&output))
  }

  fn is_repository(&self, path: &Path) -> bool {
    path.join(".git").exists() && gix::open(path).is_ok()
  }

  fn clone_repo(&self, url: &str, path: &Path) -> Result<(), RemoteError> {
    info!(url, path = %path.display(), "cloning repository");

    let mut prepared = gix::prepare_clone(url, path).map_err(|e| RemoteError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

    let (mut checkout, _outcome) = prepared
      .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
      .map_err(|e| clone_failure(url, e))?;

    checkout
      .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
      .map_err(|e| RemoteError::Clone {
        url: url.to_string(),
        source: Box::new(e),
      })?;

    Ok(())
  }

  fn pull(&self, path: &Path, branch: &str) -> Result<(), RemoteError> {
    let repo = gix::open(path).map_err(|e| RemoteError::Open {
      path: path.to_path_buf(),
      source: Box::new(e),
    })?;

    fetch_updates(&repo, path)?;

    let upstream = format!("origin/{}", branch);
    self.git(&["merge", "--ff-only", "--quiet", &upstream], Some(path))?;
    Ok(())
  }

  fn checkout_ref(&self, path: &Path, reference: &str) -> Result<(), RemoteError> {
    debug!(path = %path.display(), reference, "checking out ref");
    self.git(&["checkout", "--quiet", reference], Some(path))?;
    Ok(())
  }

  fn update_submodules(&self, path: &Path, recursive: bool, init: bool) -> Result<(), RemoteError> {
    let mut args = vec!["submodule", "update"];
    if init {
      args.push("--init");
    }
    if recursive {
      args.push("--recursive");
    }
    self.git(&args, Some(path))?;
    Ok(())
  }

  fn submodules(&self, path: &Path) -> Result<Vec<PathBuf>, RemoteError> {
    if !path.join(".gitmodules").exists() {
      return Ok(Vec::new());
    }

    let listing = self.git(
      &["config", "--file", ".gitmodules", "--get-regexp", r"^submodule\..*\.path$"],
      Some(path),
    );

    match listing {
      Ok(output) => Ok(parse_submodule_paths(&output)),
      // `git config --get-regexp` exits 1 when nothing matches
      Err(RemoteError::Command { code: Some(1), .. }) => Ok(Vec::new()),
      Err(e) => Err(e),
    }
  }
}

/// Fetch updates from the default remote.
fn fetch_updates(repo: &gix::Repository, path: &Path) -> Result<(), RemoteError> {
  let origin = format!("origin of {}", path.display());
  debug!(remote = %origin, "fetching updates");

  let remote = repo
    .find_default_remote(Direction::Fetch)
    .ok_or_else(|| RemoteError::NoRemote(path.to_path_buf()))?
    .map_err(|e| RemoteError::Unavailable {
      url: origin.clone(),
      reason: e.to_string(),
    })?;

  let connection = remote
    .connect(Direction::Fetch)
    .map_err(|e| RemoteError::Unavailable {
      url: origin.clone(),
      reason: e.to_string(),
    })?;

  connection
    .prepare_fetch(gix::progress::Discard, Default::default())
    .map_err(|e| match e {
      // The ref map is the first exchange with the server
      gix::remote::fetch::prepare::Error::RefMap(_) => RemoteError::Unavailable {
        url: origin.clone(),
        reason: e.to_string(),
      },
      other => RemoteError::Fetch {
        url: origin.clone(),
        source: Box::new(other),
      },
    })?
    .receive(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| fetch_failure(&origin, e))?;

  Ok(())
}

/// Connection and transport failures while cloning mean the remote is
/// unreachable. Everything else is a local clone failure.
fn clone_failure(url: &str, err: gix::clone::fetch::Error) -> RemoteError {
  use gix::clone::fetch::Error;

  match err {
    Error::Connect(_) | Error::PrepareFetch(gix::remote::fetch::prepare::Error::RefMap(_)) => {
      RemoteError::Unavailable {
        url: url.to_string(),
        reason: err.to_string(),
      }
    }
    Error::Fetch(e) => fetch_failure(url, e),
    other => RemoteError::Clone {
      url: url.to_string(),
      source: Box::new(other),
    },
  }
}

/// Sort a failed pack transfer into "remote unreachable" or a fetch error.
fn fetch_failure(url: &str, err: gix::remote::fetch::Error) -> RemoteError {
  use gix::protocol::fetch::Error as Protocol;
  use gix::remote::fetch::Error;

  match err {
    Error::Client(_)
    | Error::Fetch(Protocol::Client(_) | Protocol::FetchResponse(_) | Protocol::ReadRemainingBytes(_)) => {
      RemoteError::Unavailable {
        url: url.to_string(),
        reason: err.to_string(),
      }
    }
    other => RemoteError::Fetch {
      url: url.to_string(),
      source: Box::new(other),
    },
  }
}

/// A failed query against a remote means the remote is unreachable; a
/// missing `git` binary stays a spawn error.
fn unavailable(url: &str, err: RemoteError) -> RemoteError {
  match err {
    RemoteError::Command { stderr, .. } => RemoteError::Unavailable {
      url: url.to_string(),
      reason: stderr,
    },
    other => other,
  }
}

fn parse_ls_remote(output: &str) -> Vec<RemoteRef> {
  output
    .lines()
    .filter_map(|line| {
      let (oid, name) = line.split_once('\t')?;
      Some(RemoteRef {
        oid: oid.trim().to_string(),
        name: name.trim().to_string(),
      })
    })
    .collect()
}

fn parse_submodule_paths(output: &str) -> Vec<PathBuf> {
  output
    .lines()
    .filter_map(|line| line.split_once(' ').map(|(_, path)| PathBuf::from(path.trim())))
    .collect()
}
