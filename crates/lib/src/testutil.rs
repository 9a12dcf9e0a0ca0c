//! Test utilities for bpybuild-lib.
//!
//! In-memory stand-ins for the git and svn remotes. Both record every call as
//! a short line (`"clone /tmp/x"`, `"list https://..."`) so tests can assert
//! how often the network would have been touched.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::remote::{GitRemote, RemoteError, RemoteRef, SvnEntry, SvnRemote, url_join};
use crate::resolve::Resolver;
use crate::sources::{CodeRepo, LibraryRepo};

pub const GIT_URL: &str = "https://git.example/blender.git";
pub const SVN_URL: &str = "https://svn.example/bf-blender";

#[derive(Default)]
pub struct FakeGit {
  tags: Vec<String>,
  unreachable: bool,
  submodules: Vec<PathBuf>,
  missing_in_submodules: HashSet<String>,
  failing_refs: HashSet<String>,
  repos: Mutex<HashSet<PathBuf>>,
  calls: Mutex<Vec<String>>,
}

impl FakeGit {
  pub fn with_tags(tags: &[&str]) -> Self {
    Self {
      tags: tags.iter().map(|t| t.to_string()).collect(),
      ..Default::default()
    }
  }

  /// Every network operation fails as if the host were offline.
  pub fn unreachable() -> Self {
    Self {
      unreachable: true,
      ..Default::default()
    }
  }

  pub fn submodule(mut self, path: &str) -> Self {
    self.submodules.push(PathBuf::from(path));
    self
  }

  /// Checking out `reference` inside any submodule fails.
  pub fn missing_in_submodules(mut self, reference: &str) -> Self {
    self.missing_in_submodules.insert(reference.to_string());
    self
  }

  /// Checking out `reference` fails everywhere.
  pub fn failing_ref(mut self, reference: &str) -> Self {
    self.failing_refs.insert(reference.to_string());
    self
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  /// Number of recorded calls starting with `prefix`.
  pub fn count(&self, prefix: &str) -> usize {
    self.calls().iter().filter(|c| c.starts_with(prefix)).count()
  }

  fn record(&self, call: String) {
    self.calls.lock().unwrap().push(call);
  }

  fn offline(&self, url: &str) -> Result<(), RemoteError> {
    if self.unreachable {
      return Err(RemoteError::Unavailable {
        url: url.to_string(),
        reason: "network is unreachable".to_string(),
      });
    }
    Ok(())
  }

  fn in_submodule(&self, path: &Path) -> bool {
    self.submodules.iter().any(|sub| path.ends_with(sub))
  }
}

impl GitRemote for FakeGit {
  fn list_remote_tags(&self, url: &str) -> Result<Vec<RemoteRef>, RemoteError> {
    self.record(format!("ls-remote {}", url));
    self.offline(url)?;

    Ok(
      self
        .tags
        .iter()
        .flat_map(|tag| {
          [
            RemoteRef {
              oid: "a".repeat(40),
              name: format!("refs/tags/{}", tag),
            },
            RemoteRef {
              oid: "b".repeat(40),
              name: format!("refs/tags/{}^{{}}", tag),
            },
          ]
        })
        .collect(),
    )
  }

  fn is_repository(&self, path: &Path) -> bool {
    self.repos.lock().unwrap().contains(path)
  }

  fn clone_repo(&self, url: &str, path: &Path) -> Result<(), RemoteError> {
    self.record(format!("clone {}", path.display()));
    self.offline(url)?;
    self.repos.lock().unwrap().insert(path.to_path_buf());
    Ok(())
  }

  fn pull(&self, path: &Path, branch: &str) -> Result<(), RemoteError> {
    self.record(format!("pull {} {}", path.display(), branch));
    self.offline(GIT_URL)
  }

  fn checkout_ref(&self, path: &Path, reference: &str) -> Result<(), RemoteError> {
    self.record(format!("checkout {} {}", path.display(), reference));

    let missing = self.failing_refs.contains(reference)
      || (self.in_submodule(path) && self.missing_in_submodules.contains(reference));
    if missing {
      return Err(RemoteError::Command {
        command: format!("git checkout {}", reference),
        code: Some(1),
        stderr: format!("error: pathspec '{}' did not match any file(s) known to git", reference),
      });
    }
    Ok(())
  }

  fn update_submodules(&self, path: &Path, _recursive: bool, _init: bool) -> Result<(), RemoteError> {
    self.record(format!("submodule-update {}", path.display()));
    Ok(())
  }

  fn submodules(&self, _path: &Path) -> Result<Vec<PathBuf>, RemoteError> {
    Ok(self.submodules.clone())
  }
}

#[derive(Default)]
pub struct FakeSvn {
  dirs: HashMap<String, Vec<SvnEntry>>,
  unreachable: HashSet<String>,
  working_copies: Mutex<HashSet<PathBuf>>,
  calls: Mutex<Vec<String>>,
}

impl FakeSvn {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a directory listing. Names ending in `/` are directories.
  pub fn dir(mut self, url: &str, entries: &[&str]) -> Self {
    let listing = self.dirs.entry(url.to_string()).or_default();
    listing.extend(entries.iter().map(|name| match name.strip_suffix('/') {
      Some(dir) => SvnEntry::dir(dir),
      None => SvnEntry::file(*name),
    }));
    self
  }

  /// Add a library tag with an empty `lib/` holding only the non-platform
  /// `python` directory.
  pub fn library_tag(self, tag: &str) -> Self {
    let entry = format!("{}/", tag);
    self
      .dir(&url_join(SVN_URL, "tags"), &[entry.as_str()])
      .dir(&lib_url(tag), &["python/"])
  }

  /// Add a platform bundle to `tag`. An empty `python_lib` leaves the bundle
  /// without a `python/lib` directory.
  pub fn bundle(self, tag: &str, name: &str, python_lib: &[&str]) -> Self {
    let entry = format!("{}/", name);
    let svn = self.dir(&lib_url(tag), &[entry.as_str()]);
    if python_lib.is_empty() {
      svn
    } else {
      svn.dir(&url_join(&bundle_url(tag, name), "python/lib"), python_lib)
    }
  }

  /// Listing or checking out `url` fails as if the server were down.
  pub fn unreachable_at(mut self, url: &str) -> Self {
    self.unreachable.insert(url.to_string());
    self
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  pub fn count(&self, prefix: &str) -> usize {
    self.calls().iter().filter(|c| c.starts_with(prefix)).count()
  }

  fn record(&self, call: String) {
    self.calls.lock().unwrap().push(call);
  }

  fn lookup(&self, url: &str) -> Result<&Vec<SvnEntry>, RemoteError> {
    if self.unreachable.contains(url) {
      return Err(RemoteError::Unavailable {
        url: url.to_string(),
        reason: "connection refused".to_string(),
      });
    }
    self
      .dirs
      .get(url)
      .ok_or_else(|| RemoteError::PathNotFound { url: url.to_string() })
  }
}

impl SvnRemote for FakeSvn {
  fn list(&self, url: &str) -> Result<Vec<SvnEntry>, RemoteError> {
    self.record(format!("list {}", url));
    self.lookup(url).cloned()
  }

  fn is_working_copy(&self, path: &Path) -> bool {
    self.working_copies.lock().unwrap().contains(path)
  }

  fn checkout(&self, url: &str, path: &Path) -> Result<(), RemoteError> {
    self.record(format!("checkout {} {}", path.display(), url));
    self.lookup(url)?;
    self.working_copies.lock().unwrap().insert(path.to_path_buf());
    Ok(())
  }

  fn switch(&self, url: &str, path: &Path) -> Result<(), RemoteError> {
    self.record(format!("switch {} {}", path.display(), url));
    self.lookup(url)?;
    Ok(())
  }
}

/// Build a resolver over the two fakes, keeping handles for assertions.
pub fn resolver(git: FakeGit, svn: FakeSvn) -> (Resolver, Arc<FakeGit>, Arc<FakeSvn>) {
  let git = Arc::new(git);
  let svn = Arc::new(svn);
  let resolver = Resolver::new(
    CodeRepo::new(git.clone(), GIT_URL, "main"),
    LibraryRepo::new(svn.clone(), SVN_URL),
  );
  (resolver, git, svn)
}

/// URL of the `lib` directory of a library tag.
pub fn lib_url(tag: &str) -> String {
  url_join(&url_join(&url_join(SVN_URL, "tags"), tag), "lib")
}

/// URL of a bundle inside a library tag.
pub fn bundle_url(tag: &str, name: &str) -> String {
  url_join(&lib_url(tag), name)
}
