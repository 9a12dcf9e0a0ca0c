//! Svn remote backed by the `svn` executable.

use std::path::Path;

use tracing::{debug, info};

use super::command::run;
use super::{RemoteError, SvnEntry, SvnRemote};

/// Error codes svn reports for a path that does not exist in the repository.
const MISSING_PATH_CODES: &[&str] = &["E200009", "W160013", "E160013"];

/// E170000 also covers malformed URLs; only its "doesn't exist" form means a
/// missing path.
const ILLEGAL_URL_CODE: &str = "E170000";

/// [`SvnRemote`] implementation used outside of tests.
#[derive(Debug, Clone)]
pub struct SvnCli {
  program: String,
}

impl SvnCli {
  pub fn new() -> Self {
    Self {
      program: "svn".to_string(),
    }
  }

  fn svn(&self, args: &[&str]) -> Result<String, RemoteError> {
    let mut full = vec!["--non-interactive"];
    full.extend_from_slice(args);
    run(&self.program, &full, None)
  }
}

impl Default for SvnCli {
  fn default() -> Self {
    Self::new()
  }
}

impl SvnRemote for SvnCli {
  fn list(&self, url: &str) -> Result<Vec<SvnEntry>, RemoteError> {
    debug!(url, "listing svn directory");
    let output = self.svn(&["list", url]).map_err(|e| classify(url, e))?;
    Ok(parse_listing(&output))
  }

  fn is_working_copy(&self, path: &Path) -> bool {
    path.join(".svn").is_dir()
  }

  fn checkout(&self, url: &str, path: &Path) -> Result<(), RemoteError> {
    info!(url, path = %path.display(), "checking out svn path");
    let target = path.to_string_lossy();
    self.svn(&["checkout", "--quiet", url, &target]).map_err(|e| classify(url, e))?;
    Ok(())
  }

  fn switch(&self, url: &str, path: &Path) -> Result<(), RemoteError> {
    info!(url, path = %path.display(), "switching svn working copy");
    let target = path.to_string_lossy();
    self
      .svn(&["switch", "--quiet", "--ignore-ancestry", url, &target])
      .map_err(|e| classify(url, e))?;
    Ok(())
  }
}

/// Sort a failed svn command into "path missing" or "remote unreachable".
fn classify(url: &str, err: RemoteError) -> RemoteError {
  match err {
    RemoteError::Command { stderr, .. } if is_missing_path(&stderr) => RemoteError::PathNotFound { url: url.to_string() },
    RemoteError::Command { stderr, .. } => RemoteError::Unavailable {
      url: url.to_string(),
      reason: stderr,
    },
    other => other,
  }
}

fn is_missing_path(stderr: &str) -> bool {
  MISSING_PATH_CODES.iter().any(|code| stderr.contains(code))
    || stderr
      .lines()
      .any(|line| line.contains(ILLEGAL_URL_CODE) && line.contains("doesn't exist"))
}

/// `svn list` prints one entry per line; directories end with `/`.
fn parse_listing(output: &str) -> Vec<SvnEntry> {
  output
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(|line| match line.strip_suffix('/') {
      Some(dir) => SvnEntry::dir(dir),
      None => SvnEntry::file(line),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trailing_slash_marks_directories() {
    let entries = parse_listing("darwin/\nlinux_centos7_x86_64/\nREADME.txt\n\n");
    assert_eq!(
      entries,
      vec![
        SvnEntry::dir("darwin"),
        SvnEntry::dir("linux_centos7_x86_64"),
        SvnEntry::file("README.txt"),
      ]
    );
  }

  #[test]
  fn missing_path_is_distinguished_from_unreachable() {
    let missing = classify(
      "https://svn.example/bf/tags/x/lib/linux/python/lib",
      RemoteError::Command {
        command: "svn list".to_string(),
        code: Some(1),
        stderr: "svn: warning: W160013: path not found\nsvn: E200009: Could not list all targets".to_string(),
      },
    );
    assert!(matches!(missing, RemoteError::PathNotFound { .. }));

    let unreachable = classify(
      "https://svn.example/bf/tags",
      RemoteError::Command {
        command: "svn list".to_string(),
        code: Some(1),
        stderr: "svn: E170013: Unable to connect to a repository".to_string(),
      },
    );
    assert!(matches!(unreachable, RemoteError::Unavailable { .. }));
  }

  #[test]
  fn malformed_url_is_not_a_missing_path() {
    let malformed = classify(
      "htps://svn.example/bf/tags",
      RemoteError::Command {
        command: "svn list".to_string(),
        code: Some(1),
        stderr: "svn: E170000: Unrecognized URL scheme for 'htps://svn.example/bf/tags'".to_string(),
      },
    );
    assert!(matches!(malformed, RemoteError::Unavailable { .. }));

    let missing = classify(
      "https://svn.example/bf/tags/x/lib",
      RemoteError::Command {
        command: "svn list".to_string(),
        code: Some(1),
        stderr: "svn: E170000: URL 'https://svn.example/bf/tags/x/lib' doesn't exist".to_string(),
      },
    );
    assert!(matches!(missing, RemoteError::PathNotFound { .. }));
  }

  #[test]
  fn plain_directory_is_not_a_working_copy() {
    let temp = tempfile::TempDir::new().unwrap();
    assert!(!SvnCli::new().is_working_copy(temp.path()));
  }
}
