//! User settings.
//!
//! Resolved in layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. `{config_dir}/config.json`, when present
//! 3. `BPYBUILD_*` environment variables
//! 4. command-line flags (applied by the CLI)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_FILENAME, DEFAULT_BRANCH, DEFAULT_GIT_URL, DEFAULT_SVN_URL};
use crate::platform::paths::{DirError, config_dir, data_dir};

pub const ENV_GIT_URL: &str = "BPYBUILD_GIT_URL";
pub const ENV_SVN_URL: &str = "BPYBUILD_SVN_URL";
pub const ENV_BRANCH: &str = "BPYBUILD_BRANCH";
pub const ENV_ROOT: &str = "BPYBUILD_ROOT";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error(transparent)]
  Dir(#[from] DirError),
}

/// Where the sources come from and where they go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Git remote of the Blender sources.
  pub git_url: String,
  /// Svn root of the precompiled libraries.
  pub svn_url: String,
  /// Development branch the code checkout returns to before updating.
  pub branch: String,
  /// Checkout directory; unset means `{data_dir}/sources`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub root: Option<PathBuf>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      git_url: DEFAULT_GIT_URL.to_string(),
      svn_url: DEFAULT_SVN_URL.to_string(),
      branch: DEFAULT_BRANCH.to_string(),
      root: None,
    }
  }
}

impl Settings {
  /// Default location of the settings file.
  pub fn path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILENAME))
  }

  /// Load settings from the default location and the environment.
  pub fn load() -> Result<Self, ConfigError> {
    Self::load_from(&Self::path()?)
  }

  /// The configured checkout directory, or `{data_dir}/sources`.
  pub fn checkout_root(&self) -> Result<PathBuf, ConfigError> {
    match &self.root {
      Some(root) => Ok(root.clone()),
      None => Ok(data_dir()?.join("sources")),
    }
  }

  /// Load settings from `path` and the environment. A missing file means
  /// defaults.
  pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
    let mut settings = match fs::read_to_string(path) {
      Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
      })?,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no config file, using defaults");
        Self::default()
      }
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    settings.apply_env();
    Ok(settings)
  }

  fn apply_env(&mut self) {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

    if let Some(url) = var(ENV_GIT_URL) {
      self.git_url = url;
    }
    if let Some(url) = var(ENV_SVN_URL) {
      self.svn_url = url;
    }
    if let Some(branch) = var(ENV_BRANCH) {
      self.branch = branch;
    }
    if let Some(root) = var(ENV_ROOT) {
      self.root = Some(PathBuf::from(root));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  const NO_OVERRIDES: [(&str, Option<&str>); 4] = [
    (ENV_GIT_URL, None),
    (ENV_SVN_URL, None),
    (ENV_BRANCH, None),
    (ENV_ROOT, None),
  ];

  #[test]
  #[serial]
  fn missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();

    temp_env::with_vars(NO_OVERRIDES, || {
      let settings = Settings::load_from(&temp.path().join("config.json")).unwrap();
      assert_eq!(settings.git_url, DEFAULT_GIT_URL);
      assert_eq!(settings.svn_url, DEFAULT_SVN_URL);
      assert_eq!(settings.branch, "main");
    });
  }

  #[test]
  #[serial]
  fn file_overrides_only_the_keys_it_sets() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, r#"{ "branch": "blender-v2.80-release" }"#).unwrap();

    temp_env::with_vars(NO_OVERRIDES, || {
      let settings = Settings::load_from(&path).unwrap();
      assert_eq!(settings.branch, "blender-v2.80-release");
      assert_eq!(settings.git_url, DEFAULT_GIT_URL);
    });
  }

  #[test]
  #[serial]
  fn environment_beats_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, r#"{ "git_url": "https://file.example/blender.git" }"#).unwrap();

    temp_env::with_vars(
      [
        (ENV_GIT_URL, Some("https://env.example/blender.git")),
        (ENV_ROOT, Some("/srv/blender")),
        (ENV_BRANCH, Some("")),
      ],
      || {
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.git_url, "https://env.example/blender.git");
        assert_eq!(settings.checkout_root().unwrap(), PathBuf::from("/srv/blender"));
        assert_eq!(settings.branch, "main");
      },
    );
  }

  #[test]
  #[serial]
  fn malformed_file_is_a_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    let err = Settings::load_from(&path).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.json"));
  }

  #[test]
  #[serial]
  #[cfg(not(windows))]
  fn default_root_follows_data_dir() {
    temp_env::with_vars([("XDG_DATA_HOME", Some("/data"))], || {
      assert_eq!(Settings::default().checkout_root().unwrap(), PathBuf::from("/data/bpybuild/sources"));
    });
  }

  #[test]
  #[serial]
  #[cfg(not(windows))]
  fn missing_home_is_reported_not_fatal() {
    temp_env::with_vars(
      [
        ("XDG_CONFIG_HOME", None::<&str>),
        ("XDG_DATA_HOME", None::<&str>),
        ("HOME", None::<&str>),
      ],
      || {
        let err = Settings::load().unwrap_err();
        assert!(matches!(err, ConfigError::Dir(DirError { var: "HOME" })));
        assert!(Settings::default().checkout_root().is_err());
      },
    );
  }
}
