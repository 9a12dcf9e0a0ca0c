use crate::consts::APP_NAME;
use std::path::PathBuf;

use thiserror::Error;

/// A per-user directory could not be located.
#[derive(Debug, Error)]
#[error("cannot locate the user directories: environment variable {var} is not set")]
pub struct DirError {
  pub var: &'static str,
}

fn env_dir(var: &'static str) -> Result<PathBuf, DirError> {
  std::env::var_os(var)
    .filter(|v| !v.is_empty())
    .map(PathBuf::from)
    .ok_or(DirError { var })
}

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Result<PathBuf, DirError> {
  env_dir("USERPROFILE")
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Result<PathBuf, DirError> {
  env_dir("HOME")
}

/// Returns the directory for configuration files for the application
#[cfg(windows)]
pub fn config_dir() -> Result<PathBuf, DirError> {
  Ok(env_dir("APPDATA")?.join(APP_NAME))
}

/// Returns the directory for configuration files for the application
#[cfg(not(windows))]
pub fn config_dir() -> Result<PathBuf, DirError> {
  let config_home = match env_dir("XDG_CONFIG_HOME") {
    Ok(dir) => dir,
    Err(_) => home_dir()?.join(".config"),
  };
  Ok(config_home.join(APP_NAME))
}

/// Returns the directory holding checked-out sources
#[cfg(windows)]
pub fn data_dir() -> Result<PathBuf, DirError> {
  Ok(env_dir("LOCALAPPDATA")?.join(APP_NAME))
}

/// Returns the directory holding checked-out sources
#[cfg(not(windows))]
pub fn data_dir() -> Result<PathBuf, DirError> {
  let data_home = match env_dir("XDG_DATA_HOME") {
    Ok(dir) => dir,
    Err(_) => home_dir()?.join(".local").join("share"),
  };
  Ok(data_home.join(APP_NAME))
}
