//! Errors surfaced to callers of the resolver and checkout operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::platform::bitness::Bitness;
use crate::platform::os::OsFamily;
use crate::platform::python::RuntimeVersion;
use crate::remote::RemoteError;
use crate::sources::Origin;

/// Errors that can occur while resolving or checking out Blender sources.
#[derive(Debug, Error)]
pub enum Error {
  /// The requested version is not present in either repository.
  #[error("Blender version '{version}' does not exist")]
  VersionNotFound { version: String },

  /// A remote could not be reached. Not retried; callers may try again.
  #[error("repository '{url}' is unavailable: {reason}")]
  RepositoryUnavailable { url: String, reason: String },

  /// The version exists but ships no libraries usable on the target.
  #[error("Blender {version} has no platform libraries for {os} {bitness} with Python {runtime}")]
  IncompatiblePlatform {
    version: String,
    os: OsFamily,
    bitness: Bitness,
    runtime: RuntimeVersion,
  },

  /// Windows libraries were found but none names the toolchain they target.
  #[error("Blender {version} has no toolchain-specific libraries for {os} {bitness}")]
  AmbiguousToolchain {
    version: String,
    os: OsFamily,
    bitness: Bitness,
  },

  /// The version lacks the tag on one side.
  #[error("Blender {version} cannot be built: it has no {missing} repository tag")]
  Unbuildable { version: String, missing: Origin },

  /// No Python interpreter was found and no runtime version was given.
  #[error("no Python interpreter found; specify the target Python version explicitly")]
  RuntimeUndetected,

  /// Failed to create a checkout directory.
  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Any other remote failure.
  #[error(transparent)]
  Remote(RemoteError),
}

impl From<RemoteError> for Error {
  fn from(err: RemoteError) -> Self {
    match err {
      RemoteError::Unavailable { url, reason } => Error::RepositoryUnavailable { url, reason },
      other => Error::Remote(other),
    }
  }
}
