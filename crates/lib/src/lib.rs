//! bpybuild-lib: Source resolution for building Blender as a Python module
//!
//! Blender is built from two independently versioned trees:
//! - the git repository with the source code (`CodeRepo`)
//! - the svn repository with precompiled platform libraries (`LibraryRepo`)
//!
//! This crate finds the releases both trees carry, keeps those that ship
//! libraries for the caller's OS, word width and Python, and checks the
//! chosen one out.

pub mod checkout;
pub mod config;
pub mod consts;
pub mod descriptor;
pub mod error;
pub mod platform;
pub mod remote;
pub mod request;
pub mod resolve;
pub mod sources;
pub mod version;

#[cfg(test)]
mod testutil;

pub use error::Error;
