//! Shared constants.

pub const APP_NAME: &str = "bpybuild";

/// Git remote holding the Blender source tree.
pub const DEFAULT_GIT_URL: &str = "https://projects.blender.org/blender/blender.git";

/// Svn root holding the precompiled libraries (`tags/`, `trunk/`).
pub const DEFAULT_SVN_URL: &str = "https://svn.blender.org/svnroot/bf-blender";

/// Branch the code checkout returns to before pulling.
pub const DEFAULT_BRANCH: &str = "main";

/// Settings file name inside the config directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Entries of a library tag's `lib/` directory that are not platform bundles.
pub const NON_PLATFORM_DIRS: &[&str] = &["benchmarks", "package", "python", "tests"];
