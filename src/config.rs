//! Spool location configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default location of the spool directory relative to the base directory.
pub const DEFAULT_SPOOL_SUBDIR: &str = "outbox/commands";

fn default_subpath() -> PathBuf {
    PathBuf::from(DEFAULT_SPOOL_SUBDIR)
}

/// Where the spool lives on disk.
///
/// Usually embedded in the host's own configuration file; only `base_dir` is
/// required there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpoolConfig {
    /// The host's variable-data directory (e.g. `/var/lib/agent`).
    pub base_dir: PathBuf,

    /// Path below `base_dir` holding the records.
    ///
    /// Default: `outbox/commands`.
    #[serde(default = "default_subpath")]
    pub subpath: PathBuf,
}

impl SpoolConfig {
    /// Creates a configuration using the default subpath.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        SpoolConfig {
            base_dir: base_dir.into(),
            subpath: default_subpath(),
        }
    }

    /// Sets a custom subpath below the base directory.
    pub fn with_subpath(mut self, subpath: impl Into<PathBuf>) -> Self {
        self.subpath = subpath.into();
        self
    }

    /// Returns the full spool directory path.
    pub fn spool_dir(&self) -> PathBuf {
        self.base_dir.join(&self.subpath)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
