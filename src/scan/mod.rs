//! Project tree scanning.
//!
//! Finds the top-level Python packages to compile in and the directories
//! holding runtime data, honouring the project's ignore file.

mod bundle;
mod ignore;
mod walker;

pub use bundle::{bundled_files, select_bundled};
pub use ignore::IgnoreSpec;
pub use walker::scan;

use serde::Serialize;
use std::fmt;

/// Root-relative directory containing the package marker file.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DetectedPackage(pub(crate) String);

/// Root-relative directory containing at least one non-code file.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DetectedDataDir(pub(crate) String);

impl DetectedPackage {
    /// Builds a package entry from a relative path.
    pub fn new(path: &str) -> Self {
        Self(crate::config::normalize_rel(path))
    }

    /// `/`-separated relative path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DetectedDataDir {
    /// Builds a data directory entry from a relative path.
    pub fn new(path: &str) -> Self {
        Self(crate::config::normalize_rel(path))
    }

    /// `/`-separated relative path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DetectedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DetectedDataDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sorted output of one scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Top-most packages.
    pub packages: Vec<DetectedPackage>,
    /// Data directories, including forced always-bundle roots.
    pub data_dirs: Vec<DetectedDataDir>,
}
