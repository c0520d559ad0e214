//! Distribution package assembly.
//!
//! Turns the compiled binary plus its data into `.deb` and Arch packages by
//! staging a filesystem tree and handing it to the native packaging tool.
//! Packaging is best effort: a missing tool skips the format and a failing
//! tool fails it, and neither changes the outcome of the build itself.

pub mod builder;
pub mod error;
pub mod platform;
pub mod settings;
pub mod utils;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

pub use builder::{Bundler, ToolLocator, calculate_sha256};
pub use error::{Error, Result};
pub use platform::PackageFormat;
pub use settings::{
    Arch, DataFile, PAYLOAD_INSTALL_NAME, PackageSettings, Settings, SettingsBuilder,
    StagedData,
};

/// A package written to disk.
#[derive(Clone, Debug, Serialize)]
pub struct PackageArtifact {
    /// Format of the package.
    pub format: PackageFormat,
    /// Location of the package file.
    pub path: PathBuf,
    /// Packaged version.
    pub version: String,
    /// Packaged architecture.
    pub arch: Arch,
    /// Size in bytes.
    pub size: u64,
    /// Hex SHA-256 of the file.
    pub checksum: String,
}

/// Result of assembling one format.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AssemblyOutcome {
    /// The package was built.
    Built(PackageArtifact),
    /// The packaging tool is not installed.
    Skipped {
        /// Format that was skipped.
        format: PackageFormat,
        /// Tool that was looked for.
        tool: String,
    },
    /// The packaging tool ran and failed, or staging failed.
    Failed {
        /// Format that failed.
        format: PackageFormat,
        /// Error message.
        reason: String,
    },
}

impl AssemblyOutcome {
    /// Format this outcome is for.
    pub fn format(&self) -> PackageFormat {
        match self {
            AssemblyOutcome::Built(artifact) => artifact.format,
            AssemblyOutcome::Skipped { format, .. } | AssemblyOutcome::Failed { format, .. } => {
                *format
            }
        }
    }

    /// The artifact, if one was built.
    pub fn artifact(&self) -> Option<&PackageArtifact> {
        match self {
            AssemblyOutcome::Built(artifact) => Some(artifact),
            _ => None,
        }
    }
}

impl fmt::Display for AssemblyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyOutcome::Built(a) => write!(
                f,
                "{}: {} ({} bytes, sha256 {})",
                a.format,
                a.path.display(),
                a.size,
                a.checksum
            ),
            AssemblyOutcome::Skipped { format, tool } => {
                write!(f, "{format}: skipped ({tool} not found)")
            }
            AssemblyOutcome::Failed { format, reason } => write!(f, "{format}: failed ({reason})"),
        }
    }
}
