//! Build and packaging orchestrator for Python projects compiled with Nuitka.
//!
//! A run scans the project tree, synthesizes the compiler command, runs it,
//! optionally encrypts the bundled data and assembles native packages:
//! - Debian packages (.deb) via `dpkg-deb`
//! - Arch Linux packages (.pkg.tar.zst) via `makepkg`
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod metadata;
pub mod payload;
pub mod pipeline;
pub mod report;
pub mod scan;

// Re-export commonly used types
pub use config::BuildConfig;
pub use error::{ConfigError, Error, Result, ToolchainFailure};
pub use pipeline::{Pipeline, Prepared, RunOutcome};
