//! Error types for orchestrator runs.
//!
//! Only two conditions end a run: a [`ConfigError`] detected before any
//! subprocess starts, and a [`ToolchainFailure`] from the compiler. Packaging
//! skips and an empty encryption selection are logged where they happen and
//! never reach this module.

use crate::diagnostics::CrashReport;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code used for configuration errors (matches clap's usage error code).
pub const CONFIG_EXIT_CODE: i32 = 2;

/// Exit code reported when the compiler could not be launched at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Main error type for a pipeline run
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration, detected before the compiler runs
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The compiler failed
    #[error(transparent)]
    Toolchain(#[from] Box<ToolchainFailure>),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The data payload could not be built
    #[error("payload error: {0}")]
    Payload(#[from] crate::payload::PayloadError),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Process exit code this error maps to.
    ///
    /// A toolchain failure mirrors the compiler's own exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => CONFIG_EXIT_CODE,
            Error::Toolchain(failure) => failure.exit_code,
            _ => 1,
        }
    }
}

impl From<ToolchainFailure> for Error {
    fn from(failure: ToolchainFailure) -> Self {
        Error::Toolchain(Box::new(failure))
    }
}

/// Invalid or unrecognized configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An option value failed validation
    #[error("invalid value {value:?} for {option}: {reason}")]
    InvalidOption {
        /// Option name
        option: &'static str,
        /// Rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A line of the ignore file is not a valid pattern
    #[error("{}:{line}: invalid ignore pattern {pattern:?}: {reason}", path.display())]
    IgnorePattern {
        /// Ignore file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Offending pattern
        pattern: String,
        /// Parser message
        reason: String,
    },

    /// The ignore file exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    IgnoreFile {
        /// Ignore file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// `pyproject.toml` could not be read or parsed
    #[error("failed to load {}: {reason}", path.display())]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// The project root is missing or not a directory
    #[error("project directory {} does not exist", .0.display())]
    MissingProjectDir(PathBuf),

    /// The entry file is missing
    #[error("entry file {} does not exist", .0.display())]
    MissingEntry(PathBuf),
}

/// The external compiler exited non-zero or could not be started.
///
/// Carries everything the operator needs to diagnose the failure without
/// re-running: the captured streams and any crash reports found in the
/// build directory.
#[derive(Error, Debug)]
#[error("{command} failed with exit code {exit_code}")]
pub struct ToolchainFailure {
    /// Program that was run
    pub command: String,
    /// Exit code to propagate (never 0)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Crash reports left in the build directory
    pub crash_reports: Vec<CrashReport>,
}
