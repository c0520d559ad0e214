//! Error types for package assembly.
//!
//! Packaging failures never abort a run on their own; the orchestrator turns
//! them into a failed [`AssemblyOutcome`](crate::bundler::AssemblyOutcome)
//! and keeps going. These types carry enough context to explain why.

use std::{fmt::Display, path::Path};

/// Errors raised while staging or building a package.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Bare I/O failure.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// I/O failure with the operation and path that caused it.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What was being done.
        context: &'static str,
        /// Path involved.
        path: std::path::PathBuf,
        /// Underlying error.
        error: std::io::Error,
    },

    /// Directory traversal failure.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// The packaging tool could not be launched.
    #[error("failed to run {command}: {error}")]
    CommandFailed {
        /// Tool name.
        command: String,
        /// Spawn error.
        error: std::io::Error,
    },

    /// The packaging tool ran and exited non-zero.
    #[error("{command} exited with code {code:?}: {stderr}")]
    ToolFailed {
        /// Tool name.
        command: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Captured diagnostic output.
        stderr: String,
    },

    /// Unsupported architecture for a package format.
    #[error("{0}")]
    ArchError(String),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

/// Convenient type alias of Result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Attach a message to an error or a missing value.
pub trait Context<T> {
    /// Convert into a [`Result`], replacing the error with `msg`.
    fn context<C>(self, msg: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, msg: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, msg: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

/// Attach filesystem context to I/O results.
pub trait ErrorExt<T> {
    /// Tag an I/O error with the operation and the path it touched.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
