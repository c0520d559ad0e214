//! External tool detection and availability checking.

use std::ffi::OsString;
use std::path::PathBuf;

/// Finds packaging tools on a search path.
///
/// Defaults to the process `PATH`; tests substitute their own directory.
#[derive(Clone, Debug, Default)]
pub struct ToolLocator {
    search_path: Option<OsString>,
}

impl ToolLocator {
    /// Locator over the process `PATH`.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Locator over an explicit search path (`:`-separated on Unix).
    pub fn with_search_path(path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(path.into()),
        }
    }

    /// Absolute path of `tool`, or `None` if it is not installed.
    pub fn locate(&self, tool: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_default();
                which::which_in(tool, Some(paths), cwd)
            }
            None => which::which(tool),
        };

        match found {
            Ok(path) => {
                log::debug!("Found {} at: {}", tool, path.display());
                Some(path)
            }
            Err(e) => {
                log::debug!("{} not found in PATH: {}", tool, e);
                None
            }
        }
    }
}
