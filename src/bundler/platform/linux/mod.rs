//! Linux package assemblers.
//!
//! Both formats install the same tree:
//!
//! ```text
//! usr/bin/<name>                 compiled binary (0755)
//! usr/share/<name>/<data file>  plain data files, or
//! usr/share/<name>/payload.enc   the encrypted payload
//! ```

pub mod debian;
pub mod pacman;

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    settings::{PAYLOAD_INSTALL_NAME, Settings, StagedData},
    utils::fs,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;

/// Copies the binary and data into `root`.
pub(crate) async fn stage_filesystem(settings: &Settings, root: &Path) -> Result<()> {
    let name = settings.product_name();

    let bin_dir = root.join("usr/bin");
    tokio::fs::create_dir_all(&bin_dir)
        .await
        .fs_context("creating staging directory", &bin_dir)?;
    let binary = bin_dir.join(name);
    fs::copy_file(settings.binary_path(), &binary).await?;
    fs::set_mode(&binary, 0o755).await?;

    let share = share_dir(root, name);
    match settings.data() {
        StagedData::Files(files) => {
            log::debug!("Staging {} data files", files.len());
            for file in files {
                fs::copy_file(&file.source, &share.join(&file.rel)).await?;
            }
        }
        StagedData::EncryptedPayload(payload) => {
            log::debug!("Staging encrypted payload {}", payload.display());
            fs::copy_file(payload, &share.join(PAYLOAD_INSTALL_NAME)).await?;
        }
    }

    Ok(())
}

/// `usr/share/<name>` below `root`.
pub(crate) fn share_dir(root: &Path, name: &str) -> PathBuf {
    root.join("usr/share").join(name)
}

/// Runs a packaging tool, turning a non-zero exit into [`Error::ToolFailed`]
/// with whatever the tool printed.
pub(crate) async fn run_packaging_tool(mut cmd: Command, tool: &str) -> Result<()> {
    log::debug!("Running {tool}: {cmd:?}");

    let output = cmd.output().await.map_err(|error| Error::CommandFailed {
        command: tool.to_string(),
        error,
    })?;

    if !output.status.success() {
        let mut diagnostics = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            if !diagnostics.is_empty() {
                diagnostics.push('\n');
            }
            diagnostics.push_str(stdout.trim());
        }
        return Err(Error::ToolFailed {
            command: tool.to_string(),
            code: output.status.code(),
            stderr: diagnostics,
        });
    }

    Ok(())
}

/// Creates a fresh staging directory, removed when the guard drops.
pub(crate) fn staging_tempdir(settings: &Settings, prefix: &str) -> Result<TempDir> {
    let base = settings
        .staging_directory()
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(&base)
        .fs_context("creating staging directory", &base)
}

/// Creates the staging root inside `temp` with conventional permissions.
///
/// Temporary directories are created 0700; packaging tools copy the root's
/// mode into the package, so stage one level down.
pub(crate) async fn create_stage_root(temp: &Path, name: &str) -> Result<PathBuf> {
    let root = temp.join(name);
    tokio::fs::create_dir_all(&root)
        .await
        .fs_context("creating staging root", &root)?;
    fs::set_mode(&root, 0o755).await?;
    Ok(root)
}
