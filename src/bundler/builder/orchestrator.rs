//! Main bundler orchestration and coordination.
//!
//! This module provides the [`Bundler`] orchestrator that runs each selected
//! format's assembler and turns the result into an [`AssemblyOutcome`].

use crate::bundler::{
    AssemblyOutcome, PackageArtifact, PackageFormat, Result, Settings, error::ErrorExt,
    platform::linux,
};
use std::path::{Path, PathBuf};

use super::{checksum::calculate_sha256, tool_detection::ToolLocator};

/// Main bundler orchestrator.
///
/// Assembles every format in [`Settings::package_formats`], in order. A
/// missing packaging tool skips the format; a failing tool fails it. Neither
/// stops the remaining formats.
///
/// # Examples
///
/// ```no_run
/// use pyship::bundler::{Bundler, Settings, ToolLocator};
///
/// # async fn example(settings: Settings) {
/// let bundler = Bundler::new(settings, ToolLocator::from_env());
/// for outcome in bundler.bundle().await {
///     println!("{outcome}");
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct Bundler {
    settings: Settings,
    tools: ToolLocator,
}

impl Bundler {
    /// Creates a new bundler with the given settings and tool lookup.
    pub fn new(settings: Settings, tools: ToolLocator) -> Self {
        Self { settings, tools }
    }

    /// Assembles every selected format.
    pub async fn bundle(&self) -> Vec<AssemblyOutcome> {
        let mut outcomes = Vec::new();
        for format in self.settings.package_formats() {
            outcomes.push(self.bundle_format(*format).await);
        }
        outcomes
    }

    /// Assembles one format.
    pub async fn bundle_format(&self, format: PackageFormat) -> AssemblyOutcome {
        let tool = format.required_tool();
        let Some(tool_path) = self.tools.locate(tool) else {
            log::warn!("{tool} not found on PATH; skipping {format} package");
            return AssemblyOutcome::Skipped {
                format,
                tool: tool.to_string(),
            };
        };

        let built = match format {
            PackageFormat::Deb => linux::debian::bundle_project(&self.settings, &tool_path).await,
            PackageFormat::Arch => linux::pacman::bundle_project(&self.settings, &tool_path).await,
        };

        match built {
            Ok(path) => match self.describe(format, path).await {
                Ok(artifact) => AssemblyOutcome::Built(artifact),
                Err(e) => failed(format, e),
            },
            Err(e) => failed(format, e),
        }
    }

    /// Returns a reference to the bundler settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    async fn describe(&self, format: PackageFormat, path: PathBuf) -> Result<PackageArtifact> {
        let size = artifact_size(&path).await?;
        let checksum = calculate_sha256(&path).await?;
        Ok(PackageArtifact {
            format,
            path,
            version: self.settings.version_string().to_string(),
            arch: self.settings.binary_arch(),
            size,
            checksum,
        })
    }
}

async fn artifact_size(path: &Path) -> Result<u64> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading artifact metadata", path)?;
    Ok(metadata.len())
}

fn failed(format: PackageFormat, error: crate::bundler::Error) -> AssemblyOutcome {
    log::error!("Failed to build {format} package: {error}");
    AssemblyOutcome::Failed {
        format,
        reason: error.to_string(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::bundler::{Arch, PackageSettings, SettingsBuilder};
    use std::os::unix::fs::PermissionsExt;

    fn settings(work: &Path) -> Settings {
        let binary = work.join("EXECUTABLE");
        std::fs::write(&binary, b"bin").unwrap();
        SettingsBuilder::new()
            .project_out_directory(work.join("dist"))
            .binary(binary)
            .package_settings(PackageSettings {
                product_name: "voicebox".into(),
                version: "2.3.1".into(),
                maintainer: "Jane Doe <jane@example.com>".into(),
                license: "MIT".into(),
                ..Default::default()
            })
            .arch(Arch::X86_64)
            .build()
            .unwrap()
    }

    fn install_tool(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn missing_tools_skip_every_format() {
        let work = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        let bundler = Bundler::new(settings(work.path()), ToolLocator::with_search_path(empty.path()));

        let outcomes = bundler.bundle().await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| matches!(o, AssemblyOutcome::Skipped { .. })));
        assert!(!work.path().join("dist").exists());
    }

    #[tokio::test]
    async fn built_artifact_is_measured_and_hashed_and_failures_do_not_stop_others() {
        let work = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        install_tool(tools.path(), "dpkg-deb", "printf abc > \"$4\"");
        install_tool(tools.path(), "makepkg", "echo 'cannot run as root' >&2; exit 1");

        let bundler = Bundler::new(settings(work.path()), ToolLocator::with_search_path(tools.path()));
        let outcomes = bundler.bundle().await;

        match &outcomes[0] {
            AssemblyOutcome::Built(artifact) => {
                assert_eq!(artifact.format, PackageFormat::Deb);
                assert_eq!(artifact.size, 3);
                assert_eq!(
                    artifact.checksum,
                    "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
                );
                assert!(artifact.path.ends_with("voicebox_2.3.1_amd64.deb"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        match &outcomes[1] {
            AssemblyOutcome::Failed { format, reason } => {
                assert_eq!(*format, PackageFormat::Arch);
                assert!(reason.contains("cannot run as root"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
