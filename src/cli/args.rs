//! Command line argument parsing and validation.
//!
//! Enum-valued options are checked by clap at parse time; everything that
//! needs the file system or `pyproject.toml` is resolved in
//! [`Args::into_config`].

use crate::bundler::PackageFormat;
use crate::config::{BuildConfig, BundleRoots, DEFAULT_ALWAYS_BUNDLE, DEFAULT_VERSION, JitMode, ProjectLayout, TargetPlatform};
use crate::error::ConfigError;
use crate::metadata::ProjectMetadata;
use clap::Parser;
use std::path::PathBuf;

/// Build and package a Python project with Nuitka
#[derive(Parser, Debug)]
#[command(
    name = "pyship",
    version,
    about = "Build and package a Python project with Nuitka",
    long_about = "Compiles a Python project into a standalone binary with Nuitka, optionally \
encrypts its bundled data, and assembles .deb and .pkg.tar.zst packages.

Usage:
  pyship --version-string 2.3.1
  pyship --project-dir ./app --encrypt-data --format deb
  pyship --stream --jit auto --no-package

Exit code 0 = the compiler succeeded. Packaging skips never change the exit code."
)]
pub struct Args {
    /// Encrypt the bundled data directories into payload.enc
    #[arg(long)]
    pub encrypt_data: bool,

    /// Compress the onefile binary (ignored for Windows targets)
    #[arg(long)]
    pub compress: bool,

    /// Package version
    #[arg(long, visible_alias = "pkg-version", value_name = "VERSION")]
    pub version_string: Option<String>,

    /// Stream compiler output as it is produced
    #[arg(long)]
    pub stream: bool,

    /// How to handle the torch JIT
    #[arg(long, value_enum, default_value_t = JitMode::Disable)]
    pub jit: JitMode,

    /// Project root
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Python interpreter used to run `-m nuitka`
    #[arg(long, value_name = "EXE")]
    pub python: Option<PathBuf>,

    /// Data directory to bundle regardless of detection (repeatable)
    #[arg(long = "always-bundle", value_name = "DIR")]
    pub always_bundle: Vec<String>,

    /// Package format to assemble (repeatable; default: all)
    #[arg(long = "format", value_enum, value_name = "FORMAT")]
    pub formats: Vec<PackageFormat>,

    /// Skip package assembly
    #[arg(long, conflicts_with = "formats")]
    pub no_package: bool,

    /// Platform to choose compiler flags for (default: host)
    #[arg(long, value_enum, value_name = "PLATFORM")]
    pub target: Option<TargetPlatform>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Resolves the run configuration against the project's `pyproject.toml`.
    ///
    /// Command line values win over `[tool.pyship]`, which wins over
    /// `[project]`. The result is validated before it is returned.
    pub fn into_config(self) -> Result<BuildConfig, ConfigError> {
        let root = self.project_dir;
        if !root.is_dir() {
            return Err(ConfigError::MissingProjectDir(root));
        }
        let metadata = ProjectMetadata::load(&root)?;
        if let Some(source) = &metadata.source {
            log::debug!("Loaded project metadata from {}", source.display());
        }

        let mut layout = ProjectLayout::new(&root);
        if let Some(entry) = &metadata.tool.entry {
            layout.entry = entry.clone();
        }
        if let Some(output_name) = &metadata.tool.output_name {
            layout.output_name = output_name.clone();
        }
        layout.always_bundle = if !self.always_bundle.is_empty() {
            BundleRoots::new(&self.always_bundle)
        } else if let Some(roots) = &metadata.tool.always_bundle {
            BundleRoots::new(roots)
        } else {
            BundleRoots::new(DEFAULT_ALWAYS_BUNDLE)
        };

        let version = self
            .version_string
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let formats = if self.no_package {
            Vec::new()
        } else if self.formats.is_empty() {
            PackageFormat::ALL.to_vec()
        } else {
            let mut formats = self.formats;
            formats.sort();
            formats.dedup();
            formats
        };

        let config = BuildConfig {
            package: metadata.package_settings(&root, &version),
            layout,
            python: self.python.unwrap_or_else(default_python),
            platform: self.target.unwrap_or_else(TargetPlatform::host),
            encrypt_data: self.encrypt_data,
            compression: self.compress,
            version,
            stream_output: self.stream,
            jit_mode: self.jit,
            formats,
        };
        config.validate()?;
        Ok(config)
    }
}

fn default_python() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("python")
    } else {
        PathBuf::from("python3")
    }
}
