//! Core Settings struct and implementations.

use super::{Arch, PackageSettings, StagedData};
use crate::bundler::PackageFormat;
use std::path::{Path, PathBuf};

/// Section used when none is configured.
const DEFAULT_SECTION: &str = "misc";

/// Main settings for package assembly.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder).
///
/// # Examples
///
/// ```no_run
/// use pyship::bundler::{PackageSettings, SettingsBuilder};
///
/// # fn example() -> pyship::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .project_out_directory("build")
///     .binary("build/EXECUTABLE")
///     .package_settings(PackageSettings {
///         product_name: "myapp".into(),
///         version: "1.0.0".into(),
///         ..Default::default()
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Package metadata.
    package: PackageSettings,

    /// Compiled binary to install.
    binary: PathBuf,

    /// Data installed next to the binary.
    data: StagedData,

    /// Directory the finished packages are written to.
    project_out_directory: PathBuf,

    /// Formats to assemble, in order.
    package_formats: Vec<PackageFormat>,

    /// Architecture of the binary.
    arch: Arch,

    /// Parent of the per-format staging directories; the system temp dir
    /// when unset.
    staging_directory: Option<PathBuf>,
}

impl Settings {
    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.package.product_name
    }

    /// Returns the version string.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Returns the package description.
    pub fn description(&self) -> &str {
        &self.package.description
    }

    /// Returns the maintainer.
    pub fn maintainer(&self) -> &str {
        &self.package.maintainer
    }

    /// Returns the license identifier.
    pub fn license(&self) -> &str {
        &self.package.license
    }

    /// Returns the package homepage URL.
    pub fn homepage(&self) -> Option<&str> {
        self.package.homepage.as_deref()
    }

    /// Returns the Debian section, `misc` when unset.
    pub fn section(&self) -> &str {
        self.package.section.as_deref().unwrap_or(DEFAULT_SECTION)
    }

    /// Returns the Debian dependencies.
    pub fn depends(&self) -> &[String] {
        &self.package.depends
    }

    /// Returns the path of the compiled binary.
    pub fn binary_path(&self) -> &Path {
        &self.binary
    }

    /// Returns the data to stage next to the binary.
    pub fn data(&self) -> &StagedData {
        &self.data
    }

    /// Returns the directory packages are written to.
    pub fn project_out_directory(&self) -> &Path {
        &self.project_out_directory
    }

    /// Returns the formats to assemble.
    pub fn package_formats(&self) -> &[PackageFormat] {
        &self.package_formats
    }

    /// Returns the binary architecture.
    pub fn binary_arch(&self) -> Arch {
        self.arch
    }

    /// Returns where staging directories are created, if overridden.
    pub fn staging_directory(&self) -> Option<&Path> {
        self.staging_directory.as_deref()
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(
        package: PackageSettings,
        binary: PathBuf,
        data: StagedData,
        project_out_directory: PathBuf,
        package_formats: Vec<PackageFormat>,
        arch: Arch,
        staging_directory: Option<PathBuf>,
    ) -> Self {
        Self {
            package,
            binary,
            data,
            project_out_directory,
            package_formats,
            arch,
            staging_directory,
        }
    }
}
