//! Builder for constructing Settings.

use super::{Arch, PackageSettings, Settings, StagedData};
use crate::bundler::PackageFormat;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use pyship::bundler::{PackageFormat, PackageSettings, SettingsBuilder, StagedData};
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
///     .data(StagedData::EncryptedPayload("build/payload.enc".into()))
///     .package_formats(vec![PackageFormat::Deb])
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    project_out_directory: Option<PathBuf>,
    package_settings: Option<PackageSettings>,
    binary: Option<PathBuf>,
    data: StagedData,
    package_formats: Option<Vec<PackageFormat>>,
    arch: Option<Arch>,
    staging_directory: Option<PathBuf>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the directory finished packages are written to.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn project_out_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_out_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets package metadata.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn package_settings(mut self, settings: PackageSettings) -> Self {
        self.package_settings = Some(settings);
        self
    }

    /// Sets the compiled binary.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn binary<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.binary = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the data staged next to the binary.
    ///
    /// Default: no data directories
    pub fn data(mut self, data: StagedData) -> Self {
        self.data = data;
        self
    }

    /// Sets the formats to assemble.
    ///
    /// Default: every format in [`PackageFormat::ALL`]
    pub fn package_formats(mut self, formats: Vec<PackageFormat>) -> Self {
        self.package_formats = Some(formats);
        self
    }

    /// Sets the binary architecture.
    ///
    /// Default: host architecture
    pub fn arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    /// Sets the parent directory for staging trees.
    ///
    /// Default: the system temporary directory
    pub fn staging_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.staging_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or the host
    /// architecture cannot be packaged.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::Context;

        let arch = match self.arch {
            Some(arch) => arch,
            None => Arch::host()?,
        };

        Ok(Settings::new(
            self.package_settings
                .context("package_settings is required")?,
            self.binary.context("binary is required")?,
            self.data,
            self.project_out_directory
                .context("project_out_directory is required")?,
            self.package_formats
                .unwrap_or_else(|| PackageFormat::ALL.to_vec()),
            arch,
            self.staging_directory,
        ))
    }
}
