//! Package metadata and configuration.

/// Package metadata shared by every format.
///
/// Resolved from the command line and `pyproject.toml`; see
/// [`crate::metadata`] for precedence.
///
/// # Examples
///
/// ```no_run
/// use pyship::bundler::PackageSettings;
///
/// let settings = PackageSettings {
///     product_name: "myapp".into(),
///     version: "1.0.0".into(),
///     description: "An awesome application".into(),
///     maintainer: "Jane Doe <jane@example.com>".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct PackageSettings {
    /// Package name; also the installed binary name.
    ///
    /// Must satisfy Debian naming rules (lowercase, digits, `+-.`).
    pub product_name: String,

    /// Upstream version, without a release suffix.
    pub version: String,

    /// One-line summary.
    pub description: String,

    /// `Name <email>` of the maintainer.
    pub maintainer: String,

    /// License identifier for the Arch manifest.
    pub license: String,

    /// Homepage URL.
    ///
    /// Default: None
    pub homepage: Option<String>,

    /// Debian section.
    ///
    /// Default: None (`misc`)
    pub section: Option<String>,

    /// Debian dependencies, e.g. `libc6 (>= 2.31)`.
    pub depends: Vec<String>,
}
