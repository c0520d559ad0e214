//! Run configuration.
//!
//! [`BuildConfig`] is resolved once by the CLI and then only ever borrowed.
//! Fixed project names (entry, output name, pruned directory names) live in
//! [`ProjectLayout`] so that tests can build arbitrary layouts.

use crate::bundler::{PackageFormat, PackageSettings};
use crate::error::ConfigError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default package version when none is given.
pub const DEFAULT_VERSION: &str = "0.1.0";

/// Directory names pruned during scanning before the ignore file is consulted.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".idea",
    ".vscode",
    "build",
    "dist",
    "venv",
    "env",
    ".nuitka",
    ".vs",
    ".venv",
    "tests",
    "docs",
    ".github",
];

/// Data roots bundled when neither the command line nor pyproject names any.
pub const DEFAULT_ALWAYS_BUNDLE: &[&str] = &["assets", "data", "models", "resources"];

/// How the compiler should treat the torch JIT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JitMode {
    /// Leave the decision to the toolchain.
    Auto,
    /// Keep the JIT enabled.
    Enable,
    /// Disable the JIT in the produced binary.
    #[default]
    Disable,
}

/// Platform the compiler flags are chosen for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    /// Windows (MSVC toolchain).
    Windows,
    /// Linux (clang).
    Linux,
    /// macOS (clang).
    Macos,
}

impl TargetPlatform {
    /// Platform this process runs on. Unknown Unix flavours are treated as Linux.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            TargetPlatform::Windows
        } else if cfg!(target_os = "macos") {
            TargetPlatform::Macos
        } else {
            TargetPlatform::Linux
        }
    }

    /// Whether this is the Windows target.
    pub fn is_windows(self) -> bool {
        self == TargetPlatform::Windows
    }
}

/// Data directories that must ship regardless of auto-detection.
///
/// A path matches a root when it equals the root or lies below it
/// (`root` or `root/...`). Roots are stored `/`-separated without a trailing
/// slash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BundleRoots(Vec<String>);

impl BundleRoots {
    /// Normalizes and de-duplicates the given roots, keeping first-seen order.
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for root in roots {
            let normalized = normalize_rel(root.as_ref());
            if normalized.is_empty() {
                continue;
            }
            if seen.insert(normalized.clone()) {
                out.push(normalized);
            }
        }
        Self(out)
    }

    /// Whether `path` is one of the roots or lies under one.
    pub fn matches(&self, path: &str) -> bool {
        self.0.iter().any(|root| {
            path == root
                || path
                    .strip_prefix(root.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Iterates over the roots in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether no roots are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Converts a relative path to the `/`-separated form used in scan results.
pub fn normalize_rel(path: &str) -> String {
    path.replace('\\', "/")
        .trim_start_matches("./")
        .trim_matches('/')
        .to_string()
}

/// Fixed names and locations of a project.
#[derive(Clone, Debug, Serialize)]
pub struct ProjectLayout {
    /// Project root; everything else is relative to it.
    pub root: PathBuf,
    /// Entry script, passed last to the compiler.
    pub entry: String,
    /// Name of the produced binary.
    pub output_name: String,
    /// Compiler output directory, relative to the root.
    pub build_dir: String,
    /// Directory names pruned during scanning.
    pub excluded_dirs: BTreeSet<String>,
    /// Extension of source files; anything else counts as data.
    pub code_extension: String,
    /// Marker file that makes a directory a package.
    pub package_marker: String,
    /// Ignore file read from the root.
    pub ignore_file: String,
    /// Always-bundle data roots.
    pub always_bundle: BundleRoots,
}

impl ProjectLayout {
    /// Layout with the stock names rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entry: "main.py".to_string(),
            output_name: "EXECUTABLE".to_string(),
            build_dir: "build".to_string(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            code_extension: "py".to_string(),
            package_marker: "__init__.py".to_string(),
            ignore_file: ".gitignore".to_string(),
            always_bundle: BundleRoots::new(DEFAULT_ALWAYS_BUNDLE),
        }
    }

    /// Absolute build directory.
    pub fn build_path(&self) -> PathBuf {
        self.root.join(&self.build_dir)
    }

    /// Absolute path of the entry script.
    pub fn entry_path(&self) -> PathBuf {
        self.root.join(&self.entry)
    }

    /// Absolute path of the ignore file.
    pub fn ignore_path(&self) -> PathBuf {
        self.root.join(&self.ignore_file)
    }

    /// Resolves a root-relative, `/`-separated path.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        rel.split('/').fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

/// Immutable options for one orchestrator run.
#[derive(Clone, Debug, Serialize)]
pub struct BuildConfig {
    /// Project names and locations.
    pub layout: ProjectLayout,
    /// Python interpreter used to run `-m nuitka`.
    pub python: PathBuf,
    /// Platform the compiler flags target.
    pub platform: TargetPlatform,
    /// Encrypt the bundled data payload after the build.
    pub encrypt_data: bool,
    /// Request onefile compression (ignored on Windows).
    pub compression: bool,
    /// Package version.
    pub version: String,
    /// Stream compiler output instead of capturing it.
    pub stream_output: bool,
    /// JIT handling.
    pub jit_mode: JitMode,
    /// Package formats to assemble; empty disables packaging.
    pub formats: Vec<PackageFormat>,
    /// Package metadata.
    #[serde(skip)]
    pub package: PackageSettings,
}

impl BuildConfig {
    /// Checks option values that clap cannot validate on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_version(&self.version)?;
        if !self.layout.root.is_dir() {
            return Err(ConfigError::MissingProjectDir(self.layout.root.clone()));
        }
        let entry = self.layout.entry_path();
        if !entry.is_file() {
            return Err(ConfigError::MissingEntry(entry));
        }
        validate_package_name(&self.package.product_name)?;
        Ok(())
    }

    /// Absolute build directory.
    pub fn build_dir(&self) -> PathBuf {
        self.layout.build_path()
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.layout.root
    }
}

/// Versions end up in deb and pacman file names, so both formats' rules apply.
pub fn validate_version(version: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidOption {
        option: "--version-string",
        value: version.to_string(),
        reason: reason.to_string(),
    };

    if version.is_empty() {
        return Err(invalid("version must not be empty"));
    }
    if !version.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("version must start with a digit"));
    }
    if version.contains('-') {
        return Err(invalid("'-' is reserved for the package release number"));
    }
    if let Some(bad) = version
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '~' | '_')))
    {
        return Err(invalid(&format!("character {bad:?} is not allowed")));
    }
    Ok(())
}

/// Package names follow the Debian rules, which are stricter than pacman's.
pub fn validate_package_name(name: &str) -> Result<(), ConfigError> {
    let valid = name.len() >= 2
        && name.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidOption {
            option: "package name",
            value: name.to_string(),
            reason: "use at least two lowercase letters, digits, '+', '-' or '.'".to_string(),
        })
    }
}

/// Derives a valid package name from an arbitrary project name.
pub fn sanitize_package_name(raw: &str) -> String {
    let mut name: String = raw
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    name = name.trim_matches(|c: char| !c.is_ascii_alphanumeric()).to_string();
    if name.len() < 2 {
        name = format!("app{name}");
    }
    name
}
