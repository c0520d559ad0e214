//! Nuitka command synthesis.
//!
//! Flags are collected as typed [`Flag`] records and rendered only when the
//! invocation is turned into an argument list, so tests can assert on what
//! was requested rather than on string positions.

use crate::config::{BuildConfig, JitMode, TargetPlatform};
use crate::scan::{DetectedDataDir, DetectedPackage};
use serde::Serialize;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// Imports never followed into the binary.
pub const NOFOLLOW_IMPORTS: &[&str] = &[
    "pytest",
    "unittest",
    "setuptools",
    "pip",
    "wheel",
    "distutils",
];

/// Module parameter the torch plugin reads to decide on the JIT.
pub const JIT_MODULE_PARAMETER: &str = "torch-disable-jit";

/// One compiler flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Flag {
    /// Build feature shared by every platform, rendered verbatim.
    Feature(String),
    /// Platform-specific toolchain selection, rendered verbatim.
    Platform(String),
    /// `--nofollow-import-to=<module>`
    NoFollowImport(String),
    /// `--module-parameter=<name>=<value>`
    ModuleParameter {
        /// Parameter name
        name: String,
        /// Parameter value
        value: String,
    },
    /// `--include-package=<package>`
    IncludePackage(String),
    /// `--include-data-dir=<source>=<dest>`
    IncludeDataDir {
        /// Directory on disk, relative to the project root
        source: String,
        /// Location inside the binary
        dest: String,
    },
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Feature(flag) | Flag::Platform(flag) => f.write_str(flag),
            Flag::NoFollowImport(module) => write!(f, "--nofollow-import-to={module}"),
            Flag::ModuleParameter { name, value } => {
                write!(f, "--module-parameter={name}={value}")
            }
            Flag::IncludePackage(pkg) => write!(f, "--include-package={pkg}"),
            Flag::IncludeDataDir { source, dest } => {
                write!(f, "--include-data-dir={source}={dest}")
            }
        }
    }
}

/// A fully determined compiler run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompilerInvocation {
    /// Interpreter executable.
    pub program: PathBuf,
    /// Arguments before the flags (`-m nuitka`).
    pub leading: Vec<String>,
    /// Ordered flags.
    pub flags: Vec<Flag>,
    /// Entry script, always last.
    pub entry: String,
}

impl CompilerInvocation {
    /// Arguments after the program name; the entry script is last.
    pub fn args(&self) -> Vec<String> {
        self.leading
            .iter()
            .cloned()
            .chain(self.flags.iter().map(Flag::to_string))
            .chain(std::iter::once(self.entry.clone()))
            .collect()
    }

    /// Program followed by [`args`](Self::args).
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.program.clone().into_os_string())
            .chain(self.args().into_iter().map(OsString::from))
            .collect()
    }

    /// Shell-style rendering for display.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Flags of one kind, for inspection.
    pub fn flags_matching<'a>(
        &'a self,
        pred: impl Fn(&Flag) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Flag> + 'a {
        self.flags.iter().filter(move |f| pred(*f))
    }
}

/// Accumulates flags for a [`CompilerInvocation`].
#[derive(Debug, Default)]
pub struct CommandBuilder {
    flags: Vec<Flag>,
}

impl CommandBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a flag.
    pub fn push(&mut self, flag: Flag) -> &mut Self {
        self.flags.push(flag);
        self
    }

    /// Finishes the invocation with the program, leading args and entry.
    pub fn build(self, program: PathBuf, leading: Vec<String>, entry: String) -> CompilerInvocation {
        CompilerInvocation {
            program,
            leading,
            flags: self.flags,
            entry,
        }
    }
}

/// Builds the compiler invocation for a scanned project.
///
/// Pure: the same packages, data directories, configuration and platform
/// always give the same invocation.
pub fn synthesize(
    packages: &[DetectedPackage],
    data_dirs: &[DetectedDataDir],
    config: &BuildConfig,
    platform: TargetPlatform,
) -> CompilerInvocation {
    let layout = &config.layout;
    let mut cmd = CommandBuilder::new();

    for feature in [
        "--standalone",
        "--onefile",
        "--follow-imports",
        "--enable-plugin=pylint-warnings",
        "--lto=yes",
    ] {
        cmd.push(Flag::Feature(feature.to_string()));
    }
    cmd.push(Flag::Feature(format!("--output-dir={}", layout.build_dir)));
    cmd.push(Flag::Feature(format!("--output-filename={}", layout.output_name)));

    for module in NOFOLLOW_IMPORTS {
        cmd.push(Flag::NoFollowImport(module.to_string()));
    }

    if platform.is_windows() {
        cmd.push(Flag::Platform("--msvc=latest".to_string()));
    } else {
        cmd.push(Flag::Platform("--clang".to_string()));
        cmd.push(Flag::Platform("--static-libpython=no".to_string()));
        if config.compression {
            cmd.push(Flag::Feature("--enable-plugin=upx".to_string()));
        }
    }

    if let Some(flag) = jit_flag(config.jit_mode) {
        cmd.push(flag);
    }

    for pkg in packages {
        cmd.push(Flag::IncludePackage(pkg.as_str().to_string()));
    }

    let mut emitted = BTreeSet::new();
    for dir in data_dirs {
        if layout.always_bundle.matches(dir.as_str()) && emitted.insert(dir.as_str().to_string()) {
            cmd.push(data_dir_flag(dir.as_str()));
        }
    }

    cmd.build(
        config.python.clone(),
        vec!["-m".to_string(), "nuitka".to_string()],
        layout.entry.clone(),
    )
}

/// Maps the JIT mode to its module parameter; `auto` leaves the default.
pub fn jit_flag(mode: JitMode) -> Option<Flag> {
    let value = match mode {
        JitMode::Auto => return None,
        JitMode::Disable => "yes",
        JitMode::Enable => "no",
    };
    Some(Flag::ModuleParameter {
        name: JIT_MODULE_PARAMETER.to_string(),
        value: value.to_string(),
    })
}

fn data_dir_flag(dir: &str) -> Flag {
    Flag::IncludeDataDir {
        source: dir.to_string(),
        dest: dir.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::PackageSettings;
    use crate::config::{BundleRoots, ProjectLayout};
    use std::path::Path;

    fn config(root: &Path, jit_mode: JitMode, compression: bool) -> BuildConfig {
        let mut layout = ProjectLayout::new(root);
        layout.always_bundle = BundleRoots::new(["assets", "models"]);
        BuildConfig {
            layout,
            python: PathBuf::from("python3"),
            platform: TargetPlatform::Linux,
            encrypt_data: false,
            compression,
            version: "0.1.0".to_string(),
            stream_output: false,
            jit_mode,
            formats: Vec::new(),
            package: PackageSettings::default(),
        }
    }

    fn count(inv: &CompilerInvocation, pred: impl Fn(&Flag) -> bool + 'static) -> usize {
        inv.flags_matching(pred).count()
    }

    #[test]
    fn one_package_one_bundled_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        let cfg = config(dir.path(), JitMode::Disable, false);

        let inv = synthesize(
            &[DetectedPackage::new("app")],
            &[DetectedDataDir::new("assets")],
            &cfg,
            TargetPlatform::Linux,
        );

        assert_eq!(count(&inv, |f| matches!(f, Flag::IncludePackage(_))), 1);
        assert_eq!(count(&inv, |f| matches!(f, Flag::IncludeDataDir { .. })), 1);
        let args = inv.args();
        assert!(args.contains(&"--include-package=app".to_string()));
        assert!(args.contains(&"--include-data-dir=assets=assets".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("main.py"));
        assert_eq!(&args[..2], &["-m".to_string(), "nuitka".to_string()]);
    }

    #[test]
    fn data_dirs_outside_bundle_roots_are_not_included() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), JitMode::Auto, false);

        let inv = synthesize(
            &[],
            &[
                DetectedDataDir::new("app/templates"),
                DetectedDataDir::new("assets/icons"),
            ],
            &cfg,
            TargetPlatform::Linux,
        );

        let data: Vec<_> = inv
            .flags_matching(|f| matches!(f, Flag::IncludeDataDir { .. }))
            .map(Flag::to_string)
            .collect();
        assert_eq!(data, vec!["--include-data-dir=assets/icons=assets/icons"]);
    }

    #[test]
    fn only_scanned_roots_become_data_flags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("models")).unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        let cfg = config(dir.path(), JitMode::Auto, false);

        let inv = synthesize(
            &[],
            &[DetectedDataDir::new("assets"), DetectedDataDir::new("assets")],
            &cfg,
            TargetPlatform::Linux,
        );

        let data: Vec<_> = inv
            .flags_matching(|f| matches!(f, Flag::IncludeDataDir { .. }))
            .map(Flag::to_string)
            .collect();
        assert_eq!(data, vec!["--include-data-dir=assets=assets"]);
    }

    #[test]
    fn jit_modes_map_to_module_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let render = |mode| {
            synthesize(&[], &[], &config(dir.path(), mode, false), TargetPlatform::Linux).args()
        };

        let disabled = render(JitMode::Disable);
        assert!(disabled.contains(&"--module-parameter=torch-disable-jit=yes".to_string()));
        assert!(!disabled.contains(&"--module-parameter=torch-disable-jit=no".to_string()));

        let enabled = render(JitMode::Enable);
        assert!(enabled.contains(&"--module-parameter=torch-disable-jit=no".to_string()));
        assert!(!enabled.contains(&"--module-parameter=torch-disable-jit=yes".to_string()));

        let auto = render(JitMode::Auto);
        assert!(!auto.iter().any(|a| a.starts_with("--module-parameter=")));
    }

    #[test]
    fn platform_flags() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), JitMode::Auto, true);

        let windows = synthesize(&[], &[], &cfg, TargetPlatform::Windows).args();
        assert!(windows.contains(&"--msvc=latest".to_string()));
        assert!(!windows.contains(&"--clang".to_string()));
        assert!(!windows.contains(&"--enable-plugin=upx".to_string()));

        let linux = synthesize(&[], &[], &cfg, TargetPlatform::Linux).args();
        assert!(linux.contains(&"--clang".to_string()));
        assert!(linux.contains(&"--static-libpython=no".to_string()));
        assert!(linux.contains(&"--enable-plugin=upx".to_string()));
        assert!(!linux.contains(&"--msvc=latest".to_string()));
    }

    #[test]
    fn baseline_and_denylist_are_present() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), JitMode::Auto, false);
        let args = synthesize(&[], &[], &cfg, TargetPlatform::Macos).args();
        for expected in [
            "--standalone",
            "--onefile",
            "--follow-imports",
            "--output-dir=build",
            "--output-filename=EXECUTABLE",
            "--nofollow-import-to=pytest",
            "--nofollow-import-to=setuptools",
        ] {
            assert!(args.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn synthesis_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        let cfg = config(dir.path(), JitMode::Enable, true);
        let packages = [DetectedPackage::new("b"), DetectedPackage::new("a")];
        let data = [DetectedDataDir::new("assets"), DetectedDataDir::new("misc")];

        let first = synthesize(&packages, &data, &cfg, TargetPlatform::Linux);
        let second = synthesize(&packages, &data, &cfg, TargetPlatform::Linux);
        assert_eq!(first, second);
        assert_eq!(first.args().last().map(String::as_str), Some("main.py"));
    }
}
