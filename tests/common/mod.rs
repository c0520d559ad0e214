#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project plus a directory holding a stub interpreter.
pub struct TestProject {
    _tmp: TempDir,
    pub root: PathBuf,
    pub bin: PathBuf,
}

impl TestProject {
    /// Project with `main.py`, one package and one always-bundle data dir.
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().join("demo-app");
        let bin = tmp.path().join("bin");
        fs::create_dir_all(&bin).expect("create bin dir");

        for (rel, body) in [
            ("main.py", "import app\n"),
            ("app/__init__.py", ""),
            ("app/engine.py", "VALUE = 1\n"),
            ("assets/logo.png", "png"),
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().expect("has parent")).expect("create parent");
            fs::write(path, body).expect("write fixture file");
        }

        Self {
            _tmp: tmp,
            root,
            bin,
        }
    }

    /// Installs `bin/python` running `body` with `/bin/sh`.
    ///
    /// The script runs from the project root and sees only shell builtins
    /// when the caller restricts PATH to [`TestProject::bin`].
    pub fn stub_python(&self, body: &str) -> PathBuf {
        let path = self.bin.join("python");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod stub");
        path
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// `pyship` pointed at this project and stub, with PATH limited to the
    /// stub directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("pyship").expect("pyship binary");
        cmd.env("PATH", &self.bin)
            .env_remove("RUST_LOG")
            .arg("--project-dir")
            .arg(&self.root)
            .arg("--python")
            .arg(self.bin.join("python"));
        cmd
    }
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(path).expect("read json")).expect("valid json")
}
