//! JSON record of a run, written next to the build output.

use crate::bundler::AssemblyOutcome;
use crate::compiler::CompilerInvocation;
use crate::payload::EncryptedPayload;
use crate::scan::ScanResult;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Report file name inside the build directory.
pub const REPORT_FILE: &str = "pyship-report.json";

/// What one run did.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    /// RFC 3339 time the report was written.
    pub timestamp: String,
    /// Package version.
    pub version: &'a str,
    /// Scanned packages and data directories.
    #[serde(flatten)]
    pub scan: &'a ScanResult,
    /// Full compiler argument list, program first.
    pub arguments: Vec<String>,
    /// Compiler exit code.
    pub exit_code: i32,
    /// Produced binary.
    pub binary: Option<&'a Path>,
    /// Encrypted payload, when encryption ran.
    pub payload: Option<&'a EncryptedPayload>,
    /// One entry per selected package format.
    pub package_outcomes: &'a [AssemblyOutcome],
}

impl<'a> RunReport<'a> {
    /// Report for a finished compiler run.
    pub fn new(
        version: &'a str,
        scan: &'a ScanResult,
        invocation: &CompilerInvocation,
        exit_code: i32,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version,
            scan,
            arguments: invocation
                .argv()
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
            exit_code,
            binary: None,
            payload: None,
            package_outcomes: &[],
        }
    }

    /// Writes the report into `build_dir`.
    ///
    /// Failure is logged, never returned: the report is a by-product.
    pub async fn write(&self, build_dir: &Path) -> Option<PathBuf> {
        let path = build_dir.join(REPORT_FILE);
        let json = match serde_json::to_vec_pretty(self) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize run report: {e}");
                return None;
            }
        };
        if let Err(e) = tokio::fs::create_dir_all(build_dir).await {
            log::warn!("Failed to create {}: {e}", build_dir.display());
            return None;
        }
        match tokio::fs::write(&path, json).await {
            Ok(()) => {
                log::debug!("Run report written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::warn!("Failed to write run report {}: {e}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CommandBuilder;
    use crate::scan::{DetectedDataDir, DetectedPackage};

    #[tokio::test]
    async fn report_lists_arguments_and_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let scan = ScanResult {
            packages: vec![DetectedPackage::new("app")],
            data_dirs: vec![DetectedDataDir::new("assets")],
        };
        let invocation = CommandBuilder::new().build(
            PathBuf::from("python3"),
            vec!["-m".into(), "nuitka".into()],
            "main.py".into(),
        );
        let outcomes = vec![AssemblyOutcome::Skipped {
            format: crate::bundler::PackageFormat::Deb,
            tool: "dpkg-deb".into(),
        }];

        let mut report = RunReport::new("2.3.1", &scan, &invocation, 0);
        report.package_outcomes = &outcomes;
        let path = report.write(&dir.path().join("build")).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(json["version"], "2.3.1");
        assert_eq!(json["packages"][0], "app");
        assert_eq!(json["data_dirs"][0], "assets");
        assert_eq!(json["arguments"], serde_json::json!(["python3", "-m", "nuitka", "main.py"]));
        assert_eq!(json["package_outcomes"][0]["status"], "skipped");
        assert_eq!(json["package_outcomes"][0]["format"], "deb");
        assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }
}
