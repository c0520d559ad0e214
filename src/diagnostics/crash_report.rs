//! Crash reports left behind by a failed compiler run.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// File names Nuitka writes into its output directory when it crashes.
pub const CRASH_REPORT_FILES: &[(&str, CrashReportKind)] = &[
    ("nuitka-crash-report.txt", CrashReportKind::Text),
    ("nuitka-crash-report.xml", CrashReportKind::Structured),
];

/// Crash report flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrashReportKind {
    /// Plain text report.
    Text,
    /// XML report.
    Structured,
}

/// One crash report read from disk.
#[derive(Clone, Debug, Serialize)]
pub struct CrashReport {
    /// Report location.
    pub path: PathBuf,
    /// Report flavour.
    pub kind: CrashReportKind,
    /// Report body, lossily decoded.
    pub contents: String,
}

/// Reads every crash report present in `build_dir`.
///
/// Unreadable reports are logged and skipped; a missing build directory
/// simply yields nothing.
pub async fn collect_crash_reports(build_dir: &Path) -> Vec<CrashReport> {
    let mut reports = Vec::new();

    for (name, kind) in CRASH_REPORT_FILES {
        let path = build_dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                log::debug!("Found crash report {}", path.display());
                reports.push(CrashReport {
                    path,
                    kind: *kind,
                    contents: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to read crash report {}: {}", path.display(), e),
        }
    }

    reports
}
