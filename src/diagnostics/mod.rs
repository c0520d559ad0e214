//! Run diagnostics.
//!
//! - [`environment`] - facts printed before the compiler starts
//! - [`crash_report`] - crash reports surfaced after a failed build
//! - [`oom`] - out-of-memory heuristics for failed builds

mod crash_report;
mod environment;
mod oom;

pub use crash_report::{CRASH_REPORT_FILES, CrashReport, CrashReportKind, collect_crash_reports};
pub use environment::{EnvironmentReport, TOOLCHAIN_ENV_VARS};
pub use oom::{looks_like_oom, oom_hint};
