//! Pre-run environment facts.
//!
//! Everything collected here is for the operator's eyes only; no decision in
//! the pipeline reads from it.

use crate::bundler::{PackageFormat, ToolLocator};
use crate::config::BuildConfig;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Variables that commonly change how Nuitka or the C compiler behave.
pub const TOOLCHAIN_ENV_VARS: &[&str] = &[
    "CC",
    "CXX",
    "PYTHONPATH",
    "PYTHONWARNINGS",
    "VIRTUAL_ENV",
    "NUITKA_CACHE_DIR",
];

/// Host and toolchain facts gathered before the compiler runs.
#[derive(Clone, Debug, Serialize)]
pub struct EnvironmentReport {
    /// Interpreter as configured.
    pub python: PathBuf,
    /// Interpreter as found on the search path, if found.
    pub python_resolved: Option<PathBuf>,
    /// OS name and version.
    pub os: String,
    /// Kernel version.
    pub kernel: Option<String>,
    /// CPU architecture of this process.
    pub arch: &'static str,
    /// Logical CPUs.
    pub cpus: usize,
    /// Total memory in bytes.
    pub total_memory: u64,
    /// Search path.
    pub path: Option<String>,
    /// Toolchain variables that are set.
    pub toolchain_env: Vec<(String, String)>,
    /// Packaging tool per format, if found.
    pub packaging_tools: Vec<(PackageFormat, Option<PathBuf>)>,
}

impl EnvironmentReport {
    /// Collects the report for `config`.
    pub fn collect(config: &BuildConfig, tools: &ToolLocator) -> Self {
        let mut sys = sysinfo::System::new();
        sys.refresh_memory();

        let os = match (sysinfo::System::name(), sysinfo::System::os_version()) {
            (Some(name), Some(version)) => format!("{name} {version}"),
            (Some(name), None) => name,
            _ => std::env::consts::OS.to_string(),
        };

        let toolchain_env = TOOLCHAIN_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok().map(|value| (var.to_string(), value)))
            .collect();

        let packaging_tools = PackageFormat::ALL
            .iter()
            .map(|format| (*format, tools.locate(format.required_tool())))
            .collect();

        Self {
            python: config.python.clone(),
            python_resolved: which::which(&config.python).ok(),
            os,
            kernel: sysinfo::System::kernel_version(),
            arch: std::env::consts::ARCH,
            cpus: num_cpus::get(),
            total_memory: sys.total_memory(),
            path: std::env::var("PATH").ok(),
            toolchain_env,
            packaging_tools,
        }
    }
}

impl fmt::Display for EnvironmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Python: {}", self.python.display())?;
        match &self.python_resolved {
            Some(path) => writeln!(f, "Python (resolved): {}", path.display())?,
            None => writeln!(f, "Python (resolved): not found on PATH")?,
        }
        writeln!(f, "Platform: {} ({})", self.os, self.arch)?;
        if let Some(kernel) = &self.kernel {
            writeln!(f, "Kernel: {kernel}")?;
        }
        writeln!(f, "CPUs: {}", self.cpus)?;
        writeln!(f, "Memory: {} MB", self.total_memory / 1024 / 1024)?;
        writeln!(f, "PATH: {}", self.path.as_deref().unwrap_or("<unset>"))?;
        for (var, value) in &self.toolchain_env {
            writeln!(f, "{var}: {value}")?;
        }
        for (format, tool) in &self.packaging_tools {
            match tool {
                Some(path) => writeln!(f, "{} packaging: {}", format, path.display())?,
                None => writeln!(f, "{} packaging: {} not found", format, format.required_tool())?,
            }
        }
        Ok(())
    }
}
