//! Command line interface for pyship.
//!
//! Parses arguments, resolves the configuration, drives the pipeline and
//! renders what happened. This is the only layer that turns an outcome into
//! a process exit code.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::bundler::{AssemblyOutcome, ToolLocator};
use crate::compiler::{StreamLine, StreamOrigin};
use crate::config::BuildConfig;
use crate::diagnostics::{EnvironmentReport, looks_like_oom, oom_hint};
use crate::error::{Error, Result, SPAWN_FAILURE_EXIT_CODE, ToolchainFailure};
use crate::pipeline::{Pipeline, RunOutcome};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let output = OutputManager::new(true, false);

    let config = args.into_config()?;
    execute(&config, ToolLocator::from_env(), &output).await
}

/// Runs the pipeline for a resolved configuration and reports the result.
///
/// Returns the exit code for a successful compiler run. A failed run is
/// printed in full and then returned as the error.
pub async fn execute(
    config: &BuildConfig,
    tools: ToolLocator,
    output: &OutputManager,
) -> Result<i32> {
    output.section("Environment")?;
    output.indent(&EnvironmentReport::collect(config, &tools).to_string())?;

    let pipeline = Pipeline::new(config, tools);
    let prepared = pipeline.prepare().await?;

    output.section("Compiler command")?;
    output.indent(&prepared.invocation.display_line())?;

    output.section("Build")?;
    output.progress(&format!(
        "Compiling {} (version {})",
        config.layout.entry, config.version
    ))?;

    let result = pipeline.run(&prepared, print_stream_line).await;
    match result {
        Ok(outcome) => {
            report_success(config, &outcome, output)?;
            Ok(0)
        }
        Err(Error::Toolchain(failure)) => {
            report_failure(config, &failure, output)?;
            Err(Error::Toolchain(failure))
        }
        Err(e) => Err(e),
    }
}

fn print_stream_line(line: &StreamLine) {
    match line.origin {
        StreamOrigin::Stdout => println!("[{}] {}", line.origin, line.line),
        StreamOrigin::Stderr => eprintln!("[{}] {}", line.origin, line.line),
    }
}

fn report_success(
    config: &BuildConfig,
    outcome: &RunOutcome,
    output: &OutputManager,
) -> Result<()> {
    if !config.stream_output && !outcome.build.stdout.is_empty() {
        output.section("Compiler output")?;
        output.indent(&outcome.build.stdout)?;
    }
    if !config.stream_output && !outcome.build.stderr.is_empty() {
        output.section("Compiler stderr")?;
        output.indent(&outcome.build.stderr)?;
    }

    match &outcome.build.binary {
        Some(binary) => output.success(&format!("Executable: {}", binary.display()))?,
        None => output.warn(&format!(
            "compiler succeeded but no {} binary was found",
            config.layout.output_name
        ))?,
    }

    if let Some(payload) = &outcome.payload {
        output.success(&format!(
            "Encrypted payload: {}",
            payload.ciphertext_path.display()
        ))?;
        output.verbose(&format!("Payload key: {}", payload.key_path.display()))?;
    } else if config.encrypt_data {
        output.warn("nothing to encrypt; payload encryption skipped")?;
    }

    if !outcome.packages.is_empty() {
        output.section("Packages")?;
    }
    for package in &outcome.packages {
        match package {
            AssemblyOutcome::Built(_) => output.success(&package.to_string())?,
            AssemblyOutcome::Skipped { format, tool } => {
                output.warn(&format!("{format} package skipped: {tool} not found on PATH"))?
            }
            AssemblyOutcome::Failed { .. } => output.warn(&package.to_string())?,
        }
    }

    if let Some(report) = &outcome.report {
        output.verbose(&format!("Run report: {}", report.display()))?;
    }
    Ok(())
}

fn report_failure(
    config: &BuildConfig,
    failure: &ToolchainFailure,
    output: &OutputManager,
) -> Result<()> {
    output.error(&failure.to_string())?;

    // Streaming mode already showed every line, unless nothing ever ran.
    if !config.stream_output || failure.exit_code == SPAWN_FAILURE_EXIT_CODE {
        if !failure.stdout.is_empty() {
            output.error("compiler stdout:")?;
            output.dump(&failure.stdout)?;
        }
        if !failure.stderr.is_empty() {
            output.error("compiler stderr:")?;
            output.dump(&failure.stderr)?;
        }
    }

    for report in &failure.crash_reports {
        output.error(&format!("crash report {}:", report.path.display()))?;
        output.dump(&report.contents)?;
    }

    if looks_like_oom(failure.exit_code, &failure.stderr) {
        output.dump(&oom_hint())?;
    }
    Ok(())
}
