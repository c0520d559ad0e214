//! Sectioned terminal output for the operator.
//!
//! Progress and results go to stdout, warnings and failures to stderr.
//! Log records from `env_logger` share stderr but are not routed through here.

use std::io::{self, Write};

/// Writes user-facing output.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Creates an output manager.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Detail line, shown only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if self.verbose && !self.quiet {
            writeln!(io::stdout().lock(), "  {message}")?;
        }
        Ok(())
    }

    /// Stage progress.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if !self.quiet {
            writeln!(io::stdout().lock(), "==> {message}")?;
        }
        Ok(())
    }

    /// Something finished well.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if !self.quiet {
            writeln!(io::stdout().lock(), "✓ {message}")?;
        }
        Ok(())
    }

    /// Soft problem; the run continues.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "warning: {message}")
    }

    /// Hard failure; always shown.
    pub fn error(&self, message: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "error: {message}")
    }

    /// Section header.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if !self.quiet {
            let mut out = io::stdout().lock();
            writeln!(out)?;
            writeln!(out, "--- {title} ---")?;
        }
        Ok(())
    }

    /// Indented block, one output line per input line.
    pub fn indent(&self, text: &str) -> io::Result<()> {
        if !self.quiet {
            let mut out = io::stdout().lock();
            for line in text.lines() {
                writeln!(out, "    {line}")?;
            }
        }
        Ok(())
    }

    /// Raw text on stderr, one line per input line, never suppressed.
    ///
    /// Used for captured compiler output and crash reports after a failure.
    pub fn dump(&self, text: &str) -> io::Result<()> {
        let mut err = io::stderr().lock();
        for line in text.lines() {
            writeln!(err, "{line}")?;
        }
        Ok(())
    }
}
