//! Bundle orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that runs the
//! format assemblers.
//!
//! # Overview
//!
//! For each selected format the bundler:
//! 1. Looks up the native packaging tool, skipping the format without it
//! 2. Delegates to the format's assembler
//! 3. Measures and hashes the produced package
//! 4. Records an [`AssemblyOutcome`](crate::bundler::AssemblyOutcome)
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for artifacts
//! - [`orchestrator`] - Main [`Bundler`] struct and bundling operations
//! - [`tool_detection`] - External tool availability checking

mod checksum;
mod orchestrator;
mod tool_detection;

pub use checksum::calculate_sha256;
pub use orchestrator::Bundler;
pub use tool_detection::ToolLocator;
