//! Shared helpers for package assemblers.

pub mod fs;
