//! CPU architecture types and utilities.

use crate::bundler::{Error, Result};
use serde::Serialize;

/// CPU architecture of the packaged binary.
///
/// Each package format spells architectures differently; use
/// [`Arch::deb_name`] or [`Arch::pacman_name`] rather than `Debug`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    X86_64,
    /// x86 / i686 (32-bit)
    X86,
    /// AArch64 / ARM64 (64-bit)
    AArch64,
    /// ARM with hard-float (32-bit)
    Armhf,
    /// ARM with soft-float (32-bit)
    Armel,
    /// RISC-V (64-bit)
    Riscv64,
}

impl Arch {
    /// Architecture this process was built for.
    pub fn host() -> Result<Self> {
        Self::from_target(std::env::consts::ARCH)
    }

    /// Detects the architecture from a target triple or a bare arch name
    /// (`x86_64-unknown-linux-gnu`, `aarch64`, `arm`).
    pub fn from_target(target: &str) -> Result<Self> {
        let arch = if target.starts_with("x86_64") {
            Arch::X86_64
        } else if target == "x86" || (target.starts_with('i') && target.get(2..4) == Some("86")) {
            Arch::X86
        } else if target.starts_with("aarch64") {
            Arch::AArch64
        } else if target == "arm" || (target.starts_with("arm") && target.ends_with("hf")) {
            Arch::Armhf
        } else if target.starts_with("arm") {
            Arch::Armel
        } else if target.starts_with("riscv64") {
            Arch::Riscv64
        } else {
            return Err(Error::ArchError(format!(
                "unsupported architecture for packaging: {target}"
            )));
        };
        Ok(arch)
    }

    /// Debian architecture name (`dpkg --print-architecture`).
    pub fn deb_name(self) -> &'static str {
        match self {
            Arch::X86_64 => "amd64",
            Arch::X86 => "i386",
            Arch::AArch64 => "arm64",
            Arch::Armhf => "armhf",
            Arch::Armel => "armel",
            Arch::Riscv64 => "riscv64",
        }
    }

    /// Arch Linux architecture name (`CARCH`).
    pub fn pacman_name(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::X86 => "i686",
            Arch::AArch64 => "aarch64",
            Arch::Armhf => "armv7h",
            Arch::Armel => "arm",
            Arch::Riscv64 => "riscv64",
        }
    }
}
