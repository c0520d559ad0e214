//! Package formats and their assemblers.

pub mod linux;

use serde::Serialize;
use std::fmt;

/// Distribution package format.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    /// Debian `.deb`, built with `dpkg-deb`.
    Deb,
    /// Arch Linux `.pkg.tar.zst`, built with `makepkg`.
    Arch,
}

impl PackageFormat {
    /// Every format, in assembly order.
    pub const ALL: [PackageFormat; 2] = [PackageFormat::Deb, PackageFormat::Arch];

    /// Native tool that builds this format.
    pub fn required_tool(self) -> &'static str {
        match self {
            PackageFormat::Deb => "dpkg-deb",
            PackageFormat::Arch => "makepkg",
        }
    }

    /// Short lowercase name used on the command line.
    pub fn short_name(self) -> &'static str {
        match self {
            PackageFormat::Deb => "deb",
            PackageFormat::Arch => "arch",
        }
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
