//! Configuration structures for package assembly.
//!
//! Package metadata, the architecture, the staged data and a builder for
//! putting them together.

mod arch;
mod builder;
mod bundle;
mod core;
mod package;

// Re-export all public types
pub use arch::Arch;
pub use builder::SettingsBuilder;
pub use bundle::{DataFile, PAYLOAD_INSTALL_NAME, StagedData};
pub use core::Settings;
pub use package::PackageSettings;
