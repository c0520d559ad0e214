//! What gets installed next to the binary.

use std::path::PathBuf;

/// Name the encrypted payload is installed under.
pub const PAYLOAD_INSTALL_NAME: &str = "payload.enc";

/// A data file copied into the package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataFile {
    /// Project-relative, `/`-separated path; also the install location below
    /// `usr/share/<package>/`.
    pub rel: String,
    /// File on disk.
    pub source: PathBuf,
}

/// Data shipped under `usr/share/<package>/`.
///
/// When the payload was encrypted only the ciphertext reaches the
/// assemblers; the key file has no representation here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StagedData {
    /// Plain data files.
    Files(Vec<DataFile>),
    /// The encrypted payload file.
    EncryptedPayload(PathBuf),
}

impl Default for StagedData {
    fn default() -> Self {
        StagedData::Files(Vec::new())
    }
}
