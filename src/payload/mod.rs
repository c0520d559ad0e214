//! Encrypted data payload.
//!
//! The selected data directories are packed into one gzip-compressed tar
//! archive and sealed with AES-256-GCM under a key generated for this run.
//! Ciphertext and key always land in separate files; only the ciphertext
//! path is ever handed to the package assemblers.
//!
//! Ciphertext file layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! Key file: the 32-byte key as lowercase hex.

use crate::config::ProjectLayout;
use crate::scan::{DetectedDataDir, IgnoreSpec, bundled_files, select_bundled};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use flate2::{Compression, write::GzEncoder};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ciphertext file name inside the build directory.
pub const CIPHERTEXT_FILE: &str = "payload.enc";

/// Key file name inside the build directory.
pub const KEY_FILE: &str = "payload.key";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Errors raised while building or opening a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Reading or writing a payload file failed.
    #[error("{context} {}: {source}", path.display())]
    Io {
        /// What was being done.
        context: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Building the archive failed.
    #[error("failed to archive data directories: {0}")]
    Archive(#[source] io::Error),

    /// Sealing failed.
    #[error("failed to encrypt payload")]
    Encrypt,

    /// Wrong key, or the ciphertext was modified.
    #[error("failed to decrypt payload: wrong key or corrupted data")]
    Decrypt,

    /// The ciphertext is shorter than a nonce and a tag.
    #[error("payload is truncated ({0} bytes)")]
    Truncated(usize),

    /// The key text is not 64 hex digits.
    #[error("invalid payload key: {0}")]
    InvalidKey(String),

    /// The blocking worker panicked.
    #[error("payload task failed: {0}")]
    Task(String),
}

/// A 256-bit payload key.
#[derive(Clone, PartialEq, Eq)]
pub struct PayloadKey([u8; KEY_LEN]);

impl PayloadKey {
    /// Fresh key from the OS random number generator.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key.as_slice());
        Self(bytes)
    }

    /// Parses the key file format (surrounding whitespace allowed).
    pub fn from_hex(text: &str) -> Result<Self, PayloadError> {
        let bytes =
            hex::decode(text.trim()).map_err(|e| PayloadError::InvalidKey(e.to_string()))?;
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            PayloadError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Lowercase hex rendering, as written to the key file.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for PayloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PayloadKey(<redacted>)")
    }
}

/// Where the sealed payload and its key were written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EncryptedPayload {
    /// `nonce || ciphertext || tag`.
    pub ciphertext_path: PathBuf,
    /// Hex key, mode 0600 on Unix.
    pub key_path: PathBuf,
}

/// Archives and encrypts the data directories that ship with the binary.
///
/// Returns `Ok(None)` with a warning when none of the selected directories
/// exists on disk. Runs the archive and cipher work on the blocking pool.
pub async fn encrypt(
    layout: &ProjectLayout,
    ignore: &IgnoreSpec,
    data_dirs: &[DetectedDataDir],
) -> Result<Option<EncryptedPayload>, PayloadError> {
    let selected: Vec<String> = select_bundled(data_dirs, &layout.always_bundle)
        .into_iter()
        .filter(|dir| layout.resolve(dir).is_dir())
        .collect();

    if selected.is_empty() {
        log::warn!("No always-bundle data directory exists; skipping payload encryption");
        return Ok(None);
    }

    log::info!("Encrypting data payload from: {}", selected.join(", "));

    let layout = layout.clone();
    let ignore = ignore.clone();
    tokio::task::spawn_blocking(move || {
        let files = bundled_files(&layout, &ignore, &selected);
        log::debug!("Archiving {} files", files.len());
        let archive = archive(&layout.root, &files).map_err(PayloadError::Archive)?;

        let key = PayloadKey::generate();
        let sealed = seal(&archive, &key)?;

        let build_dir = layout.build_path();
        std::fs::create_dir_all(&build_dir).map_err(|source| PayloadError::Io {
            context: "creating build directory",
            path: build_dir.clone(),
            source,
        })?;

        let ciphertext_path = build_dir.join(CIPHERTEXT_FILE);
        std::fs::write(&ciphertext_path, &sealed).map_err(|source| PayloadError::Io {
            context: "writing payload",
            path: ciphertext_path.clone(),
            source,
        })?;

        let key_path = build_dir.join(KEY_FILE);
        write_secret(&key_path, key.to_hex().as_bytes()).map_err(|source| PayloadError::Io {
            context: "writing payload key",
            path: key_path.clone(),
            source,
        })?;

        log::info!(
            "Payload encrypted: {} ({} bytes)",
            ciphertext_path.display(),
            sealed.len()
        );
        Ok(Some(EncryptedPayload {
            ciphertext_path,
            key_path,
        }))
    })
    .await
    .map_err(|e| PayloadError::Task(e.to_string()))?
}

/// Builds a gzip-compressed tar of `files`, named by their relative paths.
pub fn archive(root: &Path, files: &[String]) -> io::Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    for rel in files {
        let path = rel.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part));
        builder.append_path_with_name(&path, rel)?;
    }
    builder.into_inner()?.finish()
}

/// Encrypts `plaintext` under a random nonce; returns `nonce || ciphertext`.
pub fn seal(plaintext: &[u8], key: &PayloadKey) -> Result<Vec<u8>, PayloadError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = key
        .cipher()
        .encrypt(&nonce, plaintext)
        .map_err(|_| PayloadError::Encrypt)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(nonce.as_slice());
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Opens a ciphertext file's contents, returning the archive bytes.
pub fn decrypt(sealed: &[u8], key: &PayloadKey) -> Result<Vec<u8>, PayloadError> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(PayloadError::Truncated(sealed.len()));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    key.cipher()
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| PayloadError::Decrypt)
}

/// Writes a file readable only by its owner.
fn write_secret(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // An existing file keeps its old mode on open.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.flush()
}
