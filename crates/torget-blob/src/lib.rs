//! torget-blob: filesystem blob store for photo bytes.
//!
//! Blobs are addressed by opaque random keys; the store knows nothing about
//! listings or image formats. Writes go through a temp file and an atomic
//! rename, so a reader never observes a half-written blob.

use std::io::Write;
use std::path::PathBuf;

use rand::rngs::OsRng;
use rand::RngCore;
use torget_core::{Error, Result};

/// Length of a blob key in hex characters (16 random bytes).
const KEY_LEN: usize = 32;

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open the store at `root`, creating the directory if needed.
    ///
    /// Creation is idempotent; calling this on an existing directory is a
    /// no-op, so the store can be re-opened on every startup.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| Error::storage(format!("create {}: {e}", root.display())))?;
        tracing::debug!("Blob store ready at {}", root.display());
        Ok(Self { root })
    }

    /// The directory blobs are stored in.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Store `data` under a fresh random key and return the key.
    ///
    /// Keys are 128 bits from the OS CSPRNG, hex-encoded. At that size a
    /// collision is not a practical concern, so keys are not re-checked
    /// against existing files. The write lands in a temp file in the store
    /// directory first and is renamed into place.
    pub fn put(&self, data: &[u8]) -> Result<String> {
        let key = generate_key();

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .map_err(|e| Error::storage(format!("temp file in {}: {e}", self.root.display())))?;
        tmp.write_all(data)
            .map_err(|e| Error::storage(format!("write blob {key}: {e}")))?;
        tmp.flush()
            .map_err(|e| Error::storage(format!("flush blob {key}: {e}")))?;

        let path = self.root.join(&key);
        tmp.persist(&path)
            .map_err(|e| Error::storage(format!("persist blob {key}: {e}")))?;

        tracing::debug!("Stored blob {key} ({} bytes)", data.len());
        Ok(key)
    }

    /// Read back the blob stored under `key`.
    ///
    /// Keys that don't have the exact shape `put` produces are treated as
    /// not found without touching the filesystem, which also rules out path
    /// traversal through crafted keys.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        if !is_valid_key(key) {
            return Err(Error::not_found("blob", key));
        }

        let path = self.root.join(key);
        match std::fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found("blob", key))
            }
            Err(e) => Err(Error::storage(format!("read blob {key}: {e}"))),
        }
    }
}

/// Generate a fresh 128-bit hex key.
fn generate_key() -> String {
    let mut bytes = [0u8; KEY_LEN / 2];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A key is exactly 32 lowercase hex characters.
fn is_valid_key(key: &str) -> bool {
    key.len() == KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
