//! SRI-style integrity strings and content hashing.
//!
//! Manifest entries may carry an integrity value of the form
//! `<algorithm>-<base64digest>`, e.g. `sha384-r0JI...`. The algorithm
//! prefix selects the hash; entries without an integrity value are hashed
//! with [`DEFAULT_ALGORITHM`] so that `make-sri` can report the string to
//! paste into the manifest.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::io::Read;
use std::path::Path;

use crate::error::{Result, SyncError};

/// Hash algorithm used when an entry declares no integrity value.
pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::Sha384;

/// Hash algorithms accepted in integrity strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    /// The algorithm's name as it appears in an integrity prefix.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha256" => Some(Algorithm::Sha256),
            "sha384" => Some(Algorithm::Sha384),
            "sha512" => Some(Algorithm::Sha512),
            _ => None,
        }
    }

    fn digest(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Algorithm::Sha256 => Sha256::digest(bytes).to_vec(),
            Algorithm::Sha384 => Sha384::digest(bytes).to_vec(),
            Algorithm::Sha512 => Sha512::digest(bytes).to_vec(),
        }
    }
}

/// Determine the algorithm an integrity string names.
///
/// The algorithm is the text before the first `-`.
///
/// # Errors
///
/// Returns [`SyncError::UnsupportedAlgorithm`] when the prefix is not a
/// supported hash name (including strings with no `-` at all).
pub fn algorithm_of(integrity: &str) -> Result<Algorithm> {
    let prefix = integrity.split('-').next().unwrap_or_default();
    Algorithm::from_name(prefix).ok_or_else(|| SyncError::UnsupportedAlgorithm {
        value: integrity.to_owned(),
    })
}

/// Compute the integrity string `<algorithm>-<base64digest>` for `bytes`.
#[must_use]
pub fn compute(algorithm: Algorithm, bytes: &[u8]) -> String {
    format!("{}-{}", algorithm.name(), BASE64.encode(algorithm.digest(bytes)))
}

/// SHA-256 of a byte slice, for local-content comparisons during `verify`.
#[must_use]
pub fn sha256_bytes(bytes: &[u8]) -> Vec<u8> {
    Sha256::digest(bytes).to_vec()
}

/// Streamed SHA-256 of a file on disk.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be read.
pub fn sha256_file(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_vec())
}
