// SPDX-License-Identifier: MIT

//! Content hashing for artifacts and job input fingerprints.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("I/O error hashing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Streaming SHA-256 over a file's bytes, returned as lowercase hex.
pub fn sha256_file(path: &Path) -> Result<String, HashError> {
    let mut file = File::open(path).map_err(|source| HashError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let read = file.read(&mut buf).map_err(|source| HashError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Leading 64 bits (16 hex chars) of SHA-256 over a canonical encoding of
/// `inputs`: keys sorted, values taken as-is. Used as the fingerprint half
/// of the default `job_id`.
///
/// Two calls with the same map content (regardless of insertion order)
/// produce the same hash.
pub fn short_input_hash(inputs: &IndexMap<String, String>) -> String {
    let sorted: BTreeMap<&str, &str> = inputs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let canonical = serde_json::to_string(&sorted).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

#[cfg(test)]
#[path = "hashing_tests.rs"]
mod tests;
