// SPDX-License-Identifier: MIT

//! Atomic structured file read/write.
//!
//! Grounded on the write-temp-then-rename pattern used for the teacher's
//! crash-safe snapshot persistence: every mutation is a full-replace write,
//! never an incremental edit, so a crash mid-write never leaves a torn file
//! behind for a reader to observe.

use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("JSON error at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Serialize `value` to JSON and atomically replace the file at `path`.
///
/// Writes to `<path>.tmp` in the same directory, syncs it, then renames
/// over `path`. A reader never observes a partially-written file.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| IoError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path).map_err(|source| IoError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| IoError::Json {
            path: tmp_path.display().to_string(),
            source,
        })?;
        let file = writer.into_inner().map_err(|e| IoError::Io {
            path: tmp_path.display().to_string(),
            source: e.into_error(),
        })?;
        file.sync_all().map_err(|source| IoError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
    }

    fs::rename(&tmp_path, path).map_err(|source| IoError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(())
}

/// Read and parse a JSON file, tolerating an absent file by returning
/// `T::default()`.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, IoError> {
    if !path.exists() {
        return Ok(T::default());
    }

    let bytes = fs::read(path).map_err(|source| IoError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| IoError::Json {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "io_tests.rs"]
mod tests;
