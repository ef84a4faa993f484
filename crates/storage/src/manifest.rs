// SPDX-License-Identifier: MIT

//! Durable record of produced artifacts with hashes and validated flags;
//! the authoritative source for reuse decisions.

use chrono::Utc;
use indexmap::IndexMap;
use oj_core::config::ArtifactsConfig;
use oj_core::hashing::sha256_file;
use oj_core::io::{atomic_write_json, read_json_or_default, IoError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Current on-disk manifest schema version. Bumped whenever the persisted
/// shape changes in an incompatible way, so a future reader can detect and
/// reject a format it doesn't understand rather than silently
/// misinterpreting it.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// One entry in the manifest, keyed by `key` in [`Manifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub key: String,
    pub path: PathBuf,
    pub producer_step: String,
    pub inputs_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_used: Option<String>,
    pub validated: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_versions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedManifest {
    schema_version: u32,
    artifacts: IndexMap<String, ArtifactRecord>,
}

impl Default for PersistedManifest {
    fn default() -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION,
            artifacts: IndexMap::new(),
        }
    }
}

/// A keyed collection of [`ArtifactRecord`]s for one job, durable under
/// `artifacts_dir/manifest_file`. Every mutation is followed by an atomic,
/// full-replace write of the whole document; reads tolerate an absent file
/// (treated as empty).
pub struct Manifest {
    manifest_path: PathBuf,
    config: ArtifactsConfig,
    data: PersistedManifest,
}

impl Manifest {
    /// Load the manifest at `manifest_path` if present, otherwise start
    /// empty.
    pub fn load_or_default(
        manifest_path: PathBuf,
        config: ArtifactsConfig,
    ) -> Result<Self, ManifestError> {
        let data: PersistedManifest = read_json_or_default(&manifest_path)?;
        if manifest_path.exists() {
            info!(path = %manifest_path.display(), count = data.artifacts.len(), "loaded existing manifest");
        } else {
            info!(path = %manifest_path.display(), "creating new manifest");
        }
        Ok(Self {
            manifest_path,
            config,
            data,
        })
    }

    /// Register or replace an artifact record. Computes and stores `sha256`
    /// iff hashing is enabled and the file exists. Persists immediately.
    pub fn add(
        &mut self,
        key: &str,
        path: &Path,
        producer_step: &str,
        inputs_used: Vec<String>,
        schema_used: Option<String>,
        validated: bool,
    ) -> Result<(), ManifestError> {
        let sha256 = if self.config.include_hashes && path.exists() {
            sha256_file(path).ok()
        } else {
            None
        };
        let tool_versions = if self.config.include_tool_versions {
            Some(format!(
                "rustc-{}",
                option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown")
            ))
        } else {
            None
        };

        let record = ArtifactRecord {
            key: key.to_string(),
            path: path.to_path_buf(),
            producer_step: producer_step.to_string(),
            inputs_used,
            schema_used,
            validated,
            created_at: Utc::now().to_rfc3339(),
            sha256,
            tool_versions,
        };

        info!(key, producer_step, validated, "registering artifact");
        self.data.artifacts.insert(key.to_string(), record);
        self.save()
    }

    pub fn get(&self, key: &str) -> Option<&ArtifactRecord> {
        self.data.artifacts.get(key)
    }

    pub fn is_validated(&self, key: &str) -> bool {
        self.get(key).is_some_and(|r| r.validated)
    }

    /// Reuse decision for deterministic replay. See spec for the exact
    /// predicate: reuse is enabled, a record exists, its file exists, it is
    /// validated, and (if hashes are enabled and stored) its hash still
    /// matches. Any mismatch triggers regeneration but never mutates state.
    pub fn should_reuse(&self, key: &str) -> bool {
        if !self.config.reuse_if_validated {
            return false;
        }

        let Some(record) = self.get(key) else {
            return false;
        };

        if !record.path.exists() {
            warn!(key, path = %record.path.display(), "artifact file missing, will regenerate");
            return false;
        }

        if !record.validated {
            info!(key, "artifact not validated, will regenerate");
            return false;
        }

        if self.config.include_hashes {
            if let Some(stored_hash) = &record.sha256 {
                match sha256_file(&record.path) {
                    Ok(current_hash) if &current_hash == stored_hash => {}
                    _ => {
                        warn!(key, "hash mismatch, will regenerate");
                        return false;
                    }
                }
            }
        }

        info!(key, "reusing validated artifact");
        true
    }

    /// Mark an artifact as validated. A no-op (not an error) if the key is
    /// absent: the runner never calls this for a key it hasn't just
    /// registered, but the manifest must not corrupt state if it happens.
    pub fn mark_validated(&mut self, key: &str) -> Result<(), ManifestError> {
        if let Some(record) = self.data.artifacts.get_mut(key) {
            record.validated = true;
            info!(key, "marked artifact as validated");
            self.save()?;
        }
        Ok(())
    }

    /// Persist the whole manifest atomically.
    pub fn save(&self) -> Result<(), ManifestError> {
        atomic_write_json(&self.manifest_path, &self.data)?;
        Ok(())
    }

    pub fn all(&self) -> &IndexMap<String, ArtifactRecord> {
        &self.data.artifacts
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
