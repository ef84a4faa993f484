// SPDX-License-Identifier: MIT

//! Immutable, process-wide configuration loaded once from a declarative
//! TOML source.
//!
//! Per the design note "process-wide lazily-initialized config singleton",
//! the old global becomes an explicit value: [`Config::load`]/[`Config::default`]
//! construct it, and callers (`Job`, `Runner`) take `&Config` by reference.
//! [`Config::global`] wraps a `OnceLock` purely as a convenience for the CLI
//! entry point; library code never reaches for it implicitly.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("config already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum attempts per step (attempts, not additional retries).
    pub retries_max: u32,
    /// Stop the whole job on a fatal step failure.
    pub stop_on_fail: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            retries_max: 3,
            stop_on_fail: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub work_root: String,
    /// Template containing `{job_id}`.
    pub job_root_template: String,
    pub logs_dir: String,
    pub artifacts_dir: String,
    pub cache_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_root: "jobs".to_string(),
            job_root_template: "jobs/{job_id}".to_string(),
            logs_dir: "logs".to_string(),
            artifacts_dir: "artifacts".to_string(),
            cache_dir: "cache".to_string(),
        }
    }
}

impl PathsConfig {
    /// Resolve `job_root_template` for a given `job_id`.
    pub fn job_root(&self, job_id: &str) -> PathBuf {
        PathBuf::from(self.job_root_template.replace("{job_id}", job_id))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryBankConfig {
    pub root: String,
    /// Logical name -> relative filename. Must cover at minimum:
    /// project_brief, system_patterns, policies, glossary, preferences,
    /// progress, active_context.
    pub files: IndexMap<String, String>,
}

impl Default for MemoryBankConfig {
    fn default() -> Self {
        let mut files = IndexMap::new();
        files.insert("project_brief".to_string(), "projectbrief.md".to_string());
        files.insert(
            "system_patterns".to_string(),
            "systemPatterns.md".to_string(),
        );
        files.insert("policies".to_string(), "policies.md".to_string());
        files.insert("glossary".to_string(), "glossary.toml".to_string());
        files.insert("preferences".to_string(), "preferences.toml".to_string());
        files.insert("progress".to_string(), "progress.md".to_string());
        files.insert(
            "active_context".to_string(),
            "activeContext.md".to_string(),
        );
        Self {
            root: "memory-bank".to_string(),
            files,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub manifest_file: String,
    pub include_hashes: bool,
    pub include_tool_versions: bool,
    pub reuse_if_validated: bool,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            manifest_file: "manifest.json".to_string(),
            include_hashes: true,
            include_tool_versions: false,
            reuse_if_validated: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub jsonschema_strict: bool,
    pub fail_fast: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            jsonschema_strict: true,
            fail_fast: true,
        }
    }
}

/// Complete runner configuration (single source of truth).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub paths: PathsConfig,
    pub memory_bank: MemoryBankConfig,
    pub artifacts: ArtifactsConfig,
    pub validation: ValidationConfig,
}

static GLOBAL: OnceLock<Config> = OnceLock::new();

impl Config {
    /// Load configuration from a TOML file. Missing sections fall back to
    /// their field defaults.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Initialize the process-wide config exactly once. Returns an error if
    /// already initialized; re-reading the source mid-run is not supported.
    pub fn init_global(config: Config) -> Result<(), ConfigError> {
        GLOBAL
            .set(config)
            .map_err(|_| ConfigError::AlreadyInitialized)
    }

    /// Fetch the process-wide config, initializing it to defaults on first
    /// access if [`Config::init_global`] was never called.
    pub fn global() -> &'static Config {
        GLOBAL.get_or_init(Config::default)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
