// SPDX-License-Identifier: MIT

//! Job identifier, workspace layout, and path derivation for one job
//! instance.

use crate::clock::Clock;
use crate::config::Config;
use crate::hashing::short_input_hash;
use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::io;
use std::path::PathBuf;

/// Stable identifier for one job instance.
pub type JobId = String;

/// Job metadata, as returned by [`Job::metadata`].
#[derive(Debug, Clone, Serialize)]
pub struct JobMetadata {
    pub job_id: JobId,
    pub task_name: String,
    pub inputs: IndexMap<String, String>,
    pub workdir: String,
    /// Free-form build/runtime descriptor; the Rust analogue of the
    /// original implementation's `python_version` field (kept descriptive,
    /// not language-specific, per the manifest format's `tool_versions`).
    pub runtime_version: String,
}

/// Identity, workspace layout, and path derivation for one job instance.
///
/// A `Job` owns its workdir subtree exclusively and is immutable once
/// constructed: `job_id`, `task_name`, and `inputs` never change after
/// [`Job::new`] returns.
#[derive(Debug, Clone)]
pub struct Job {
    pub job_id: JobId,
    pub task_name: String,
    pub inputs: IndexMap<String, String>,
    pub workdir: PathBuf,
    pub logs_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl Job {
    /// Create a new job. If `job_id` is `None`, it is derived deterministically
    /// as `{timestamp}_{short_hash(inputs)}`, where `timestamp` is the clock's
    /// current time truncated to the second. Two calls with the same inputs
    /// and the same clock tick produce the same id.
    pub fn new(
        task_name: impl Into<String>,
        inputs: IndexMap<String, String>,
        job_id: Option<String>,
        config: &Config,
        clock: &impl Clock,
    ) -> Self {
        let task_name = task_name.into();
        let job_id = job_id.unwrap_or_else(|| derive_job_id(&inputs, clock));

        let workdir = config.paths.job_root(&job_id);
        let logs_dir = workdir.join(&config.paths.logs_dir);
        let artifacts_dir = workdir.join(&config.paths.artifacts_dir);
        let cache_dir = workdir.join(&config.paths.cache_dir);

        Self {
            job_id,
            task_name,
            inputs,
            workdir,
            logs_dir,
            artifacts_dir,
            cache_dir,
        }
    }

    /// Idempotently create the job's directory tree.
    pub fn setup_workdir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.workdir)?;
        std::fs::create_dir_all(&self.logs_dir)?;
        std::fs::create_dir_all(&self.artifacts_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        Ok(())
    }

    /// Path to an artifact file, a deterministic function of `(job_id, key)`.
    pub fn artifact_path(&self, key: &str) -> PathBuf {
        self.artifacts_dir.join(key)
    }

    pub fn log_path(&self, name: &str) -> PathBuf {
        self.logs_dir.join(name)
    }

    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    /// Path to the execution summary written after the run completes.
    pub fn execution_summary_path(&self) -> PathBuf {
        self.workdir.join("execution_summary.json")
    }

    /// Path to the failure report, present only if a step failed.
    pub fn failure_report_path(&self) -> PathBuf {
        self.workdir.join("failure_report.txt")
    }

    pub fn metadata(&self) -> JobMetadata {
        JobMetadata {
            job_id: self.job_id.clone(),
            task_name: self.task_name.clone(),
            inputs: self.inputs.clone(),
            workdir: self.workdir.display().to_string(),
            runtime_version: runtime_version(),
        }
    }
}

fn derive_job_id(inputs: &IndexMap<String, String>, clock: &impl Clock) -> String {
    let timestamp = Utc
        .timestamp_opt(clock.epoch_secs() as i64, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let stamp = timestamp.format("%Y%m%d_%H%M%S");
    format!("{stamp}_{}", short_input_hash(inputs))
}

fn runtime_version() -> String {
    format!("rustc-{}", option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown"))
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
