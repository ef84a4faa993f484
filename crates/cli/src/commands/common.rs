// SPDX-License-Identifier: MIT

//! Shared plumbing between `run` and `replay`: load config, build the job
//! and its step list from a task declaration, and drive the runner.

use crate::task::{self, TaskSpec};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use oj_core::clock::SystemClock;
use oj_core::config::Config;
use oj_core::job::Job;
use oj_engine::{ExecutionSummary, Runner};
use std::path::Path;
use tracing::info;

pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(Config::default()),
    }
}

pub fn build_inputs(input: Option<&Path>) -> IndexMap<String, String> {
    let mut inputs = IndexMap::new();
    if let Some(path) = input {
        inputs.insert("input_file".to_string(), path.display().to_string());
    }
    inputs
}

/// Construct the job, build its steps from `task`, and drive it to
/// completion. `job_id` pins the job identity (required for `replay`,
/// optional for a fresh `run`).
pub fn execute(
    task: &TaskSpec,
    config: Config,
    inputs: IndexMap<String, String>,
    job_id: Option<String>,
) -> Result<(Job, ExecutionSummary)> {
    let clock = SystemClock;
    let job = Job::new(task.name.clone(), inputs, job_id, &config, &clock);

    info!(job_id = %job.job_id, workdir = %job.workdir.display(), "job identity resolved");

    let steps = task::build_steps(task, &job.inputs)?;

    let mut runner = Runner::new(job.clone(), config).context("failed to initialize runner")?;
    let summary = runner.run(steps);
    Ok((job, summary))
}

pub fn print_summary(summary: &ExecutionSummary) {
    info!("============================================================");
    info!("Execution Summary");
    info!("============================================================");
    info!(job_id = %summary.job_id, "job id");
    info!(steps_total = summary.steps_total, "steps total");
    info!(steps_executed = summary.steps_executed, "steps executed");
    info!(steps_skipped = summary.steps_skipped, "steps skipped");
    info!(steps_failed = summary.steps_failed, "steps failed");
    info!(success = summary.success, "success");
    if !summary.success {
        if let Some(step) = &summary.failed_step {
            tracing::error!(failed_step = %step, "failed step");
        }
        if let Some(error) = &summary.error {
            tracing::error!(error = %error, "error");
        }
    }
}
