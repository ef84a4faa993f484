// SPDX-License-Identifier: MIT

//! `oj distill` — render a success-pattern proposal from a completed job's
//! manifest. Per spec.md §9's Open Questions, distillation into prose is
//! out of scope for the core; what's in scope (and implemented here) is
//! the pure reducer `oj_storage::distill_success_patterns` over
//! `Manifest::all()` + `Job::metadata()`, carried over from
//! `original_source/agent_os/memory/distill.py`. The proposal is written
//! next to the job workdir for a human to fold into `system_patterns` by
//! hand — this command never writes to the memory bank itself.

use anyhow::{Context, Result};
use clap::Args;
use oj_core::clock::SystemClock;
use oj_core::config::Config;
use oj_core::job::Job;
use oj_storage::manifest::Manifest;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct DistillArgs {
    /// Job id to distill.
    #[arg(long = "job")]
    pub job: String,

    /// Task name to record in the proposal header (cosmetic only; the job
    /// id alone determines the workdir).
    #[arg(long = "task-name", default_value = "unknown")]
    pub task_name: String,

    /// Path to a TOML config file overriding built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn handle(args: DistillArgs) -> Result<()> {
    let config = match args.config {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let clock = SystemClock;
    let job = Job::new(
        args.task_name,
        indexmap::IndexMap::new(),
        Some(args.job),
        &config,
        &clock,
    );

    job.setup_workdir()
        .with_context(|| format!("failed to create job workdir {}", job.workdir.display()))?;

    let manifest_path = job.artifact_path(&config.artifacts.manifest_file);
    let manifest = Manifest::load_or_default(manifest_path, config.artifacts.clone())
        .context("failed to load manifest")?;

    let proposal = oj_storage::distill_success_patterns(&job, &manifest);
    let proposal_path = job.workdir.join("success_pattern_proposal.md");
    std::fs::write(&proposal_path, &proposal)
        .with_context(|| format!("failed to write {}", proposal_path.display()))?;

    info!(path = %proposal_path.display(), "wrote success pattern proposal");
    println!("{proposal}");
    Ok(())
}

#[cfg(test)]
#[path = "distill_tests.rs"]
mod tests;
