// SPDX-License-Identifier: MIT

//! `oj replay` — re-run an existing job id against the same task
//! declaration. Per spec.md §6/§9, the original's `cmd_replay` was a stub
//! ("Replay not yet implemented"); the core's contract already covers
//! replay semantics through the reuse rules in `Manifest::should_reuse`, so
//! this command is exactly `run` pinned to a known job id, with
//! `reuse_if_validated` forced on regardless of the loaded config —
//! replay's entire point is to skip what's already validated.

use super::common::{build_inputs, execute, load_config, print_summary};
use crate::exit_error::ExitError;
use crate::task::load_task_spec;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Job id to replay.
    #[arg(long = "job")]
    pub job: String,

    /// Path to the task declaration (JSON) the job was originally run with.
    #[arg(long)]
    pub task: PathBuf,

    /// Input file path, bound to the `input_file` job input.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Path to a TOML config file overriding built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn handle(args: ReplayArgs) -> Result<()> {
    info!(job = %args.job, "replaying job");

    let task = load_task_spec(&args.task)?;
    let mut config = load_config(args.config.as_deref())?;
    config.artifacts.reuse_if_validated = true;
    let inputs = build_inputs(args.input.as_deref());

    let (job, summary) = execute(&task, config, inputs, Some(args.job))?;
    print_summary(&summary);

    if summary.steps_executed == 0 && summary.steps_total > 0 {
        info!("deterministic replay: every step was skipped as already validated");
    }

    if !summary.success {
        tracing::error!(
            failure_report = %job.failure_report_path().display(),
            "replay failed; see failure report"
        );
        return Err(ExitError::code(1));
    }

    Ok(())
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
