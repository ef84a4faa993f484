// SPDX-License-Identifier: MIT

//! `oj run` — the Rust analogue of `agent_os_cli.py`'s `cmd_run`: load a
//! task declaration, resolve a job (fresh by default, pinned with
//! `--job-id` to reuse an existing workdir), build its steps, and drive the
//! runner to completion.

use super::common::{build_inputs, execute, load_config, print_summary};
use crate::exit_error::ExitError;
use crate::task::load_task_spec;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the task declaration (JSON).
    #[arg(long)]
    pub task: PathBuf,

    /// Input file path, bound to the `input_file` job input.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Path to a TOML config file overriding built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pin the job id instead of deriving it from inputs + timestamp.
    #[arg(long = "job-id")]
    pub job_id: Option<String>,
}

pub fn handle(args: RunArgs) -> Result<()> {
    info!("============================================================");
    info!("Odd Jobs - Run Task");
    info!("============================================================");

    let task = load_task_spec(&args.task)?;
    let config = load_config(args.config.as_deref())?;
    let inputs = build_inputs(args.input.as_deref());

    let (job, summary) = execute(&task, config, inputs, args.job_id)?;
    print_summary(&summary);

    if !summary.success {
        tracing::error!(
            failure_report = %job.failure_report_path().display(),
            "job failed; see failure report"
        );
        return Err(ExitError::code(1));
    }

    info!(artifacts = %job.artifacts_dir.display(), logs = %job.logs_dir.display(), "job succeeded");
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
