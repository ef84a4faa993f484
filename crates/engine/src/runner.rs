// SPDX-License-Identifier: MIT

//! The execution engine: drives an ordered list of steps through the
//! per-step state machine (`Pending -> Skipped` or `Pending -> Attempting(n)
//! -> Validated | Failed`), updates the manifest, and writes the execution
//! summary and failure report.

use crate::error::{RunnerError, StepExecutionError};
use crate::step::{Step, StepContext};
use indexmap::IndexMap;
use oj_core::config::Config;
use oj_core::io::atomic_write_json;
use oj_core::job::Job;
use oj_storage::manifest::Manifest;
use oj_storage::memory_bank::MemoryBank;
use serde::Serialize;
use std::cell::RefCell;
use tracing::{info, warn};

/// Terminal record written after the runner completes, success or fatal
/// stop.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    pub job_id: String,
    pub steps_total: usize,
    pub steps_executed: usize,
    pub steps_skipped: usize,
    pub steps_failed: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
}

/// Internal outcome of one step's full retry loop: either it failed after
/// exhausting its attempts (recoverable at the job level, subject to
/// `stop_on_fail`), or something fatal happened that must abort the whole
/// job (manifest I/O, memory bank I/O).
enum AttemptOutcome {
    Failed {
        attempts: u32,
        source: StepExecutionError,
    },
    Fatal(RunnerError),
}

impl From<oj_storage::ManifestError> for AttemptOutcome {
    fn from(source: oj_storage::ManifestError) -> Self {
        AttemptOutcome::Fatal(RunnerError::ManifestIo(source))
    }
}

/// The core state machine. Owns the job's manifest and memory bank for the
/// duration of one run; no two runners may share a manifest file.
pub struct Runner {
    job: Job,
    config: Config,
    manifest: Manifest,
    memory_bank: MemoryBank,
    scratch: RefCell<IndexMap<String, String>>,
}

impl Runner {
    /// Construct a runner for `job`: creates the workdir tree, loads (or
    /// starts) the manifest, attaches the memory bank, and resets
    /// `active_context`. Fatal at job start; the error variants returned
    /// here never participate in the per-step retry loop.
    pub fn new(job: Job, config: Config) -> Result<Self, RunnerError> {
        job.setup_workdir()?;

        let manifest_path = job.artifact_path(&config.artifacts.manifest_file);
        let manifest = Manifest::load_or_default(manifest_path, config.artifacts.clone())?;

        let memory_bank = MemoryBank::new(config.memory_bank.clone());
        memory_bank.reset_active_context()?;

        Ok(Self {
            job,
            config,
            manifest,
            memory_bank,
            scratch: RefCell::new(IndexMap::new()),
        })
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Drive `steps` to completion (or to the first fatal stop) and return
    /// the execution summary. Always attempts to write
    /// `execution_summary.json`, whether the run succeeded or not.
    pub fn run(&mut self, steps: Vec<Box<dyn Step>>) -> ExecutionSummary {
        let steps_total = steps.len();
        info!(job_id = %self.job.job_id, steps_total, "starting run");

        let mut steps_executed = 0usize;
        let mut steps_skipped = 0usize;
        let mut steps_failed = 0usize;
        let mut success = true;
        let mut error = None;
        let mut failed_step = None;

        for step in &steps {
            let should_skip = {
                let ctx = StepContext::new(&self.job, &self.manifest, &self.memory_bank, &self.scratch);
                step.should_skip(&ctx)
            };
            if should_skip {
                steps_skipped += 1;
                info!(step_id = step.step_id(), "skipping step, outputs reusable");
                continue;
            }

            match self.attempt_step(step.as_ref()) {
                Ok(()) => {
                    steps_executed += 1;
                }
                Err(AttemptOutcome::Failed { attempts, source }) => {
                    steps_failed += 1;
                    success = false;
                    error = Some(source.to_string());
                    failed_step = Some(step.step_id().to_string());
                    self.write_failure_report(step.as_ref(), attempts, &source);
                    if self.config.runtime.stop_on_fail {
                        break;
                    }
                }
                Err(AttemptOutcome::Fatal(fatal)) => {
                    success = false;
                    error = Some(fatal.to_string());
                    tracing::error!(error = %fatal, "fatal error, aborting job");
                    break;
                }
            }
        }

        let summary = ExecutionSummary {
            job_id: self.job.job_id.clone(),
            steps_total,
            steps_executed,
            steps_skipped,
            steps_failed,
            success,
            error,
            failed_step,
        };

        if let Err(e) = atomic_write_json(&self.job.execution_summary_path(), &summary) {
            tracing::error!(error = %e, "failed to write execution summary");
        }

        summary
    }

    /// Run one step through its retry loop: `run` -> register unvalidated
    /// outputs -> `validate` -> `mark_validated` on success. A failing
    /// `run`/`validate` re-enters the loop up to `retries_max` attempts
    /// total (not additional retries); `retries_max = 1` means no retry.
    fn attempt_step(&mut self, step: &dyn Step) -> Result<(), AttemptOutcome> {
        let retries_max = self.config.runtime.retries_max.max(1);
        let mut last_err: Option<StepExecutionError> = None;

        for attempt in 1..=retries_max {
            let run_result = {
                let ctx =
                    StepContext::new(&self.job, &self.manifest, &self.memory_bank, &self.scratch);
                step.run(&ctx)
            };
            if let Err(e) = run_result {
                warn!(step_id = step.step_id(), attempt, error = %e, "run failed");
                last_err = Some(e);
                continue;
            }

            for key in step.outputs() {
                let output_path = {
                    let ctx = StepContext::new(
                        &self.job,
                        &self.manifest,
                        &self.memory_bank,
                        &self.scratch,
                    );
                    step.get_output_path(&ctx, key)
                };
                if output_path.exists() {
                    self.manifest.add(
                        key,
                        &output_path,
                        step.step_id(),
                        step.inputs().to_vec(),
                        None,
                        false,
                    )?;
                }
            }

            let validate_result = {
                let ctx =
                    StepContext::new(&self.job, &self.manifest, &self.memory_bank, &self.scratch);
                step.validate(&ctx)
            };
            match validate_result {
                Ok(true) => {
                    for key in step.outputs() {
                        self.manifest.mark_validated(key)?;
                    }
                    info!(step_id = step.step_id(), attempt, "step validated");
                    return Ok(());
                }
                Ok(false) => {
                    warn!(step_id = step.step_id(), attempt, "validation failed");
                    last_err = Some(StepExecutionError::Validation(
                        "validator returned false".to_string(),
                    ));
                }
                Err(e) => {
                    warn!(step_id = step.step_id(), attempt, error = %e, "validation errored");
                    last_err = Some(e);
                }
            }
        }

        Err(AttemptOutcome::Failed {
            attempts: retries_max,
            source: last_err.unwrap_or_else(|| {
                StepExecutionError::Run("step failed with no error detail".to_string())
            }),
        })
    }

    fn write_failure_report(&self, step: &dyn Step, attempts: u32, error: &StepExecutionError) {
        let error_type = match error {
            StepExecutionError::Run(_) => "run_error",
            StepExecutionError::Validation(_) => "validation_error",
        };
        let report = format!(
            "Failed Step: {} ({})\n\
             Attempts: {attempts}\n\
             Max Retries: {}\n\
             Error Type: {error_type}\n\
             Error Message: {error}\n\
             \n\
             Required User Actions:\n\
             1. Inspect the step's logs under {}.\n\
             2. Confirm the step's declared inputs and outputs are correct.\n\
             3. Fix the underlying cause and rerun the job.\n",
            step.step_id(),
            step.name(),
            self.config.runtime.retries_max,
            self.job.logs_dir.display(),
        );
        if let Err(e) = std::fs::write(self.job.failure_report_path(), report) {
            tracing::error!(error = %e, "failed to write failure report");
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
