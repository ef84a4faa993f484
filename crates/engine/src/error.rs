// SPDX-License-Identifier: MIT

//! Error taxonomy for the execution engine.
//!
//! `RunnerError` covers the fatal, unrecovered kinds (config, workspace,
//! manifest I/O); `StepExecutionError` is the terminal, per-step error that
//! escapes only after retries are exhausted.

use thiserror::Error;

/// A step's `run` or `validate` failed on one attempt. Recovered locally by
/// the retry loop; only its final, post-exhaustion form is surfaced to the
/// caller as part of [`RunnerError::StepExecution`].
#[derive(Debug, Error, Clone)]
pub enum StepExecutionError {
    #[error("run failed: {0}")]
    Run(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Fatal errors that abort a job outright. None of these are retried; the
/// runner does not write `success=true` to the execution summary if one of
/// these occurs before the summary is written.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("config error: {0}")]
    Config(#[from] oj_core::config::ConfigError),

    #[error("workspace error: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("manifest io error: {0}")]
    ManifestIo(#[from] oj_storage::ManifestError),

    #[error("memory bank error: {0}")]
    MemoryBank(#[from] oj_storage::MemoryBankError),

    #[error("step {step_id} failed after exhausting retries: {source}")]
    StepExecution {
        step_id: String,
        #[source]
        source: StepExecutionError,
    },
}

/// Informational descriptor returned by `Step::on_fail`. Carries no
/// behavior of its own; the runner folds it into the failure report.
#[derive(Debug, Clone)]
pub struct FailureDescriptor {
    pub step_id: String,
    pub error_kind: String,
    pub error_message: String,
    pub suggestion: String,
}
