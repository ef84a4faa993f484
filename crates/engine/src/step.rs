// SPDX-License-Identifier: MIT

//! The `Step` trait and the per-run context steps are invoked with.

use crate::error::{FailureDescriptor, StepExecutionError};
use indexmap::IndexMap;
use oj_core::job::Job;
use oj_storage::{manifest::Manifest, memory_bank::MemoryBank};
use std::cell::RefCell;
use std::path::PathBuf;

/// Bundles the references a step needs for one attempt: the job (for path
/// derivation), the manifest (read-only; the runner alone mutates it
/// between attempts), the memory bank, and a scratch map shared across all
/// steps for the duration of one run. The scratch map is process-local and
/// never persisted.
pub struct StepContext<'a> {
    pub job: &'a Job,
    pub manifest: &'a Manifest,
    pub memory_bank: &'a MemoryBank,
    scratch: &'a RefCell<IndexMap<String, String>>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        job: &'a Job,
        manifest: &'a Manifest,
        memory_bank: &'a MemoryBank,
        scratch: &'a RefCell<IndexMap<String, String>>,
    ) -> Self {
        Self {
            job,
            manifest,
            memory_bank,
            scratch,
        }
    }

    pub fn scratch_get(&self, key: &str) -> Option<String> {
        self.scratch.borrow().get(key).cloned()
    }

    pub fn scratch_set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.scratch.borrow_mut().insert(key.into(), value.into());
    }
}

/// A unit of work declared by a task: `step_id`, declared `inputs` and
/// `outputs` (artifact keys), and the capability set the runner drives it
/// through. Stateless between attempts: a retry re-invokes `run` from
/// scratch, with no memory of the previous attempt beyond whatever the
/// manifest or scratch map records.
pub trait Step {
    fn step_id(&self) -> &str;
    fn name(&self) -> &str;
    fn inputs(&self) -> &[String];
    fn outputs(&self) -> &[String];

    /// Perform the work. Must write every declared output to
    /// `get_output_path(ctx, key)` before returning `Ok`.
    fn run(&self, ctx: &StepContext) -> Result<(), StepExecutionError>;

    /// Predicate over the just-produced outputs. Must not mutate the
    /// manifest. The default accepts unconditionally ("no validator ⇒
    /// pass").
    fn validate(&self, _ctx: &StepContext) -> Result<bool, StepExecutionError> {
        Ok(true)
    }

    /// True iff every declared output satisfies `manifest.should_reuse`.
    /// Vacuously true for a step with no declared outputs, per spec: such a
    /// step is skipped on every run. This is deliberate, not a bug.
    fn should_skip(&self, ctx: &StepContext) -> bool {
        self.outputs()
            .iter()
            .all(|key| ctx.manifest.should_reuse(key))
    }

    /// Informational descriptor for a terminal failure; has no effect on
    /// control flow.
    fn on_fail(&self, _ctx: &StepContext, error: &StepExecutionError) -> FailureDescriptor {
        let (error_kind, suggestion) = match error {
            StepExecutionError::Run(_) => (
                "run_error".to_string(),
                "Inspect the step's logs and rerun once the underlying cause is fixed."
                    .to_string(),
            ),
            StepExecutionError::Validation(_) => (
                "validation_error".to_string(),
                "Inspect the produced artifact against its validator and adjust the step config."
                    .to_string(),
            ),
        };
        FailureDescriptor {
            step_id: self.step_id().to_string(),
            error_kind,
            error_message: error.to_string(),
            suggestion,
        }
    }

    /// Map each declared input key to the path recorded in the manifest.
    /// Input keys with no manifest record are simply absent from the map.
    fn get_input_paths(&self, ctx: &StepContext) -> IndexMap<String, PathBuf> {
        self.inputs()
            .iter()
            .filter_map(|key| {
                ctx.manifest
                    .get(key)
                    .map(|record| (key.clone(), record.path.clone()))
            })
            .collect()
    }

    /// Deterministic function of `(job, key)`.
    fn get_output_path(&self, ctx: &StepContext, key: &str) -> PathBuf {
        ctx.job.artifact_path(key)
    }
}

/// Decorates a step with an explicit `validator_config`, overriding its
/// default `validate` with a check over the [`crate::validators`] primitives
/// applied to every declared output. Every other capability delegates to the
/// wrapped step unchanged. Built by the task-declaration registry when a
/// step's declaration carries a `validator` field; steps with none keep
/// their own `validate`.
pub struct ValidatedStep {
    inner: Box<dyn Step>,
    validator: crate::validators::ValidatorConfig,
}

impl ValidatedStep {
    pub fn new(inner: Box<dyn Step>, validator: crate::validators::ValidatorConfig) -> Self {
        Self { inner, validator }
    }
}

impl Step for ValidatedStep {
    fn step_id(&self) -> &str {
        self.inner.step_id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn inputs(&self) -> &[String] {
        self.inner.inputs()
    }

    fn outputs(&self) -> &[String] {
        self.inner.outputs()
    }

    fn run(&self, ctx: &StepContext) -> Result<(), StepExecutionError> {
        self.inner.run(ctx)
    }

    fn validate(&self, ctx: &StepContext) -> Result<bool, StepExecutionError> {
        for key in self.outputs() {
            let path = self.get_output_path(ctx, key);
            let ok = self
                .validator
                .check(&path)
                .map_err(|e| StepExecutionError::Validation(e.to_string()))?;
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn should_skip(&self, ctx: &StepContext) -> bool {
        self.inner.should_skip(ctx)
    }

    fn on_fail(&self, ctx: &StepContext, error: &StepExecutionError) -> FailureDescriptor {
        self.inner.on_fail(ctx, error)
    }

    fn get_input_paths(&self, ctx: &StepContext) -> IndexMap<String, PathBuf> {
        self.inner.get_input_paths(ctx)
    }

    fn get_output_path(&self, ctx: &StepContext, key: &str) -> PathBuf {
        self.inner.get_output_path(ctx, key)
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
