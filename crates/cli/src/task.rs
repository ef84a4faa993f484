// SPDX-License-Identifier: MIT

//! Task declaration format consumed by this binary.
//!
//! Per spec.md §6, the core never parses this document — it receives an
//! already-constructed `Vec<Box<dyn Step>>`. This module is the external
//! collaborator: an already-structured JSON document listing steps with
//! `{id, name, type, config, inputs, outputs, validator}`, and a small
//! built-in step registry mapping `type` to a `Step` variant. Grounded on
//! `create_steps_from_spec`/`step_classes` in the original
//! `agent_os_cli.py`, translated from its YAML+`step_classes` dict dispatch
//! to a Rust `match` over `&str`.

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use oj_engine::steps_builtin::{LoadInputStep, ShellStep, StdCommandRunner, StubStep, SummarizeStep};
use oj_engine::{Step, ValidatedStep, ValidatorConfig};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub steps: Vec<StepSpec>,
}

#[derive(Debug, Deserialize)]
pub struct StepSpec {
    pub id: String,
    /// Human-readable label. Informational only — the runtime step kind
    /// decides `Step::name()`, mirroring the original's `step_config["name"]`
    /// which was likewise never read back by the executor.
    #[allow(dead_code)]
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub validator: Option<Value>,
}

/// Load and parse a task declaration from disk.
pub fn load_task_spec(path: &Path) -> Result<TaskSpec> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read task declaration {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse task declaration {}", path.display()))
}

/// Build the runtime step list from a task declaration, substituting
/// `{input_key}` placeholders in string config values with the job's
/// resolved inputs — the Rust analogue of `create_steps_from_spec`'s plain
/// string replacement loop.
pub fn build_steps(task: &TaskSpec, inputs: &IndexMap<String, String>) -> Result<Vec<Box<dyn Step>>> {
    task.steps.iter().map(|spec| build_step(spec, inputs)).collect()
}

fn substitute(value: &Value, inputs: &IndexMap<String, String>) -> Value {
    match value {
        Value::String(s) if s.contains('{') => {
            let mut resolved = s.clone();
            for (key, input_value) in inputs {
                resolved = resolved.replace(&format!("{{{key}}}"), input_value);
            }
            Value::String(resolved)
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, inputs)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn build_step(spec: &StepSpec, inputs: &IndexMap<String, String>) -> Result<Box<dyn Step>> {
    let config = substitute(&spec.config, inputs);

    let step: Box<dyn Step> = match spec.kind.as_str() {
        "load-input" => {
            let input_file: PathBuf = config
                .get("input_file")
                .and_then(Value::as_str)
                .map(PathBuf::from)
                .or_else(|| inputs.get("input_file").map(PathBuf::from))
                .ok_or_else(|| {
                    anyhow::anyhow!("step {}: load-input requires config.input_file", spec.id)
                })?;
            Box::new(LoadInputStep {
                step_id: spec.id.clone(),
                input_file,
                outputs: spec.outputs.clone(),
            })
        }
        "summarize" => {
            let max_summary_length = config
                .get("max_summary_length")
                .and_then(Value::as_u64)
                .unwrap_or(200) as usize;
            Box::new(SummarizeStep {
                step_id: spec.id.clone(),
                inputs: spec.inputs.clone(),
                outputs: spec.outputs.clone(),
                max_summary_length,
            })
        }
        "stub" => Box::new(StubStep {
            step_id: spec.id.clone(),
            outputs: spec.outputs.clone(),
        }),
        "shell" | "shell-command" => {
            let command = config
                .get("command")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("step {}: shell requires config.command", spec.id))?
                .to_string();
            Box::new(ShellStep {
                step_id: spec.id.clone(),
                command,
                outputs: spec.outputs.clone(),
                runner: Box::new(StdCommandRunner),
            })
        }
        other => bail!("step {}: unknown step type {other:?}", spec.id),
    };

    match &spec.validator {
        Some(value) if !value.is_null() => {
            let validator: ValidatorConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("step {}: invalid validator config", spec.id))?;
            Ok(Box::new(ValidatedStep::new(step, validator)))
        }
        _ => Ok(step),
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
