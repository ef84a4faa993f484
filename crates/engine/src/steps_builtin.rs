// SPDX-License-Identifier: MIT

//! Example built-in step kinds. These are sample task bodies, not core
//! engine surface: `LoadInputStep`, `SummarizeStep`, and `StubStep` mirror
//! the three sample steps shipped alongside the original task runner;
//! `ShellStep` is a Rust analogue of its shell executor, implemented
//! against a swappable `CommandRunner` seam rather than spawning processes
//! itself.

use crate::error::StepExecutionError;
use crate::step::{Step, StepContext};
use crate::validators;
use serde_json::json;
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Load a plain-text input file and save it as a JSON artifact recording
/// its source path, content, and length.
pub struct LoadInputStep {
    pub step_id: String,
    pub input_file: std::path::PathBuf,
    pub outputs: Vec<String>,
}

impl Step for LoadInputStep {
    fn step_id(&self) -> &str {
        &self.step_id
    }
    fn name(&self) -> &str {
        "load-input"
    }
    fn inputs(&self) -> &[String] {
        &[]
    }
    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn run(&self, ctx: &StepContext) -> Result<(), StepExecutionError> {
        if !self.input_file.exists() {
            return Err(StepExecutionError::Run(format!(
                "input file not found: {}",
                self.input_file.display()
            )));
        }
        let content = std::fs::read_to_string(&self.input_file)
            .map_err(|e| StepExecutionError::Run(e.to_string()))?;

        let output_key = self
            .outputs
            .first()
            .ok_or_else(|| StepExecutionError::Run("load-input step declares no outputs".to_string()))?;
        let output_path = self.get_output_path(ctx, output_key);

        let artifact = json!({
            "source_file": self.input_file.display().to_string(),
            "content": content,
            "length": content.chars().count(),
        });
        write_json(&output_path, &artifact).map_err(|e| StepExecutionError::Run(e.to_string()))?;

        info!(step_id = %self.step_id, chars = content.chars().count(), "loaded input");
        Ok(())
    }

    fn validate(&self, ctx: &StepContext) -> Result<bool, StepExecutionError> {
        let Some(output_key) = self.outputs.first() else {
            return Ok(true);
        };
        let output_path = self.get_output_path(ctx, output_key);
        Ok(validators::file_exists(&output_path) && validators::file_size(&output_path, 10, None))
    }
}

/// Rule-based truncate-and-stat summarization; no LLM involved.
pub struct SummarizeStep {
    pub step_id: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub max_summary_length: usize,
}

impl Step for SummarizeStep {
    fn step_id(&self) -> &str {
        &self.step_id
    }
    fn name(&self) -> &str {
        "summarize"
    }
    fn inputs(&self) -> &[String] {
        &self.inputs
    }
    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn run(&self, ctx: &StepContext) -> Result<(), StepExecutionError> {
        let input_key = self
            .inputs
            .first()
            .ok_or_else(|| StepExecutionError::Run("summarize step declares no inputs".to_string()))?;
        let input_paths = self.get_input_paths(ctx);
        let input_path = input_paths
            .get(input_key)
            .ok_or_else(|| StepExecutionError::Run(format!("no manifest record for input {input_key}")))?;

        let raw = std::fs::read_to_string(input_path)
            .map_err(|e| StepExecutionError::Run(e.to_string()))?;
        let input_data: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| StepExecutionError::Run(e.to_string()))?;
        let content = input_data
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StepExecutionError::Run("input artifact missing 'content'".to_string()))?;

        let chars: Vec<char> = content.chars().collect();
        let truncated: String = chars.iter().take(self.max_summary_length).collect();
        let summary = if chars.len() > self.max_summary_length {
            format!("{truncated}...")
        } else {
            truncated
        };

        let compression_ratio = if chars.is_empty() {
            0.0
        } else {
            (summary.chars().count() as f64 / chars.len() as f64 * 100.0).round() / 100.0
        };

        let output_key = self
            .outputs
            .first()
            .ok_or_else(|| StepExecutionError::Run("summarize step declares no outputs".to_string()))?;
        let output_path = self.get_output_path(ctx, output_key);
        let artifact = json!({
            "summary": summary,
            "original_length": chars.len(),
            "summary_length": summary.chars().count(),
            "compression_ratio": compression_ratio,
        });
        write_json(&output_path, &artifact).map_err(|e| StepExecutionError::Run(e.to_string()))?;

        info!(step_id = %self.step_id, summary_length = summary.chars().count(), "created summary");
        Ok(())
    }

    fn validate(&self, ctx: &StepContext) -> Result<bool, StepExecutionError> {
        let Some(output_key) = self.outputs.first() else {
            return Ok(true);
        };
        let output_path = self.get_output_path(ctx, output_key);
        if !validators::file_exists(&output_path) {
            return Ok(false);
        }
        let raw = match std::fs::read_to_string(&output_path) {
            Ok(raw) => raw,
            Err(_) => return Ok(false),
        };
        let data: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(_) => return Ok(false),
        };
        let summary_ok = data
            .get("summary")
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.is_empty());
        let has_original_length = data.get("original_length").is_some();
        Ok(summary_ok && has_original_length)
    }
}

/// Writes a fixed stub payload for every declared output. Used in tests and
/// as a placeholder for steps whose real body isn't wired up yet.
pub struct StubStep {
    pub step_id: String,
    pub outputs: Vec<String>,
}

impl Step for StubStep {
    fn step_id(&self) -> &str {
        &self.step_id
    }
    fn name(&self) -> &str {
        "stub"
    }
    fn inputs(&self) -> &[String] {
        &[]
    }
    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn run(&self, ctx: &StepContext) -> Result<(), StepExecutionError> {
        info!(step_id = %self.step_id, "running stub step");
        for output_key in &self.outputs {
            let output_path = self.get_output_path(ctx, output_key);
            let artifact = json!({
                "step_id": self.step_id,
                "status": "stub",
                "message": format!("Stub output for {output_key}"),
            });
            write_json(&output_path, &artifact).map_err(|e| StepExecutionError::Run(e.to_string()))?;
        }
        Ok(())
    }

    fn validate(&self, ctx: &StepContext) -> Result<bool, StepExecutionError> {
        for output_key in &self.outputs {
            let output_path = self.get_output_path(ctx, output_key);
            if !validators::file_exists(&output_path) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// The external collaborator seam for subprocess execution: `ShellStep`
/// never spawns a process itself, it hands the command to a
/// `CommandRunner`. `StdCommandRunner` is the default, real implementation;
/// tests substitute a fake.
pub trait CommandRunner: Send + Sync {
    fn run_command(&self, command: &str, workdir: Option<&Path>) -> std::io::Result<CommandOutput>;
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

/// Runs commands through `std::process::Command` via the host shell.
pub struct StdCommandRunner;

impl CommandRunner for StdCommandRunner {
    fn run_command(&self, command: &str, workdir: Option<&Path>) -> std::io::Result<CommandOutput> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = workdir {
            cmd.current_dir(dir);
        }
        let output = cmd.output()?;
        Ok(CommandOutput {
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs a shell command and records its output as a JSON artifact.
/// Validation requires `returncode == 0`.
pub struct ShellStep {
    pub step_id: String,
    pub command: String,
    pub outputs: Vec<String>,
    pub runner: Box<dyn CommandRunner>,
}

impl Step for ShellStep {
    fn step_id(&self) -> &str {
        &self.step_id
    }
    fn name(&self) -> &str {
        "shell-command"
    }
    fn inputs(&self) -> &[String] {
        &[]
    }
    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn run(&self, ctx: &StepContext) -> Result<(), StepExecutionError> {
        let result = self
            .runner
            .run_command(&self.command, Some(&ctx.job.workdir))
            .map_err(|e| StepExecutionError::Run(e.to_string()))?;

        if !result.success() {
            tracing::warn!(step_id = %self.step_id, code = result.status_code, "command failed");
        }

        let Some(output_key) = self.outputs.first() else {
            if !result.success() {
                return Err(StepExecutionError::Run(format!(
                    "command exited with code {}: {}",
                    result.status_code, result.stderr
                )));
            }
            return Ok(());
        };
        let output_path = self.get_output_path(ctx, output_key);
        let artifact = json!({
            "command": self.command,
            "returncode": result.status_code,
            "stdout": result.stdout,
            "stderr": result.stderr,
            "success": result.success(),
        });
        write_json(&output_path, &artifact).map_err(|e| StepExecutionError::Run(e.to_string()))?;

        if !result.success() {
            return Err(StepExecutionError::Run(format!(
                "command exited with code {}: {}",
                result.status_code, result.stderr
            )));
        }
        Ok(())
    }

    fn validate(&self, ctx: &StepContext) -> Result<bool, StepExecutionError> {
        let Some(output_key) = self.outputs.first() else {
            return Ok(true);
        };
        let output_path = self.get_output_path(ctx, output_key);
        if !validators::file_exists(&output_path) {
            return Ok(false);
        }
        let raw = std::fs::read_to_string(&output_path)
            .map_err(|e| StepExecutionError::Validation(e.to_string()))?;
        let data: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| StepExecutionError::Validation(e.to_string()))?;
        Ok(data.get("success").and_then(|v| v.as_bool()).unwrap_or(false))
    }
}

fn write_json(path: &Path, value: &serde_json::Value) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, serialized)
}

#[cfg(test)]
#[path = "steps_builtin_tests.rs"]
mod tests;
