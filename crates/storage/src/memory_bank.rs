// SPDX-License-Identifier: MIT

//! The project memory bank: a directory of plain-text and TOML files that
//! persist across jobs, plus the per-job `active_context` scratch file that
//! gets reset at the start of every run.

use oj_core::config::MemoryBankConfig;
use oj_core::job::Job;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::Value;
use tracing::info;

use crate::manifest::Manifest;

#[derive(Debug, Error)]
pub enum MemoryBankError {
    #[error("failed to read memory bank file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write memory bank file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML memory bank file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("memory bank config is missing an entry for {0:?}")]
    MissingFile(&'static str),
}

/// External long-term memory for a project: a project brief, invariant
/// policies, accumulated system patterns, a glossary and preferences, a
/// progress log, and a per-job active context.
pub struct MemoryBank {
    root: PathBuf,
    config: MemoryBankConfig,
}

impl MemoryBank {
    pub fn new(config: MemoryBankConfig) -> Self {
        let root = PathBuf::from(&config.root);
        info!(root = %root.display(), "memory bank initialized");
        Self { root, config }
    }

    fn file_path(&self, name: &'static str) -> Result<PathBuf, MemoryBankError> {
        let relative = self
            .config
            .files
            .get(name)
            .ok_or(MemoryBankError::MissingFile(name))?;
        Ok(self.root.join(relative))
    }

    fn read_text_or_empty(&self, name: &'static str) -> Result<String, MemoryBankError> {
        let path = self.file_path(name)?;
        if !path.exists() {
            return Ok(String::new());
        }
        std::fs::read_to_string(&path).map_err(|source| MemoryBankError::Read {
            path: path.display().to_string(),
            source,
        })
    }

    fn read_toml_or_empty(&self, name: &'static str) -> Result<BTreeMap<String, Value>, MemoryBankError> {
        let path = self.file_path(name)?;
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| MemoryBankError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| MemoryBankError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Reset the active context at the start of every job. The only write
    /// that happens unconditionally, regardless of what the run does next.
    pub fn reset_active_context(&self) -> Result<(), MemoryBankError> {
        let path = self.file_path("active_context")?;
        write_text(&path, "# Active Context\n\n(Reset at job start)\n")?;
        info!("active context reset");
        Ok(())
    }

    pub fn read_project_brief(&self) -> Result<String, MemoryBankError> {
        self.read_text_or_empty("project_brief")
    }

    pub fn read_system_patterns(&self) -> Result<String, MemoryBankError> {
        self.read_text_or_empty("system_patterns")
    }

    pub fn read_policies(&self) -> Result<String, MemoryBankError> {
        self.read_text_or_empty("policies")
    }

    pub fn read_glossary(&self) -> Result<BTreeMap<String, Value>, MemoryBankError> {
        self.read_toml_or_empty("glossary")
    }

    pub fn read_preferences(&self) -> Result<BTreeMap<String, Value>, MemoryBankError> {
        self.read_toml_or_empty("preferences")
    }

    /// Append one entry to the progress log, surrounded by blank lines. The
    /// only memory-bank write besides `reset_active_context` that happens
    /// outside a job's own workdir.
    pub fn append_progress(&self, entry: &str) -> Result<(), MemoryBankError> {
        let path = self.file_path("progress")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| MemoryBankError::Write {
                path: path.display().to_string(),
                source,
            })?;
        }
        use std::io::Write as _;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| MemoryBankError::Write {
                path: path.display().to_string(),
                source,
            })?;
        write!(file, "\n{entry}\n").map_err(|source| MemoryBankError::Write {
            path: path.display().to_string(),
            source,
        })?;
        info!("progress log updated");
        Ok(())
    }

    /// Concatenated context for a step to consume: project brief, policies,
    /// then system patterns, under labeled headers, empty sections omitted.
    pub fn memory_context(&self) -> Result<String, MemoryBankError> {
        let mut parts = Vec::new();

        let brief = self.read_project_brief()?;
        if !brief.is_empty() {
            parts.push(format!("# Project Brief\n{brief}"));
        }

        let policies = self.read_policies()?;
        if !policies.is_empty() {
            parts.push(format!("# Policies\n{policies}"));
        }

        let patterns = self.read_system_patterns()?;
        if !patterns.is_empty() {
            parts.push(format!("# System Patterns\n{patterns}"));
        }

        Ok(parts.join("\n\n"))
    }
}

fn write_text(path: &Path, contents: &str) -> Result<(), MemoryBankError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| MemoryBankError::Write {
            path: path.display().to_string(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| MemoryBankError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Render a proposal for updating `system_patterns` from one job's outcome.
/// A pure reducer over the manifest and job metadata: it never touches the
/// memory bank itself, leaving the decision to fold the pattern in to a
/// human.
pub fn distill_success_patterns(job: &Job, manifest: &Manifest) -> String {
    let metadata = job.metadata();
    let artifacts = manifest.all();

    let validated_count = artifacts.values().filter(|a| a.validated).count();
    let total_count = artifacts.len();

    let mut lines = vec![
        "# Success Pattern Proposal".to_string(),
        String::new(),
        format!("## Job: {} ({})", metadata.task_name, metadata.job_id),
        String::new(),
        "### Outcomes".to_string(),
        format!("- Artifacts created: {total_count}"),
        format!("- Artifacts validated: {validated_count}"),
    ];

    if !artifacts.is_empty() {
        lines.push(String::new());
        lines.push("### Artifacts".to_string());
        for (key, artifact) in artifacts {
            let status = if artifact.validated { "✓" } else { "✗" };
            lines.push(format!("- {status} {key} ({})", artifact.producer_step));
        }
    }

    lines.push(String::new());
    lines.push("### Suggested Pattern".to_string());
    lines.push(format!("**Task Type**: {}", metadata.task_name));
    lines.push(format!(
        "**Success Criteria**: {validated_count}/{total_count} artifacts validated"
    ));
    lines.push(String::new());
    lines.push("**Abstracted Steps**:".to_string());
    lines.push(
        "(Edit this section to describe the general pattern, removing specific file names/content)"
            .to_string(),
    );

    lines.join("\n")
}

#[cfg(test)]
#[path = "memory_bank_tests.rs"]
mod tests;
