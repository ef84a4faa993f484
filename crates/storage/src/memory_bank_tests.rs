// SPDX-License-Identifier: MIT

use super::*;
use indexmap::IndexMap;
use oj_core::clock::FakeClock;
use oj_core::config::{ArtifactsConfig, Config};

fn config_in(dir: &Path) -> MemoryBankConfig {
    let mut files = IndexMap::new();
    files.insert("project_brief".to_string(), "projectbrief.md".to_string());
    files.insert(
        "system_patterns".to_string(),
        "systemPatterns.md".to_string(),
    );
    files.insert("policies".to_string(), "policies.md".to_string());
    files.insert("glossary".to_string(), "glossary.toml".to_string());
    files.insert("preferences".to_string(), "preferences.toml".to_string());
    files.insert("progress".to_string(), "progress.md".to_string());
    files.insert(
        "active_context".to_string(),
        "activeContext.md".to_string(),
    );
    MemoryBankConfig {
        root: dir.display().to_string(),
        files,
    }
}

#[test]
fn reset_active_context_writes_reset_marker() {
    let dir = tempfile::tempdir().unwrap();
    let bank = MemoryBank::new(config_in(dir.path()));
    bank.reset_active_context().unwrap();

    let path = dir.path().join("activeContext.md");
    let contents = std::fs::read_to_string(path).unwrap();
    assert!(contents.contains("Reset at job start"));
}

#[test]
fn missing_files_read_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let bank = MemoryBank::new(config_in(dir.path()));

    assert_eq!(bank.read_project_brief().unwrap(), "");
    assert_eq!(bank.read_system_patterns().unwrap(), "");
    assert_eq!(bank.read_policies().unwrap(), "");
    assert!(bank.read_glossary().unwrap().is_empty());
    assert!(bank.read_preferences().unwrap().is_empty());
}

#[test]
fn append_progress_adds_surrounding_newlines_and_preserves_prior_entries() {
    let dir = tempfile::tempdir().unwrap();
    let bank = MemoryBank::new(config_in(dir.path()));

    bank.append_progress("first entry").unwrap();
    bank.append_progress("second entry").unwrap();

    let contents = std::fs::read_to_string(dir.path().join("progress.md")).unwrap();
    assert!(contents.contains("first entry"));
    assert!(contents.contains("second entry"));
    assert!(contents.find("first entry").unwrap() < contents.find("second entry").unwrap());
}

#[test]
fn read_glossary_parses_toml_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("glossary.toml"),
        "job = \"a unit of work\"\nstep = \"one stage within a job\"\n",
    )
    .unwrap();
    let bank = MemoryBank::new(config_in(dir.path()));

    let glossary = bank.read_glossary().unwrap();
    assert_eq!(
        glossary.get("job").and_then(|v| v.as_str()),
        Some("a unit of work")
    );
}

#[test]
fn memory_context_omits_empty_sections_and_orders_brief_policies_patterns() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("projectbrief.md"), "Build a runner.").unwrap();
    std::fs::write(dir.path().join("policies.md"), "Never skip validation.").unwrap();
    // systemPatterns.md intentionally absent.

    let bank = MemoryBank::new(config_in(dir.path()));
    let context = bank.memory_context().unwrap();

    assert!(context.starts_with("# Project Brief"));
    assert!(context.contains("# Policies"));
    assert!(!context.contains("# System Patterns"));
    assert!(context.find("Project Brief").unwrap() < context.find("Policies").unwrap());
}

#[test]
fn distill_success_patterns_reports_artifact_counts_and_status_marks() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    std::fs::write(&artifact_path, b"{}").unwrap();

    let config = Config::default();
    let clock = FakeClock::default();
    let job = Job::new(
        "summarize-doc",
        IndexMap::new(),
        Some("job-xyz".to_string()),
        &config,
        &clock,
    );

    let manifest_path = dir.path().join("manifest.json");
    let mut manifest =
        Manifest::load_or_default(manifest_path, ArtifactsConfig::default()).unwrap();
    manifest
        .add("out", &artifact_path, "summarize", vec![], None, false)
        .unwrap();
    manifest.mark_validated("out").unwrap();

    let proposal = distill_success_patterns(&job, &manifest);

    assert!(proposal.contains("Success Pattern Proposal"));
    assert!(proposal.contains("summarize-doc"));
    assert!(proposal.contains("job-xyz"));
    assert!(proposal.contains("Artifacts created: 1"));
    assert!(proposal.contains("Artifacts validated: 1"));
    assert!(proposal.contains("✓ out (summarize)"));
}

#[test]
fn distill_success_patterns_marks_unvalidated_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    std::fs::write(&artifact_path, b"{}").unwrap();

    let config = Config::default();
    let clock = FakeClock::default();
    let job = Job::new(
        "task",
        IndexMap::new(),
        Some("job-1".to_string()),
        &config,
        &clock,
    );

    let manifest_path = dir.path().join("manifest.json");
    let mut manifest =
        Manifest::load_or_default(manifest_path, ArtifactsConfig::default()).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();

    let proposal = distill_success_patterns(&job, &manifest);
    assert!(proposal.contains("✗ out (s1)"));
    assert!(proposal.contains("Artifacts validated: 0"));
}
