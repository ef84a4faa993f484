// SPDX-License-Identifier: MIT

use super::*;
use indexmap::IndexMap as Map;
use oj_core::clock::FakeClock;
use oj_core::config::{ArtifactsConfig, Config};
use oj_storage::manifest::Manifest;
use oj_storage::memory_bank::MemoryBank;
use std::cell::RefCell;
use std::sync::Mutex;

fn context_pieces(dir: &Path) -> (oj_core::job::Job, Manifest, MemoryBank) {
    let mut config = Config::default();
    config.paths.job_root_template = format!("{}/{{job_id}}", dir.display());
    config.memory_bank.root = format!("{}/memory-bank", dir.display());
    let clock = FakeClock::default();
    let job = oj_core::job::Job::new(
        "task",
        Map::new(),
        Some("job-1".to_string()),
        &config,
        &clock,
    );
    job.setup_workdir().unwrap();
    let manifest =
        Manifest::load_or_default(dir.join("manifest.json"), ArtifactsConfig::default()).unwrap();
    let memory_bank = MemoryBank::new(config.memory_bank);
    (job, manifest, memory_bank)
}

#[test]
fn load_input_step_reads_file_and_writes_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let input_file = dir.path().join("input.txt");
    std::fs::write(&input_file, "hello world, this is long enough input text").unwrap();

    let (job, manifest, memory_bank) = context_pieces(dir.path());
    let scratch = RefCell::new(Map::new());
    let ctx = StepContext::new(&job, &manifest, &memory_bank, &scratch);

    let step = LoadInputStep {
        step_id: "load".to_string(),
        input_file: input_file.clone(),
        outputs: vec!["loaded.json".to_string()],
    };
    step.run(&ctx).unwrap();
    assert!(step.validate(&ctx).unwrap());

    let output = job.artifact_path("loaded.json");
    let content: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
    assert_eq!(
        content["source_file"].as_str().unwrap(),
        input_file.display().to_string()
    );
}

#[test]
fn load_input_step_fails_when_input_missing() {
    let dir = tempfile::tempdir().unwrap();
    let (job, manifest, memory_bank) = context_pieces(dir.path());
    let scratch = RefCell::new(Map::new());
    let ctx = StepContext::new(&job, &manifest, &memory_bank, &scratch);

    let step = LoadInputStep {
        step_id: "load".to_string(),
        input_file: dir.path().join("missing.txt"),
        outputs: vec!["loaded.json".to_string()],
    };
    assert!(step.run(&ctx).is_err());
}

#[test]
fn summarize_step_truncates_and_reports_stats() {
    let dir = tempfile::tempdir().unwrap();
    let (job, mut manifest, memory_bank) = context_pieces(dir.path());

    let input_path = job.artifact_path("loaded.json");
    std::fs::write(
        &input_path,
        serde_json::json!({"content": "x".repeat(500)}).to_string(),
    )
    .unwrap();
    manifest
        .add("loaded.json", &input_path, "load", vec![], None, true)
        .unwrap();

    let scratch = RefCell::new(Map::new());
    let ctx = StepContext::new(&job, &manifest, &memory_bank, &scratch);

    let step = SummarizeStep {
        step_id: "sum".to_string(),
        inputs: vec!["loaded.json".to_string()],
        outputs: vec!["summary.json".to_string()],
        max_summary_length: 200,
    };
    step.run(&ctx).unwrap();
    assert!(step.validate(&ctx).unwrap());

    let summary: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(job.artifact_path("summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["original_length"], 500);
    assert!(summary["summary"].as_str().unwrap().ends_with("..."));
}

#[test]
fn stub_step_writes_all_declared_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let (job, manifest, memory_bank) = context_pieces(dir.path());
    let scratch = RefCell::new(Map::new());
    let ctx = StepContext::new(&job, &manifest, &memory_bank, &scratch);

    let step = StubStep {
        step_id: "s1".to_string(),
        outputs: vec!["a.json".to_string(), "b.json".to_string()],
    };
    step.run(&ctx).unwrap();
    assert!(step.validate(&ctx).unwrap());
    assert!(job.artifact_path("a.json").exists());
    assert!(job.artifact_path("b.json").exists());
}

struct FakeCommandRunner {
    output: Mutex<Option<CommandOutput>>,
}

impl CommandRunner for FakeCommandRunner {
    fn run_command(&self, _command: &str, _workdir: Option<&Path>) -> std::io::Result<CommandOutput> {
        Ok(self.output.lock().unwrap().take().unwrap())
    }
}

#[test]
fn shell_step_records_successful_command_output() {
    let dir = tempfile::tempdir().unwrap();
    let (job, manifest, memory_bank) = context_pieces(dir.path());
    let scratch = RefCell::new(Map::new());
    let ctx = StepContext::new(&job, &manifest, &memory_bank, &scratch);

    let runner = FakeCommandRunner {
        output: Mutex::new(Some(CommandOutput {
            status_code: 0,
            stdout: "ok".to_string(),
            stderr: String::new(),
        })),
    };
    let step = ShellStep {
        step_id: "sh".to_string(),
        command: "echo ok".to_string(),
        outputs: vec!["shell.json".to_string()],
        runner: Box::new(runner),
    };
    step.run(&ctx).unwrap();
    assert!(step.validate(&ctx).unwrap());
}

#[test]
fn shell_step_run_errors_on_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let (job, manifest, memory_bank) = context_pieces(dir.path());
    let scratch = RefCell::new(Map::new());
    let ctx = StepContext::new(&job, &manifest, &memory_bank, &scratch);

    let runner = FakeCommandRunner {
        output: Mutex::new(Some(CommandOutput {
            status_code: 1,
            stdout: String::new(),
            stderr: "boom".to_string(),
        })),
    };
    let step = ShellStep {
        step_id: "sh".to_string(),
        command: "false".to_string(),
        outputs: vec!["shell.json".to_string()],
        runner: Box::new(runner),
    };
    assert!(step.run(&ctx).is_err());
}
