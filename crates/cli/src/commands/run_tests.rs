// SPDX-License-Identifier: MIT

use super::*;
use std::io::Write;

fn write_task(dir: &std::path::Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("task.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(json.as_bytes()).unwrap();
    path
}

fn write_config(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let contents = format!(
        "[paths]\nwork_root = \"{root}/jobs\"\njob_root_template = \"{root}/jobs/{{job_id}}\"\nlogs_dir = \"logs\"\nartifacts_dir = \"artifacts\"\ncache_dir = \"cache\"\n\n[memory_bank]\nroot = \"{root}/memory-bank\"\n",
        root = dir.display()
    );
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn run_with_stub_task_succeeds_and_writes_summary() {
    let dir = tempfile::tempdir().unwrap();
    let task_path = write_task(
        dir.path(),
        r#"{"name": "demo", "steps": [{"id": "s1", "type": "stub", "outputs": ["out.json"]}]}"#,
    );
    let config_path = write_config(dir.path());

    let args = RunArgs {
        task: task_path,
        input: None,
        config: Some(config_path),
        job_id: Some("test-job".to_string()),
    };

    handle(args).unwrap();

    let summary_path = dir.path().join("jobs/test-job/execution_summary.json");
    assert!(summary_path.exists());
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(summary_path).unwrap()).unwrap();
    assert_eq!(summary["success"], serde_json::Value::Bool(true));
    assert_eq!(summary["steps_executed"], serde_json::json!(1));
}

#[test]
fn run_with_unknown_step_type_fails_before_executing() {
    let dir = tempfile::tempdir().unwrap();
    let task_path = write_task(
        dir.path(),
        r#"{"name": "demo", "steps": [{"id": "s1", "type": "bogus"}]}"#,
    );
    let config_path = write_config(dir.path());

    let args = RunArgs {
        task: task_path,
        input: None,
        config: Some(config_path),
        job_id: Some("test-job".to_string()),
    };

    let err = handle(args).unwrap_err();
    assert!(err.to_string().contains("unknown step type"));
}
