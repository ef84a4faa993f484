// SPDX-License-Identifier: MIT

use super::*;
use std::fs;

fn config() -> ArtifactsConfig {
    ArtifactsConfig {
        manifest_file: "manifest.json".to_string(),
        include_hashes: true,
        include_tool_versions: false,
        reuse_if_validated: true,
    }
}

#[test]
fn load_missing_manifest_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::load_or_default(dir.path().join("manifest.json"), config()).unwrap();
    assert!(manifest.all().is_empty());
}

#[test]
fn add_then_save_then_reload_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    fs::write(&artifact_path, b"{}").unwrap();
    let manifest_path = dir.path().join("manifest.json");

    let mut manifest = Manifest::load_or_default(manifest_path.clone(), config()).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();

    let reloaded = Manifest::load_or_default(manifest_path, config()).unwrap();
    assert_eq!(reloaded.all().len(), 1);
    let record = reloaded.get("out").unwrap();
    assert_eq!(record.producer_step, "s1");
    assert!(!record.validated);
    assert!(record.sha256.is_some());
}

#[test]
fn mark_validated_flips_flag_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    fs::write(&artifact_path, b"{}").unwrap();
    let manifest_path = dir.path().join("manifest.json");

    let mut manifest = Manifest::load_or_default(manifest_path.clone(), config()).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();
    manifest.mark_validated("out").unwrap();

    assert!(manifest.is_validated("out"));

    let reloaded = Manifest::load_or_default(manifest_path, config()).unwrap();
    assert!(reloaded.is_validated("out"));
}

#[test]
fn mark_validated_on_absent_key_is_silent_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut manifest =
        Manifest::load_or_default(dir.path().join("manifest.json"), config()).unwrap();
    assert!(manifest.mark_validated("nope").is_ok());
    assert!(manifest.all().is_empty());
}

#[test]
fn should_reuse_false_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    fs::write(&artifact_path, b"{}").unwrap();
    let mut cfg = config();
    cfg.reuse_if_validated = false;
    let mut manifest =
        Manifest::load_or_default(dir.path().join("manifest.json"), cfg).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, true)
        .unwrap();
    manifest.mark_validated("out").unwrap();
    assert!(!manifest.should_reuse("out"));
}

#[test]
fn should_reuse_false_when_record_absent() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::load_or_default(dir.path().join("manifest.json"), config()).unwrap();
    assert!(!manifest.should_reuse("out"));
}

#[test]
fn should_reuse_false_when_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    fs::write(&artifact_path, b"{}").unwrap();
    let mut manifest =
        Manifest::load_or_default(dir.path().join("manifest.json"), config()).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();
    manifest.mark_validated("out").unwrap();

    fs::remove_file(&artifact_path).unwrap();
    assert!(!manifest.should_reuse("out"));
}

#[test]
fn should_reuse_false_when_not_validated() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    fs::write(&artifact_path, b"{}").unwrap();
    let mut manifest =
        Manifest::load_or_default(dir.path().join("manifest.json"), config()).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();
    assert!(!manifest.should_reuse("out"));
}

#[test]
fn should_reuse_true_when_validated_and_hash_matches() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    fs::write(&artifact_path, b"{}").unwrap();
    let mut manifest =
        Manifest::load_or_default(dir.path().join("manifest.json"), config()).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();
    manifest.mark_validated("out").unwrap();
    assert!(manifest.should_reuse("out"));
}

#[test]
fn should_reuse_false_on_hash_divergence() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    fs::write(&artifact_path, b"{}").unwrap();
    let mut manifest =
        Manifest::load_or_default(dir.path().join("manifest.json"), config()).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();
    manifest.mark_validated("out").unwrap();

    fs::write(&artifact_path, b"{\"changed\":true}").unwrap();
    assert!(!manifest.should_reuse("out"));
}

#[test]
fn include_hashes_false_reuses_even_on_stale_file() {
    // Documents configured behavior (spec.md boundary case): with hashing
    // off, a changed file is still reused if validated.
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    fs::write(&artifact_path, b"{}").unwrap();
    let mut cfg = config();
    cfg.include_hashes = false;
    let mut manifest =
        Manifest::load_or_default(dir.path().join("manifest.json"), cfg).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();
    manifest.mark_validated("out").unwrap();

    fs::write(&artifact_path, b"{\"changed\":true}").unwrap();
    assert!(manifest.should_reuse("out"));
}

#[test]
fn add_replaces_existing_record_and_resets_validated() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("out.json");
    fs::write(&artifact_path, b"{}").unwrap();
    let mut manifest =
        Manifest::load_or_default(dir.path().join("manifest.json"), config()).unwrap();
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();
    manifest.mark_validated("out").unwrap();
    assert!(manifest.is_validated("out"));

    // A new attempt re-registers the same key as unvalidated.
    manifest
        .add("out", &artifact_path, "s1", vec![], None, false)
        .unwrap();
    assert!(!manifest.is_validated("out"));
}
