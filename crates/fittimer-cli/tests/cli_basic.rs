//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_fittimer"))
        .args(args)
        .env("FITTIMER_DATA_DIR", data_dir)
        .env_remove("FITTIMER_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    stdout
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_status_on_fresh_install() {
    let dir = tempfile::tempdir().unwrap();
    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["type"], "state_snapshot");
    assert_eq!(status["mode"], "chronometer");
    assert_eq!(status["current_time"], 0);
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_tabata_progress_persists_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(
        dir.path(),
        &["sequence", "add", "Squats", "--work", "20", "--rest", "10", "--sets", "2"],
    );
    run_ok(dir.path(), &["timer", "mode", "tabata"]);
    run_ok(dir.path(), &["timer", "tick", "--count", "20"]);

    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["phase"], "rest");
    assert_eq!(status["current_time"], 0);
    assert_eq!(status["sequence_total"], 1);

    let status = json(&run_ok(dir.path(), &["timer", "tick", "--count", "10"]));
    assert_eq!(status["phase"], "work");
    assert_eq!(status["set_cycle"], 1);

    let stats = json(&run_ok(dir.path(), &["stats", "show"]));
    assert_eq!(stats["total_time"], 30);
}

#[test]
fn test_countdown_completes_and_next_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["timer", "mode", "simple-countdown"]);
    run_ok(dir.path(), &["timer", "countdown", "5"]);
    let status = json(&run_ok(dir.path(), &["timer", "tick", "--count", "9"]));
    assert_eq!(status["is_completed"], true);
    assert_eq!(status["current_time"], 5);

    let status = json(&run_ok(dir.path(), &["timer", "next"]));
    assert_eq!(status["is_completed"], true);

    let status = json(&run_ok(dir.path(), &["timer", "reset"]));
    assert_eq!(status["is_completed"], false);
    assert_eq!(status["current_time"], 0);
}

#[test]
fn test_live_run_finishes_a_short_countdown() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "timer.tick_interval_ms", "10"]);
    run_ok(dir.path(), &["timer", "mode", "simple-countdown"]);
    run_ok(dir.path(), &["timer", "countdown", "3"]);

    let stdout = run_ok(dir.path(), &["timer", "start"]);
    let lines: Vec<serde_json::Value> = stdout.lines().map(json).collect();
    assert_eq!(lines.first().unwrap()["type"], "timer_started");
    assert!(lines.iter().any(|l| l["type"] == "countdown_completed"));
    assert_eq!(lines.last().unwrap()["is_completed"], true);
}

#[test]
fn test_set_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["sequence", "add", "A", "--work", "30"]);
    run_ok(dir.path(), &["sequence", "add", "B", "--sets", "4"]);
    let before = json(&run_ok(dir.path(), &["sequence", "list"]));

    let saved = json(&run_ok(dir.path(), &["set", "save", "Full body"]));
    let id = saved["id"].as_str().unwrap().to_string();

    run_ok(dir.path(), &["sequence", "clear"]);
    let loaded = json(&run_ok(dir.path(), &["set", "load", &id]));
    assert_eq!(loaded["mode"], "tabata");
    assert_eq!(loaded["sequence_total"], 2);
    assert_eq!(json(&run_ok(dir.path(), &["sequence", "list"])), before);

    let listed = json(&run_ok(dir.path(), &["set", "list"]));
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Full body");
}

#[test]
fn test_hard_reset_keeps_saved_sets() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["sequence", "add", "A"]);
    run_ok(dir.path(), &["set", "save", "Keep me"]);
    run_ok(dir.path(), &["stats", "show"]);

    run_ok(dir.path(), &["timer", "reset", "--hard"]);
    let sequences = json(&run_ok(dir.path(), &["sequence", "list"]));
    assert!(sequences.as_array().unwrap().is_empty());
    let sets = json(&run_ok(dir.path(), &["set", "list"]));
    assert_eq!(sets.as_array().unwrap().len(), 1);
}

#[test]
fn test_set_owned_by_someone_else_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["sequence", "add", "A"]);
    let saved = json(&run_ok(dir.path(), &["set", "save", "Mine", "--user", "ana"]));
    let id = saved["id"].as_str().unwrap().to_string();

    let (_, stderr, code) = run_cli(dir.path(), &["set", "delete", &id, "--user", "bob"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("permission"), "stderr: {stderr}");

    run_ok(dir.path(), &["set", "delete", &id, "--user", "ana"]);
}

#[test]
fn test_invalid_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["sequence", "add", "Bad", "--work", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"), "stderr: {stderr}");

    let (_, _, code) = run_cli(dir.path(), &["set", "save", "Empty"]);
    assert_eq!(code, 1);

    let (_, _, code) = run_cli(dir.path(), &["timer", "countdown", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_feedback_toggles_persist() {
    let dir = tempfile::tempdir().unwrap();
    let toggled = json(&run_ok(dir.path(), &["feedback", "audio"]));
    assert_eq!(toggled["audio_enabled"], false);
    let tested = json(&run_ok(dir.path(), &["feedback", "test", "completion"]));
    assert_eq!(tested["audio_enabled"], false);
    assert_eq!(tested["tones"].as_array().unwrap().len(), 3);
}

#[test]
fn test_config_set_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "catalog.user", "ana"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "catalog.user"]).trim(), "ana");
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);

    let listed = json(&run_ok(dir.path(), &["config", "list"]));
    assert_eq!(listed["catalog.user"], "ana");
    let reset = json(&run_ok(dir.path(), &["config", "reset"]));
    assert_ne!(reset["catalog.user"], "ana");
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let script = run_ok(dir.path(), &["completions", "bash"]);
    assert!(script.contains("fittimer"));
}
