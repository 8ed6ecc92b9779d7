//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify its JSON output. Each invocation reloads the timer from storage.

use std::path::Path;
use std::process::Command;

use serde_json::{json, Value};
use studyroom_core::storage::Database;
use studyroom_core::timer::TIMER_STATE_KEY;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_studyroom"))
        .args(args)
        .env("STUDYROOM_DATA_DIR", dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command failed {args:?}: {stderr}");
    stdout
}

fn status(dir: &Path) -> Value {
    serde_json::from_str(&run_ok(dir, &["timer", "status"])).expect("status is JSON")
}

/// Persist a 25-minute Work phase that started `minutes_ago` and is still
/// marked running, as if no view was open when it ran out.
fn seed_running_work(dir: &Path, minutes_ago: i64) {
    let started = chrono::Utc::now().timestamp_millis() - minutes_ago * 60_000;
    let record = json!({
        "sessionKind": "work",
        "isRunning": true,
        "cycleCount": 0,
        "plannedDurationMinutes": 25,
        "startedAtEpochMillis": started,
        "accumulatedSeconds": 0,
    });
    let db = Database::open_at(&dir.join("studyroom.db")).unwrap();
    db.kv_set(TIMER_STATE_KEY, &record.to_string()).unwrap();
}

#[test]
fn test_fresh_status() {
    let dir = TempDir::new().unwrap();
    let snap = status(dir.path());
    assert_eq!(snap["type"], "StateSnapshot");
    assert_eq!(snap["session_kind"], "work");
    assert_eq!(snap["is_running"], false);
    assert_eq!(snap["remaining_secs"], 1500);
    assert_eq!(snap["widget_visible"], false);
}

#[test]
fn test_plain_status() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["timer", "status", "--plain"]);
    assert_eq!(out.trim(), "Focus 25:00 (paused)");
}

#[test]
fn test_start_survives_between_invocations() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["timer", "start"]);
    assert!(out.contains("TimerStarted"));

    let snap = status(dir.path());
    assert_eq!(snap["is_running"], true);
    assert_eq!(snap["widget_visible"], true);
    assert!(snap["remaining_secs"].as_u64().unwrap() <= 1500);
}

#[test]
fn test_pause_twice_is_harmless() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["timer", "start"]);
    let out = run_ok(dir.path(), &["timer", "pause"]);
    assert!(out.contains("TimerPaused"));

    let (stdout, stderr, code) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("ignored"));
    assert!(stdout.contains("StateSnapshot"));
    assert_eq!(status(dir.path())["is_running"], false);
}

#[test]
fn test_duration_locked_while_running() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["timer", "start"]);
    run_ok(dir.path(), &["timer", "duration", "50"]);
    assert_eq!(status(dir.path())["planned_duration_min"], 25);

    run_ok(dir.path(), &["timer", "reset"]);
    run_ok(dir.path(), &["timer", "duration", "50"]);
    let snap = status(dir.path());
    assert_eq!(snap["planned_duration_min"], 50);
    assert_eq!(snap["remaining_secs"], 3000);
}

#[test]
fn test_complete_logs_session_and_starts_break() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["timer", "start"]);
    let out = run_ok(
        dir.path(),
        &["timer", "complete", "--subject", "Physics", "--topic", "Vectors"],
    );
    assert!(out.contains("BreakStarted"));

    let snap = status(dir.path());
    assert_eq!(snap["session_kind"], "shortBreak");
    assert_eq!(snap["is_running"], true);
    assert_eq!(snap["cycle_count"], 1);

    let sessions: Value = serde_json::from_str(&run_ok(dir.path(), &["sessions", "list"])).unwrap();
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["subject"], "Physics");
    assert_eq!(sessions[0]["productive"], true);

    let stats: Value = serde_json::from_str(&run_ok(dir.path(), &["stats", "all"])).unwrap();
    assert_eq!(stats["total_sessions"], 1);
}

#[test]
fn test_subject_requires_topic() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["timer", "complete", "--subject", "Physics"]);
    assert_ne!(code, 0);
}

#[test]
fn test_skip_break_returns_to_idle_work() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["timer", "skip"]);
    assert_eq!(status(dir.path())["session_kind"], "shortBreak");

    run_ok(dir.path(), &["timer", "skip"]);
    let snap = status(dir.path());
    assert_eq!(snap["session_kind"], "work");
    assert_eq!(snap["is_running"], false);
    assert_eq!(snap["widget_visible"], false);
}

#[test]
fn test_config_set_updates_idle_timer() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "pomodoro.work"]).trim(), "25");
    run_ok(dir.path(), &["config", "set", "pomodoro.work", "30"]);
    assert_eq!(status(dir.path())["remaining_secs"], 1800);
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "pomodoro.nap", "5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_stats_today_reports_goal() {
    let dir = TempDir::new().unwrap();
    let today: Value = serde_json::from_str(&run_ok(dir.path(), &["stats", "today"])).unwrap();
    assert_eq!(today["progress"]["goal_min"], 360);
    assert_eq!(today["stats"]["today_sessions"], 0);
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["completions", "bash"]);
    assert!(out.contains("studyroom"));
}

#[test]
fn test_status_after_unobserved_completion_is_one_document() {
    let dir = TempDir::new().unwrap();
    seed_running_work(dir.path(), 30);

    let (stdout, stderr, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("PhaseCompleted"));
    let snap: Value = serde_json::from_str(&stdout).expect("status is JSON");
    assert_eq!(snap["session_kind"], "work");
    assert_eq!(snap["is_running"], true);
    assert_eq!(snap["remaining_secs"], 0);
}

#[test]
fn test_complete_long_after_zero_logs_planned_length() {
    let dir = TempDir::new().unwrap();
    seed_running_work(dir.path(), 85);

    let out = run_ok(
        dir.path(),
        &["timer", "complete", "--subject", "Physics", "--topic", "Optics"],
    );
    let event: Value = serde_json::from_str(&out).expect("complete prints one JSON document");
    assert_eq!(event["type"], "BreakStarted");

    let sessions: Value = serde_json::from_str(&run_ok(dir.path(), &["sessions", "list"])).unwrap();
    let logged = &sessions.as_array().unwrap()[0];
    assert_eq!(logged["duration_min"], 25);

    let started = chrono::DateTime::parse_from_rfc3339(logged["started_at"].as_str().unwrap()).unwrap();
    let completed = chrono::DateTime::parse_from_rfc3339(logged["completed_at"].as_str().unwrap()).unwrap();
    assert_eq!((completed - started).num_minutes(), 25);
}

#[test]
fn test_watch_idle_timer_returns_snapshot() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["timer", "watch"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("not running"));
    let snap: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snap["is_running"], false);
}

#[test]
fn test_watch_stops_on_finished_work_phase() {
    let dir = TempDir::new().unwrap();
    seed_running_work(dir.path(), 30);

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "watch"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Focus 00:00"));
    assert!(stdout.contains("PhaseCompleted"));
    assert!(stdout.contains("studyroom timer complete"));
    assert_eq!(status(dir.path())["is_running"], true);
}
