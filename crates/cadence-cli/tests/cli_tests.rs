//! Integration tests for the `cadence` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise each subcommand
//! through the actual binary, including stdin/stdout piping, file I/O and
//! error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const NOW: &str = "2026-03-16T08:00:00Z";

/// Helper: path to the events.json fixture.
fn events_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/events.json")
}

fn check_time_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/check_time.json")
}

fn bad_options_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/bad_options.json")
}

fn new_york_options_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/new_york_options.json")
}

/// Helper: run `cadence` with `args` against the events fixture and parse stdout.
fn run_json(args: &[&str]) -> Value {
    let output = Command::cargo_bin("cadence")
        .unwrap()
        .args(args)
        .args(["-i", events_path(), "--now", NOW])
        .output()
        .expect("cadence must run");
    assert!(
        output.status.success(),
        "cadence {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout must be JSON")
}

fn ids(value: &Value, field: &str) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v[field]["id"].as_str().unwrap().to_string())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Busy / free
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn busy_merges_overlapping_meetings() {
    let busy = run_json(&[
        "busy",
        "--start",
        "2026-03-16T00:00:00Z",
        "--end",
        "2026-03-17T00:00:00Z",
    ]);

    let busy = busy.as_array().unwrap();
    assert_eq!(busy.len(), 2, "standup+design+vendor merge, focus stands alone");
    assert_eq!(busy[0]["start"], "2026-03-16T09:00:00Z");
    assert_eq!(busy[0]["end"], "2026-03-16T10:45:00Z");
    assert_eq!(busy[1]["start"], "2026-03-16T13:00:00Z");
}

#[test]
fn busy_defaults_to_current_week() {
    let busy = run_json(&["busy"]);

    // The March 2 and 9 one-on-ones fall before the week of March 16.
    assert_eq!(busy.as_array().unwrap().len(), 2);
}

#[test]
fn free_respects_minimum_length() {
    let free = run_json(&[
        "free",
        "--start",
        "2026-03-16T09:00:00Z",
        "--end",
        "2026-03-16T17:00:00Z",
        "--min-minutes",
        "120",
    ]);

    let free = free.as_array().unwrap();
    assert_eq!(free.len(), 2);
    assert_eq!(free[0]["start"], "2026-03-16T10:45:00Z");
    assert_eq!(free[1]["start"], "2026-03-16T15:00:00Z");
}

#[test]
fn window_requires_both_bounds() {
    Command::cargo_bin("cadence")
        .unwrap()
        .args(["busy", "-i", events_path(), "--start", "2026-03-16T00:00:00Z"])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Gaps / conflicts
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn gaps_flag_back_to_back_meetings() {
    let gaps = run_json(&["gaps"]);

    let statuses: Vec<&str> = gaps
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["status"].as_str().unwrap())
        .collect();
    assert_eq!(
        statuses,
        vec!["normal", "normal", "back-to-back", "normal", "normal"]
    );
}

#[test]
fn conflicts_report_overlap_minutes() {
    let conflicts = run_json(&["conflicts"]);

    assert_eq!(ids(&conflicts, "first"), vec!["design"]);
    assert_eq!(ids(&conflicts, "second"), vec!["vendor"]);
    assert_eq!(conflicts[0]["overlapMinutes"], 30);
}

// ─────────────────────────────────────────────────────────────────────────────
// Slots
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn slots_from_flags() {
    let search = run_json(&[
        "slots",
        "--date",
        "2026-03-16",
        "--duration",
        "60",
        "--working-hours",
    ]);

    let starts: Vec<&str> = search["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["start"].as_str().unwrap())
        .collect();
    assert_eq!(
        starts,
        vec![
            "2026-03-16T10:45:00Z",
            "2026-03-16T11:45:00Z",
            "2026-03-16T15:00:00Z",
            "2026-03-16T16:00:00Z",
        ]
    );
}

#[test]
fn max_slots_flag_caps_results() {
    let search = run_json(&[
        "slots",
        "--date",
        "2026-03-16",
        "--duration",
        "15",
        "--working-hours",
        "--max-slots",
        "3",
    ]);

    assert_eq!(search["slots"].as_array().unwrap().len(), 3);
    assert_eq!(search["capped"], true);
}

#[test]
fn unknown_timezone_falls_back_to_configured_default() {
    let search = run_json(&[
        "slots",
        "--date",
        "2026-03-16",
        "--duration",
        "60",
        "--working-hours",
        "--options",
        new_york_options_path(),
        "--timezone",
        "Atlantis",
    ]);

    // 09:00-17:00 New York (EDT) is 13:00-21:00Z; focus time holds 13:00-15:00Z.
    assert_eq!(search["timezones"][0], "America/New_York");
    assert_eq!(search["slots"][0]["start"], "2026-03-16T15:00:00Z");
    assert_eq!(search["slots"].as_array().unwrap().len(), 6);
}

#[test]
fn slots_reject_unknown_date_range() {
    Command::cargo_bin("cadence")
        .unwrap()
        .args(["slots", "-i", events_path(), "--date-range", "someday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown date range"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Series / relationships / health
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn series_groups_linked_instances() {
    let series = run_json(&["series"]);

    let series = series.as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["key"], "uid:alice-1on1@google.com");
    assert_eq!(series[0]["cadence"], "Weekly");
    assert_eq!(series[0]["instances"].as_array().unwrap().len(), 2);
}

#[test]
fn series_summary_view() {
    let summary = run_json(&["series", "--view", "summary"]);

    assert_eq!(summary["seriesCount"], 1);
    assert_eq!(summary["byCadence"]["Weekly"], 1);
}

#[test]
fn relationships_report_weekly_one_on_one() {
    let snapshots = run_json(&["relationships"]);

    let alice = snapshots
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["email"] == "alice@acme.com")
        .expect("alice must be tracked");
    assert_eq!(alice["status"], "healthy");
    assert_eq!(alice["meetingCount"], 2);
    assert_eq!(alice["name"], "Alice");
}

#[test]
fn health_counts_conflicts_and_back_to_back() {
    let health = run_json(&[
        "health",
        "--start",
        "2026-03-16T00:00:00Z",
        "--end",
        "2026-03-23T00:00:00Z",
    ]);

    assert_eq!(health["backToBackCount"], 1);
    assert_eq!(health["conflictCount"], 1);
    assert_eq!(health["meetingCount"], 3);
    assert_eq!(health["score"], 85);
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluate
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn evaluate_check_time_lists_conflicts() {
    let outcome = run_json(&["evaluate", "--request", check_time_path()]);

    assert_eq!(outcome["kind"], "conflicts");
    let conflict_ids: Vec<&str> = outcome["conflicts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(conflict_ids, vec!["design", "vendor"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Input handling and errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn reads_bare_array_from_stdin() {
    let input = r#"[
        {"id": "a", "start": {"dateTime": "2026-03-16T09:00:00Z"}, "end": {"dateTime": "2026-03-16T10:00:00Z"}},
        {"id": "b", "start": {"dateTime": "2026-03-16T09:30:00Z"}, "end": {"dateTime": "2026-03-16T11:00:00Z"}}
    ]"#;

    Command::cargo_bin("cadence")
        .unwrap()
        .args(["busy", "--start", "2026-03-16T00:00:00Z", "--end", "2026-03-17T00:00:00Z"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-03-16T11:00:00Z"));
}

#[test]
fn output_file_is_written() {
    let output_path = std::env::temp_dir().join("cadence-test-conflicts.json");
    let _ = std::fs::remove_file(&output_path);

    Command::cargo_bin("cadence")
        .unwrap()
        .args(["conflicts", "-i", events_path(), "-o"])
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = std::fs::read_to_string(&output_path).expect("output file must exist");
    let value: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);

    let _ = std::fs::remove_file(&output_path);
}

#[test]
fn invalid_json_input_fails() {
    Command::cargo_bin("cadence")
        .unwrap()
        .arg("gaps")
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input is not valid JSON"));
}

#[test]
fn object_without_items_fails() {
    Command::cargo_bin("cadence")
        .unwrap()
        .arg("gaps")
        .write_stdin(r#"{"events": []}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("items"));
}

#[test]
fn missing_input_file_fails() {
    Command::cargo_bin("cadence")
        .unwrap()
        .args(["gaps", "-i", "/nonexistent/events.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn invalid_options_file_fails() {
    Command::cargo_bin("cadence")
        .unwrap()
        .args(["gaps", "-i", events_path(), "--options", bad_options_path()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid options file"));
}
