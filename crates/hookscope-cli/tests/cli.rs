//! Binary-level tests against a temporary telemetry directory.

mod common;

use chrono::{Duration, Utc};
use common::{OutputAssertions, TestContext};
use predicates::prelude::*;
use serde_json::json;

#[test]
fn hooks_record_a_session_without_touching_stdout() {
    let ctx = TestContext::new();

    for (kind, input) in [
        ("session-start", json!({"session_id": "S1", "cwd": "/proj"})),
        ("pre-tool-use", json!({"session_id": "S1", "tool_name": "Read", "tool_input": {"file_path": "a.rs"}})),
        ("post-tool-use", json!({"session_id": "S1", "tool_name": "Read", "tool_response": "ok"})),
        ("session-end", json!({"session_id": "S1"})),
    ] {
        let output = ctx.hook(kind, input);
        output.assert_success();
        assert!(output.stdout.is_empty(), "{kind} wrote to stdout");
    }

    let events = ctx.events();
    let kinds: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(kinds, ["session_start", "tool_start", "tool_end", "session_end"]);
    assert_eq!(events[1]["data"]["correlation_id"], events[2]["data"]["correlation_id"]);
    assert!(events[2]["data"]["duration_ms"].as_f64().unwrap() >= 0.0);
    assert_eq!(events[2]["data"]["result_size"], 2);

    let sessions = ctx.sessions();
    assert_eq!(sessions["S1"]["status"], "ended");
    assert_eq!(sessions["S1"]["cwd"], "/proj");
    assert!(ctx.config_path().exists(), "hooks write a default config");
}

#[test]
fn garbage_input_is_recorded_with_defaults() {
    let ctx = TestContext::new();

    let output = ctx
        .command()
        .args(["hook", "stop"])
        .write_stdin("this is not json")
        .output()
        .unwrap();
    output.assert_success();

    let events = ctx.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["session_id"], "unknown");
    assert_eq!(events[0]["data"]["reason"], "unknown");
}

#[test]
fn disabled_telemetry_writes_nothing() {
    let ctx = TestContext::new().with_config(r#"{"enabled": false}"#);

    ctx.hook("session-start", json!({"session_id": "S1"}))
        .assert_success();
    assert!(!ctx.today_partition().exists());

    // The environment wins over the file.
    ctx.command()
        .args(["hook", "pre-compact"])
        .env("HOOKSCOPE_ENABLED", "true")
        .write_stdin(r#"{"session_id": "S1"}"#)
        .assert()
        .success();
    assert_eq!(ctx.events().len(), 1);
}

#[test]
fn unknown_hook_kind_is_a_usage_error() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["hook", "tool-exploded"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tool-exploded"));
}

#[test]
fn report_on_empty_directory() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["report", "--days", "3"])
        .assert()
        .success()
        .stdout("No telemetry events found in the last 3 days.\n");
}

#[test]
fn report_summarizes_recorded_hooks() {
    let ctx = TestContext::new();
    ctx.hook("session-start", json!({"session_id": "S1", "cwd": "/proj"}));
    ctx.hook("pre-tool-use", json!({"session_id": "S1", "tool_name": "Bash"}));
    ctx.hook("post-tool-use", json!({"session_id": "S1", "tool_name": "Bash"}));
    ctx.hook("user-prompt-submit", json!({"session_id": "S1", "prompt": "fix the build"}));

    let text = ctx.command().arg("report").output().unwrap();
    text.assert_success();
    text.assert_stdout_contains("## Overview");
    text.assert_stdout_contains("- **Total prompt words:** 3");
    text.assert_stdout_contains("| Bash | 1 |");
    text.assert_stdout_contains("## Active Sessions");

    let json = ctx.command().args(["report", "--format", "json"]).output().unwrap();
    json.assert_success();
    let stats = json.stdout_json();
    assert_eq!(stats["total_events"], 4);
    assert_eq!(stats["unique_sessions"], 1);
    assert_eq!(stats["tool_counts"][0]["name"], "Bash");
}

#[test]
fn flush_without_remote_sink_is_skipped() {
    let ctx = TestContext::new();
    let output = ctx.command().args(["flush", "--format", "json"]).output().unwrap();
    output.assert_success();

    let report = output.stdout_json();
    assert_eq!(report["status"], "skipped");
    assert_eq!(report["pushed"], 0);
}

#[test]
fn cleanup_deletes_expired_partitions() {
    let ctx = TestContext::new();
    let old_day = (Utc::now() - Duration::days(40)).format("%Y-%m-%d");
    let old = ctx.path().join(format!("events-{old_day}.jsonl"));
    std::fs::write(&old, "").unwrap();
    ctx.hook("pre-compact", json!({"session_id": "S1"}));

    let output = ctx.command().args(["cleanup", "--format", "json"]).output().unwrap();
    output.assert_success();

    let report = output.stdout_json();
    assert_eq!(report["retention_days"], 30);
    assert_eq!(report["partitions_deleted"], 1);
    assert!(!old.exists());
    assert!(ctx.today_partition().exists());

    ctx.command()
        .args(["cleanup", "--retention-days", "90"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Deleted 0 expired partition(s)"));
}

#[test]
fn sessions_filter_by_status() {
    let ctx = TestContext::new();
    ctx.hook("session-start", json!({"session_id": "live", "cwd": "/a"}));
    ctx.hook("session-start", json!({"session_id": "done", "cwd": "/b"}));
    ctx.hook("session-end", json!({"session_id": "done"}));

    let output = ctx
        .command()
        .args(["sessions", "--status", "active", "--format", "json"])
        .output()
        .unwrap();
    output.assert_success();
    let rows = output.stdout_json();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["session_id"], "live");
    assert_eq!(rows[0]["cwd"], "/a");

    ctx.command()
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains("done").and(predicate::str::contains("ended")));
}

#[test]
fn config_init_show_and_path() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"));

    ctx.command()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Wrote default config"));
    assert!(ctx.config_path().exists());

    ctx.command()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Config already exists"));

    let output = ctx
        .command()
        .args(["config", "show"])
        .env("HOOKSCOPE_API_KEY", "ct_live_env")
        .output()
        .unwrap();
    output.assert_success();
    let config = output.stdout_json();
    assert_eq!(config["retention_days"], 30);
    assert_eq!(config["api_key"], "ct_live_env");
}

#[test]
fn invalid_config_fails_maintenance_commands_with_config_code() {
    let ctx = TestContext::new().with_config(r#"{"push_batch_size": 0}"#);

    ctx.command()
        .args(["config", "show"])
        .output()
        .unwrap()
        .assert_exit_code(2);

    // Hooks fall back to defaults and leave the user's file alone.
    ctx.hook("stop", json!({"session_id": "S1"})).assert_success();
    assert_eq!(ctx.events().len(), 1);
    assert_eq!(
        std::fs::read_to_string(ctx.config_path()).unwrap(),
        r#"{"push_batch_size": 0}"#
    );
}
