//! Common test utilities for CLI testing.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use chrono::Utc;
use serde_json::Value;
use tempfile::{tempdir, TempDir};

/// Environment the binary reads that must not leak in from the test runner.
const SCRUBBED_VARS: &[&str] = &[
    "HOOKSCOPE_ENABLED",
    "HOOKSCOPE_API_URL",
    "HOOKSCOPE_API_KEY",
    "HOOKSCOPE_WEBHOOK_URL",
    "HOOKSCOPE_LOG_LEVEL",
    "HOOKSCOPE_LOG_FORMAT",
    "HOOKSCOPE_LOG_FILE",
    "RUST_LOG",
];

/// A temporary telemetry directory and a binary pointed at it.
pub struct TestContext {
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Write `config.json`.
    pub fn with_config(self, config: &str) -> Self {
        std::fs::write(self.config_path(), config).expect("Failed to write config");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.json")
    }

    pub fn today_partition(&self) -> PathBuf {
        self.path()
            .join(format!("events-{}.jsonl", Utc::now().format("%Y-%m-%d")))
    }

    /// Parsed lines of today's partition.
    pub fn events(&self) -> Vec<Value> {
        std::fs::read_to_string(self.today_partition())
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).expect("partition line is JSON"))
            .collect()
    }

    pub fn sessions(&self) -> Value {
        let raw = std::fs::read_to_string(self.path().join("sessions.json")).expect("sessions.json");
        serde_json::from_str(&raw).expect("sessions.json is JSON")
    }

    /// Create a command configured for this context
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("hookscope").expect("Binary not found");
        for var in SCRUBBED_VARS {
            cmd.env_remove(var);
        }
        cmd.current_dir(self.path())
            .env("HOOKSCOPE_DIR", self.path())
            .env("NO_COLOR", "1");
        cmd
    }

    /// Run `hookscope hook <kind>` with `input` on stdin.
    pub fn hook(&self, kind: &str, input: Value) -> Output {
        self.command()
            .args(["hook", kind])
            .write_stdin(input.to_string())
            .output()
            .expect("Failed to run hook")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert helpers for CLI output
pub trait OutputAssertions {
    fn assert_success(&self);
    fn assert_stdout_contains(&self, text: &str);
    fn assert_exit_code(&self, code: i32);
    fn stdout_json(&self) -> Value;
}

impl OutputAssertions for Output {
    fn assert_success(&self) {
        assert!(
            self.status.success(),
            "Command failed with status: {}\nstderr: {}",
            self.status,
            String::from_utf8_lossy(&self.stderr)
        );
    }

    fn assert_stdout_contains(&self, text: &str) {
        let stdout = String::from_utf8_lossy(&self.stdout);
        assert!(
            stdout.contains(text),
            "stdout did not contain '{text}'\nstdout: {stdout}"
        );
    }

    fn assert_exit_code(&self, code: i32) {
        assert_eq!(
            self.status.code(),
            Some(code),
            "Expected exit code {code}, got {:?}\nstderr: {}",
            self.status.code(),
            String::from_utf8_lossy(&self.stderr)
        );
    }

    fn stdout_json(&self) -> Value {
        serde_json::from_slice(&self.stdout).expect("Failed to parse JSON output")
    }
}
