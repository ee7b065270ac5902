//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated HOME so the
//! database and config never touch the developer's real data directory.

use std::path::PathBuf;
use std::process::Command;

fn test_home() -> PathBuf {
    let home = std::env::temp_dir().join(format!("hardmode-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&home).expect("failed to create test home");
    home
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "hardmode-cli", "--"])
        .args(args)
        .env("HOME", test_home())
        .output()
        .expect("failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help_lists_subcommands() {
    let (stdout, _, code) = run_cli(&["--help"]);
    assert_eq!(code, 0, "help failed");
    for cmd in ["onboard", "log", "status", "rollover", "alerts", "config"] {
        assert!(stdout.contains(cmd), "help is missing `{cmd}`");
    }
}

#[test]
fn test_onboard_start_asks_the_first_question() {
    let (stdout, _, code) = run_cli(&["onboard", "start", "smoke-onboard"]);
    assert_eq!(code, 0, "onboard start failed");
    assert!(stdout.contains("male or female"));
}

#[test]
fn test_status_for_unknown_user_fails() {
    let (_, stderr, code) = run_cli(&["status", "smoke-nobody"]);
    assert_ne!(code, 0, "status for unknown user should fail");
    assert!(stderr.contains("unknown user"));
}

#[test]
fn test_rollover_with_no_active_users() {
    let (stdout, _, code) = run_cli(&["rollover", "--at", "2026-03-15T05:10:00Z"]);
    assert_eq!(code, 0, "rollover failed");
    assert!(stdout.contains("checked"));
}

#[test]
fn test_alerts_with_no_active_users() {
    let (stdout, _, code) = run_cli(&["alerts", "--at", "2026-03-15T19:00:00Z", "--deadline"]);
    assert_eq!(code, 0, "alerts failed");
    assert!(stdout.contains("reminder(s) sent"));
    assert!(stdout.contains("deadline check"));
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    assert!(stdout.contains("rollover_hour"));
}

#[test]
fn test_config_set_and_get() {
    let (_, _, code) = run_cli(&["config", "set", "rollover_hour", "6"]);
    assert_eq!(code, 0, "config set failed");
    let (stdout, _, code) = run_cli(&["config", "get", "rollover_hour"]);
    assert_eq!(code, 0, "config get failed");
    assert!(stdout.contains('6'));
}
