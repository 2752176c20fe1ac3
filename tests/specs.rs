//! Workspace-level CLI specs for the capstan binary.
//!
//! These run the real binary but never reach the Docker daemon: every case
//! fails (or prints help) before the engine connection is attempted.

use assert_cmd::Command;

fn capstan() -> Command {
    Command::cargo_bin("capstan").expect("capstan binary builds")
}

#[test]
fn help_shows_usage() {
    let output = capstan().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("--config"));
}

#[test]
fn version_shows_version() {
    let output = capstan().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("0.1"));
}

#[test]
fn missing_config_exits_with_failure() {
    let output = capstan()
        .args(["--config", "/nonexistent/capstan.toml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/nonexistent/capstan.toml"));
}

#[test]
fn invalid_config_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capstan.toml");
    std::fs::write(&path, "not = [valid").unwrap();

    let output = capstan().args(["--config"]).arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn empty_config_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capstan.toml");
    std::fs::write(&path, "settle_delay_secs = 10\n").unwrap();

    let output = capstan().args(["--config"]).arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no tasks"));
}
