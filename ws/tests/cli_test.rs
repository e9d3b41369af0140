//! CLI tests for the `ws` binary

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Write a config pointing storage into `dir`, returning its path
fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.yml");
    let storage_dir = dir.join("state");
    std::fs::write(&path, format!("storage_dir: {}\nlog_level: warn\n", storage_dir.display()))
        .expect("Failed to write config");
    path
}

fn ws(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ws").expect("binary built");
    cmd.env("NO_COLOR", "1").arg("--config").arg(config);
    cmd
}

#[test]
fn test_open_describes_store() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp_dir.path());

    ws(&config)
        .args(["open", "--position", "#popup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Window store ready"))
        .stdout(predicate::str::contains("remotedev"))
        .stdout(predicate::str::contains("instance_selector"));
}

#[test]
fn test_open_dev_prints_action_log() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp_dir.path());

    ws(&config)
        .args(["open", "--position", "#left", "--dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ConnectRequest"))
        .stdout(predicate::str::contains("instance_selector").not());
}

#[test]
fn test_set_connection_persists_across_runs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp_dir.path());

    ws(&config)
        .args(["set-connection", "disabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Connection set to disabled"));

    ws(&config)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"disabled\""))
        .stdout(predicate::str::contains("\"socket\"").not());

    ws(&config)
        .args(["open", "--dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Connection: disabled"))
        .stdout(predicate::str::contains("ConnectRequest").not());
}

#[test]
fn test_purge_removes_state() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp_dir.path());

    ws(&config).args(["set-connection", "custom"]).assert().success();
    ws(&config)
        .arg("purge")
        .assert()
        .success()
        .stdout(predicate::str::contains("Purged persist:redux-devtools"));
    ws(&config)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No persisted state"));
}

#[test]
fn test_show_without_state() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp_dir.path());

    ws(&config)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No persisted state"));
}

#[test]
fn test_rejects_unknown_connection_type() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp_dir.path());

    ws(&config)
        .args(["set-connection", "websocket"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("websocket"));
}
