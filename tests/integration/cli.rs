//! Integration tests for the rummo binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use super::common::fixtures::{snapshot_dir, write_notebook};

fn rummo(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rummo").unwrap();
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

#[test]
fn test_cli_prints_snapshot_path() {
    let dir = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let notebook = write_notebook(&dir, "[[cell]]\nname = \"hello\"\nrun = \"echo hi\"\n");

    rummo(&data)
        .arg(&notebook)
        .assert()
        .success()
        .stdout(predicate::str::contains("nb.json"));

    assert!(snapshot_dir(&dir).join("nb.json").exists());
    assert!(data.path().join("config.toml").exists());
}

#[test]
fn test_cli_failing_cell_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let notebook = write_notebook(&dir, "[[cell]]\nname = \"bad\"\nrun = \"exit 2\"\n");

    rummo(&data)
        .arg(&notebook)
        .arg("--failure-policy")
        .arg("isolate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cell bad exited with status 2"));
}

#[test]
fn test_cli_missing_notebook() {
    let data = TempDir::new().unwrap();

    rummo(&data)
        .arg("/nonexistent/notebook.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read notebook"));
}
