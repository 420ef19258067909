//! End-to-end tests for one-shot CLI actions that need no network

use assert_cmd::Command;
use tempfile::TempDir;
use youtube_subscription_transfer::resume::ProgressLedger;
use youtube_subscription_transfer::snapshot::SnapshotStore;
use youtube_subscription_transfer::SubscriptionRecord;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("youtube-subscription-transfer").unwrap();
    cmd.arg("--data-dir").arg(dir.path()).env("RUST_LOG", "off");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {output:?}");
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_help_lists_actions() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(cli(&dir).arg("--help"));

    for action in ["extract", "import", "resume", "view", "clear-progress"] {
        assert!(out.contains(action), "missing {action} in help");
    }
    assert!(out.contains("--max-retries"));
}

#[test]
fn test_negative_wait_rejected() {
    let dir = TempDir::new().unwrap();
    cli(&dir).args(["view", "--wait=-1"]).assert().failure();
}

#[test]
fn test_unrepresentable_wait_rejected() {
    let dir = TempDir::new().unwrap();
    let output = cli(&dir).args(["view", "--wait", "1e20"]).output().unwrap();

    // A usage error, not a panic
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("too large"));
}

#[test]
fn test_max_retries_out_of_range_rejected() {
    let dir = TempDir::new().unwrap();
    cli(&dir).args(["view", "--max-retries", "25"]).assert().failure();
}

#[test]
fn test_view_without_snapshot() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(cli(&dir).arg("view"));

    assert!(out.contains("No subscription data found"));
}

#[test]
fn test_view_shows_snapshot_and_progress() {
    let dir = TempDir::new().unwrap();
    let items: Vec<_> = (0..4)
        .map(|i| SubscriptionRecord::new(format!("UC{i}"), format!("Channel {i}")))
        .collect();
    SnapshotStore::new(dir.path().join("subscriptions_backup.json"))
        .save(&items)
        .unwrap();
    ProgressLedger::new(dir.path().join("transfer_progress.json"))
        .try_save(0, "UC0", 4)
        .unwrap();

    let out = stdout_of(cli(&dir).arg("view"));

    assert!(out.contains("Total subscriptions: 4"));
    assert!(out.contains("Progress: 1/4 processed, 3 remaining"));
    assert!(out.contains("1. Channel 0"));
}

#[test]
fn test_clear_progress_removes_ledger() {
    let dir = TempDir::new().unwrap();
    let ledger = ProgressLedger::new(dir.path().join("transfer_progress.json"));
    ledger.try_save(2, "UC2", 5).unwrap();

    let out = stdout_of(cli(&dir).arg("clear-progress"));

    assert!(out.contains("Progress cleared"));
    assert!(!ledger.exists());
}

#[test]
fn test_resume_without_progress_is_noop() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(cli(&dir).arg("resume"));

    assert!(out.contains("No previous progress found"));
}

#[test]
fn test_import_without_snapshot_fails() {
    let dir = TempDir::new().unwrap();
    cli(&dir).arg("import").assert().failure().code(1);
}
