//! CLI smoke tests

use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_settings(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("app_settings.yaml");
    let yaml = format!(
        "engagement_settings:\n  name: smoke\n  endpoint: totals\n  inbox: {}\n  outbox: {}\nengagement_types:\n  favorites: true\nengagement_groupings:\n  by_tweet_type:\n    - tweet.id\n    - engagement.type\n",
        dir.join("inbox").display(),
        dir.join("outbox").display()
    );
    fs::write(&path, yaml).unwrap();
    path
}

fn collector() -> Command {
    let mut cmd = Command::cargo_bin("engagement-collector").unwrap();
    cmd.env("RUST_LOG", "engagement_collector=warn");
    cmd
}

#[test]
fn test_run_with_empty_inbox_succeeds() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("inbox")).unwrap();
    let settings = write_settings(dir.path());

    collector()
        .arg("--config")
        .arg(&settings)
        .arg("--account")
        .arg(dir.path().join("missing_accounts.yaml"))
        .arg("run")
        .assert()
        .success();

    assert!(!dir.path().join("outbox/smoke_results.csv").exists());
}

#[test]
fn test_run_with_missing_settings_fails() {
    let dir = TempDir::new().unwrap();

    collector()
        .arg("--config")
        .arg(dir.path().join("nope.yaml"))
        .arg("run")
        .assert()
        .failure();
}

#[test]
fn test_run_rejects_unknown_endpoint() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(dir.path());

    collector()
        .arg("--config")
        .arg(&settings)
        .args(["run", "--point", "hourly"])
        .assert()
        .failure();
}

#[test]
fn test_reformat_writes_csv_files() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("metrics.json");
    fs::write(
        &input,
        r#"{"timeseries_daily":{"42":{"impressions":{"2016-01-01":"10","2016-01-02":"3"}}}}"#,
    )
    .unwrap();
    let output = dir.path().join("series");

    collector()
        .arg("reformat")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let csv = fs::read_to_string(output.join("42_daily_timeseries.csv")).unwrap();
    assert_eq!(csv, "date,impressions\n2016-01-01,10\n2016-01-02,3\n");
}

#[test]
fn test_help_lists_subcommands() {
    let output = collector().arg("--help").output().unwrap();
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(text.contains("run"));
    assert!(text.contains("reformat"));
}

#[test]
fn test_missing_account_leaves_inbox_untouched() {
    let dir = TempDir::new().unwrap();
    let inbox = dir.path().join("inbox");
    fs::create_dir_all(&inbox).unwrap();
    fs::write(inbox.join("ids.csv"), "tweet_id\n1\n2\n").unwrap();
    let settings = write_settings(dir.path());

    collector()
        .arg("--config")
        .arg(&settings)
        .arg("--account")
        .arg(dir.path().join("missing_accounts.yaml"))
        .arg("run")
        .assert()
        .failure();

    assert!(inbox.join("ids.csv").is_file());
    assert!(!inbox.join("processed/ids.csv").exists());
}
