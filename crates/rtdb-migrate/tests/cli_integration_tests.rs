//! CLI integration tests for `rtdb-migrate` using `assert_cmd`.

#![allow(clippy::pedantic)]

use assert_cmd::prelude::*;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the CLI binary command with a clean environment
#[allow(deprecated)]
fn migrate_cmd() -> Command {
    let mut cmd = Command::cargo_bin("rtdb-migrate").unwrap();
    cmd.env_remove("FIREBASE_ACCESS_TOKEN")
        .env_remove("RTDB_MIGRATE_SNAPSHOT");
    cmd
}

const SNAPSHOT: &str = r#"{
    "users": [{"email": "a@x.com"}, {"name": "no email"}],
    "posts": [{"id": "p1", "title": "hi"}],
    "requests": [],
    "chat": [{"id": "c1", "text": "hey"}]
}"#;

fn write_config(dir: &Path, url: &str) -> std::path::PathBuf {
    let config = dir.join("migration.yaml");
    fs::write(
        &config,
        format!(
            "snapshot: db.json\nidentity:\n  url: {url}\n  project_id: demo\nstore:\n  database_url: {url}\noptions:\n  show_progress: false\n"
        ),
    )
    .unwrap();
    config
}

// =============================================================================
// Help & Init
// =============================================================================

#[test]
fn test_help_displays_usage() {
    migrate_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_no_arguments_fails() {
    migrate_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: rtdb-migrate"));
}

#[test]
fn test_init_then_validate() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("migration.yaml");

    migrate_cmd()
        .arg("init")
        .arg("--output")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated configuration"));

    migrate_cmd()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("your-project-id"));
}

#[test]
fn test_validate_rejects_bad_url() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "ftp://example.com");

    migrate_cmd()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URL scheme"));
}

// =============================================================================
// Inspect
// =============================================================================

#[test]
fn test_inspect_prints_counts() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot = temp_dir.path().join("db.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();

    migrate_cmd()
        .arg("inspect")
        .arg("--snapshot")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("Users:         2"))
        .stdout(predicate::str::contains("Requests:      0"))
        .stdout(predicate::str::contains("Chat messages: 1"));
}

#[test]
fn test_inspect_missing_snapshot_fails() {
    let temp_dir = TempDir::new().unwrap();

    migrate_cmd()
        .arg("inspect")
        .arg("--snapshot")
        .arg(temp_dir.path().join("db.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load snapshot"));
}

// =============================================================================
// Run
// =============================================================================

#[test]
fn test_run_missing_snapshot_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "http://127.0.0.1:9");

    migrate_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load snapshot"));
}

#[test]
fn test_run_malformed_snapshot_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "http://127.0.0.1:9");
    fs::write(temp_dir.path().join("db.json"), "{ not json").unwrap();

    migrate_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1);
}

#[test]
fn test_run_dry_run_touches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    // Port 9 (discard) is never contacted in a dry run.
    let config = write_config(temp_dir.path(), "http://127.0.0.1:9");
    fs::write(temp_dir.path().join("db.json"), SNAPSHOT).unwrap();

    migrate_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry Run Complete"))
        .stdout(predicate::str::contains("users:    1 migrated, 1 skipped, 0 failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_against_mock_firebase() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/demo/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"localId": "uid-a"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/demo/accounts:sendOobCode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"oobLink": "https://reset"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), &server.uri());
    fs::write(temp_dir.path().join("db.json"), SNAPSHOT).unwrap();

    let output = tokio::task::spawn_blocking(move || {
        migrate_cmd()
            .arg("run")
            .arg("--config")
            .arg(&config)
            .env("FIREBASE_ACCESS_TOKEN", "tok")
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("Migration Complete"))
        .stdout(predicate::str::contains("posts:    1 migrated"))
        .stdout(predicate::str::contains("https://reset").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_record_failures_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), &server.uri());
    fs::write(
        temp_dir.path().join("db.json"),
        r#"{"posts": [{"id": "p1"}]}"#,
    )
    .unwrap();

    let lenient = config.clone();
    let output = tokio::task::spawn_blocking(move || {
        migrate_cmd()
            .arg("run")
            .arg("--config")
            .arg(&lenient)
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    output
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed records"))
        .stdout(predicate::str::contains("posts p1"));

    let strict = tokio::task::spawn_blocking(move || {
        migrate_cmd()
            .arg("run")
            .arg("--config")
            .arg(&config)
            .arg("--fail-on-record-errors")
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    strict.assert().code(2);
}
