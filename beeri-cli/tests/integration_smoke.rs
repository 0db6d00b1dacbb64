//! Smoke tests for command wiring. Nothing here needs a database: each
//! case fails or finishes before a connection is attempted.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `beeri` in an empty directory so no `.env` leaks in.
fn beeri(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("beeri").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DATABASE_URL")
        .env_remove("BEERI_CONFIG")
        .env_remove("JWT_SECRET")
        .env_remove("ADMIN_PASSWORD");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    beeri(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("verify-backup"))
        .stdout(predicate::str::contains("backfill-tokens"));
}

#[test]
fn test_serve_help() {
    let dir = TempDir::new().unwrap();
    beeri(&dir)
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--cors-permissive"));
}

#[test]
fn test_backup_help() {
    let dir = TempDir::new().unwrap();
    beeri(&dir)
        .args(["backup", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Output file"));
}

#[test]
fn test_backfill_help() {
    let dir = TempDir::new().unwrap();
    beeri(&dir)
        .args(["backfill-tokens", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_migrate_without_database_url_fails() {
    let dir = TempDir::new().unwrap();
    beeri(&dir)
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL"));
}

#[test]
fn test_serve_without_secrets_fails() {
    let dir = TempDir::new().unwrap();
    beeri(&dir)
        .args(["serve", "--database-url", "postgres://nobody@127.0.0.1:1/none"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("JWT_SECRET"));
}

#[test]
fn test_verify_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    beeri(&dir)
        .args(["verify-backup", "--file", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_verify_rejects_non_backup_json() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bad.json"), r#"{"events": []}"#).unwrap();
    beeri(&dir)
        .args(["verify-backup", "--file", "bad.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a beeri backup"));
}

#[test]
fn test_verify_rejects_tampered_manifest() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("tampered.json"),
        r#"{"created_at":"2026-01-01T00:00:00Z","manifest":{"events":5},"tables":{"events":[{"id":1}]}}"#,
    )
    .unwrap();
    beeri(&dir)
        .args(["verify-backup", "--file", "tampered.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("internally inconsistent"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("beeri.toml"), "[server\nbind = ").unwrap();
    beeri(&dir)
        .args(["--config", "beeri.toml", "migrate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_seed_dry_run_needs_no_database() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("events.csv"),
        "title,start,end,location,description,event_type\nערב הורים,2026-10-01 19:00,,,,\n",
    )
    .unwrap();
    beeri(&dir)
        .args(["seed", "--file", "events.csv", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 event(s) ready to import"));
}

#[test]
fn test_seed_rejects_invalid_rows() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("events.json"),
        r#"[{"title":"","start":"2026-10-01"}]"#,
    )
    .unwrap();
    beeri(&dir)
        .args(["seed", "--file", "events.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 1"))
        .stderr(predicate::str::contains("nothing written"));
}
