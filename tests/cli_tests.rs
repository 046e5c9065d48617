use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn digester_cmd() -> Command {
    Command::cargo_bin("digester").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    digester_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("prune"));
}

#[test]
fn test_run_help_shows_dry_run_flag() {
    digester_cmd()
        .arg("run")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_run_help_shows_force_flag() {
    digester_cmd()
        .arg("run")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn test_prune_help_shows_days_default() {
    digester_cmd()
        .arg("prune")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--days"))
        .stdout(predicate::str::contains("90"));
}

#[test]
fn test_status_on_fresh_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    digester_cmd()
        .arg("status")
        .env("DIGESTER_DB_PATH", db_path.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Articles sent:   0"))
        .stdout(predicate::str::contains("never"));
}

#[test]
fn test_prune_on_fresh_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    digester_cmd()
        .arg("prune")
        .env("DIGESTER_DB_PATH", db_path.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to prune"));
}

#[test]
fn test_run_refuses_without_sources() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let missing_sources = temp_dir.path().join("sources.json");

    digester_cmd()
        .arg("run")
        .env("DIGESTER_DB_PATH", db_path.to_str().unwrap())
        .env("DIGESTER_SOURCES", missing_sources.to_str().unwrap())
        .assert()
        .failure()
        .stdout(predicate::str::contains("no feed sources configured"));
}
