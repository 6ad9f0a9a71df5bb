//! Tests for the `db-connect` binary.

mod common;

use assert_cmd::Command;
use common::{temp_db_path, user_params, USERS_SCHEMA};
use db_connect::{Db, WriteOutcome};
use std::fs;

fn seed(path: &std::path::Path, users: usize) {
    let db = Db::open(path).unwrap();
    db.execute_script(USERS_SCHEMA);
    let sets = user_params(users);
    assert_eq!(
        db.execute_many("INSERT INTO users (name, age) VALUES (:name, :age)", &sets),
        WriteOutcome::Affected(users)
    );
    db.close().unwrap();
}

#[test]
fn test_lists_tables_by_default() {
    let (_dir, path) = temp_db_path("tables.db");
    seed(&path, 0);

    Command::cargo_bin("db-connect")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout("[{\"name\":\"users\"}]\n");
}

#[test]
fn test_prints_one_line_per_batch() {
    let (dir, path) = temp_db_path("batches.db");
    seed(&path, 3);

    let config = dir.path().join("db-connect.toml");
    fs::write(
        &config,
        format!("[database]\npath = {:?}\narraysize = 2\n", path.display().to_string()),
    )
    .unwrap();

    Command::cargo_bin("db-connect")
        .unwrap()
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout("[{\"name\":\"users\"}]\n");

    // an explicit database argument overrides the configured path but keeps its arraysize
    Command::cargo_bin("db-connect")
        .unwrap()
        .args(["--config", config.to_str().unwrap()])
        .arg(&path)
        .arg("SELECT id FROM users ORDER BY id")
        .assert()
        .success()
        .stdout("[{\"id\":1},{\"id\":2}]\n[{\"id\":3}]\n");
}

#[test]
fn test_query_error_exits_nonzero() {
    let (_dir, path) = temp_db_path("broken.db");
    seed(&path, 0);

    Command::cargo_bin("db-connect")
        .unwrap()
        .arg(&path)
        .arg("SELECT * FROM no_such_table")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_bad_arguments_exit_with_usage() {
    Command::cargo_bin("db-connect")
        .unwrap()
        .arg("--nope")
        .assert()
        .failure()
        .code(2);
}
