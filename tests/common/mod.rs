//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use db_connect::{Db, NamedParams, WriteOutcome};
use tempfile::TempDir;

pub const USERS_SCHEMA: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    age INTEGER
);
";

/// An in-memory database with an empty `users` table.
pub fn users_db() -> Db {
    let db = Db::open(":memory:").unwrap();
    db.execute_script(USERS_SCHEMA);
    db
}

/// An in-memory database with `count` users named `user0..user{count-1}`.
pub fn seeded_users_db(count: usize) -> Db {
    let db = users_db();
    let sets = user_params(count);
    assert_eq!(
        db.execute_many("INSERT INTO users (name, age) VALUES (:name, :age)", &sets),
        WriteOutcome::Affected(count)
    );
    db
}

pub fn user_params(count: usize) -> Vec<NamedParams> {
    (0..count)
        .map(|i| {
            NamedParams::new()
                .with("name", format!("user{i}"))
                .with("age", 20 + i as i64)
        })
        .collect()
}

/// A temporary directory holding `name`; the file is created on first open.
pub fn temp_db_path(name: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    (dir, path)
}
