/// Write Module
///
/// Statements that change the database. Each write commits on success and
/// rolls back on any error. The error itself is logged and the caller only
/// sees `WriteOutcome::Failed`, which keeps a failed write distinguishable
/// from one that affected zero rows.

use crate::core::db::connection::Db;
use crate::core::db::params::{bind_named, NamedParams};
use crate::core::{DbError, Result};
use rusqlite::{Connection, Statement};
use tracing::{debug, warn};

/// Result of a write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WriteOutcome {
    /// Committed; number of rows inserted, updated or deleted. Statements
    /// that change no rows (schema changes, pragmas) report zero.
    Affected(usize),
    /// Rolled back; the reason was logged, not returned
    Failed,
}

impl WriteOutcome {
    /// Row count of a committed write, `None` if it failed
    pub fn rows_affected(self) -> Option<usize> {
        match self {
            WriteOutcome::Affected(n) => Some(n),
            WriteOutcome::Failed => None,
        }
    }

    pub fn is_failed(self) -> bool {
        self == WriteOutcome::Failed
    }
}

impl Db {
    /// Executes one statement with named parameters and commits it.
    ///
    /// Statements that return rows are treated as failures.
    pub fn execute(&self, sql: &str, params: &NamedParams) -> WriteOutcome {
        self.commit_or_rollback("execute", |conn| {
            let mut stmt = conn.prepare(sql)?;
            bind_named(&mut stmt, params)?;
            execute_counted(conn, &mut stmt)
        })
    }

    /// Executes one statement once per parameter set, all in one transaction.
    ///
    /// Returns the total number of affected rows. If any execution fails none
    /// of them are kept.
    pub fn execute_many<'p, I>(&self, sql: &str, param_sets: I) -> WriteOutcome
    where
        I: IntoIterator<Item = &'p NamedParams>,
    {
        self.commit_or_rollback("execute_many", |conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut total = 0;
            for params in param_sets {
                bind_named(&mut stmt, params)?;
                total += execute_counted(conn, &mut stmt)?;
            }
            Ok(total)
        })
    }

    /// Runs a multi-statement script and commits it.
    ///
    /// A transaction left open by an earlier write is committed first. The
    /// script's statements then run in order and any transaction the script
    /// began is committed at the end. On failure any transaction still open
    /// is rolled back; statements that already auto-committed are kept.
    /// Nothing is returned.
    pub fn execute_script(&self, script: &str) {
        let conn = self.connection();
        let result = commit_pending(conn)
            .and_then(|()| Ok(conn.execute_batch(script)?))
            .and_then(|()| commit_pending(conn));
        match result {
            Ok(()) => debug!("execute_script committed"),
            Err(err) => {
                warn!("execute_script failed, rolling back: {}", err);
                rollback_pending(conn);
            }
        }
    }

    fn commit_or_rollback<F>(&self, operation: &str, work: F) -> WriteOutcome
    where
        F: FnOnce(&Connection) -> Result<usize>,
    {
        let conn = self.connection();
        let result = conn
            .unchecked_transaction()
            .map_err(DbError::from)
            .and_then(|tx| {
                let affected = work(&*tx)?;
                tx.commit()?;
                Ok(affected)
            });

        match result {
            Ok(affected) => {
                debug!("{} committed, {} row(s) affected", operation, affected);
                WriteOutcome::Affected(affected)
            }
            Err(err) => {
                warn!("{} failed, rolling back: {}", operation, err);
                rollback_pending(conn);
                WriteOutcome::Failed
            }
        }
    }
}

/// Runs a bound statement and returns the rows it changed.
///
/// `sqlite3_changes` is only updated by INSERT, UPDATE and DELETE, so any
/// other statement would report the count of the previous write. The
/// connection's running total tells the two apart.
fn execute_counted(conn: &Connection, stmt: &mut Statement<'_>) -> Result<usize> {
    let before = total_changes(conn)?;
    let changed = stmt.raw_execute()?;
    if total_changes(conn)? == before {
        Ok(0)
    } else {
        Ok(changed)
    }
}

fn total_changes(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT total_changes()", [], |row| row.get(0))?)
}

fn commit_pending(conn: &Connection) -> Result<()> {
    if !conn.is_autocommit() {
        conn.execute_batch("COMMIT")?;
    }
    Ok(())
}

fn rollback_pending(conn: &Connection) {
    if conn.is_autocommit() {
        return;
    }
    if let Err(err) = conn.execute_batch("ROLLBACK") {
        warn!("Rollback failed: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(db: &Db) {
        db.execute_script("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT UNIQUE NOT NULL);");
    }

    fn count(db: &Db) -> usize {
        db.fetch_all("SELECT * FROM users", &NamedParams::new())
            .unwrap()
            .len()
    }

    #[test]
    fn test_execute_insert_commits() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        let outcome = db.execute(
            "INSERT INTO users (name) VALUES (:name)",
            &NamedParams::new().with("name", "alice"),
        );
        assert_eq!(outcome, WriteOutcome::Affected(1));
        assert_eq!(outcome.rows_affected(), Some(1));
        assert!(db.connection().is_autocommit());
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_execute_zero_rows_is_not_failure() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        let outcome = db.execute("DELETE FROM users WHERE id = :id", &NamedParams::new().with("id", 1));
        assert_eq!(outcome, WriteOutcome::Affected(0));
        assert!(!outcome.is_failed());
    }

    #[test]
    fn test_execute_malformed_statement() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        let outcome = db.execute("INSERT INTO nowhere VALUES (", &NamedParams::new());
        assert!(outcome.is_failed());
        assert_eq!(outcome.rows_affected(), None);
        assert!(db.connection().is_autocommit());
    }

    #[test]
    fn test_execute_missing_parameter_fails() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        let outcome = db.execute("INSERT INTO users (name) VALUES (:name)", &NamedParams::new());
        assert_eq!(outcome, WriteOutcome::Failed);
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_execute_select_is_failure() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);
        assert!(db.execute("SELECT 1", &NamedParams::new()).is_failed());
    }

    #[test]
    fn test_execute_many_is_atomic() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        let sets: Vec<NamedParams> = ["a", "b", "a"]
            .iter()
            .map(|name| NamedParams::new().with("name", *name))
            .collect();
        let outcome = db.execute_many("INSERT INTO users (name) VALUES (:name)", &sets);
        assert_eq!(outcome, WriteOutcome::Failed);
        assert_eq!(count(&db), 0);

        let outcome = db.execute_many("INSERT INTO users (name) VALUES (:name)", &sets[..2]);
        assert_eq!(outcome, WriteOutcome::Affected(2));
        assert_eq!(count(&db), 2);
    }

    #[test]
    fn test_execute_many_empty_input() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        let sets: Vec<NamedParams> = Vec::new();
        let outcome = db.execute_many("INSERT INTO users (name) VALUES (:name)", &sets);
        assert_eq!(outcome, WriteOutcome::Affected(0));
    }

    #[test]
    fn test_script_failure_rolls_back_open_transaction() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        db.execute_script(
            "BEGIN; INSERT INTO users (name) VALUES ('x'); INSERT INTO users (name) VALUES ('x');",
        );
        assert!(db.connection().is_autocommit());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_script_keeps_autocommitted_statements() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        db.execute_script("INSERT INTO users (name) VALUES ('kept'); THIS IS NOT SQL;");
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_script_commits_transaction_it_began() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.db");

        let db = Db::open(path.as_path()).unwrap();
        setup(&db);
        db.execute_script("BEGIN; INSERT INTO users (name) VALUES ('first');");
        assert!(db.connection().is_autocommit());
        db.close().unwrap();

        let db = Db::open(path.as_path()).unwrap();
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_execute_after_script_starts_own_transaction() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        db.execute_script("BEGIN; INSERT INTO users (name) VALUES ('first');");
        let outcome = db.execute(
            "INSERT INTO users (name) VALUES (:name)",
            &NamedParams::new().with("name", "second"),
        );
        assert_eq!(outcome, WriteOutcome::Affected(1));
        assert!(db.connection().is_autocommit());
        assert_eq!(count(&db), 2);
    }

    #[test]
    fn test_schema_change_after_insert_reports_zero_rows() {
        let db = Db::open(":memory:").unwrap();
        setup(&db);

        let sets: Vec<NamedParams> = ["a", "b", "c"]
            .iter()
            .map(|name| NamedParams::new().with("name", *name))
            .collect();
        assert_eq!(
            db.execute_many("INSERT INTO users (name) VALUES (:name)", &sets),
            WriteOutcome::Affected(3)
        );
        assert_eq!(
            db.execute("INSERT INTO users (name) VALUES (:name)", &NamedParams::new().with("name", "d")),
            WriteOutcome::Affected(1)
        );

        assert_eq!(db.execute("CREATE TABLE u (a)", &NamedParams::new()), WriteOutcome::Affected(0));
        assert_eq!(
            db.execute_many("CREATE INDEX IF NOT EXISTS u_a ON u (a)", [&NamedParams::new(), &NamedParams::new()]),
            WriteOutcome::Affected(0)
        );
        assert_eq!(
            db.execute("UPDATE users SET name = name || '!'", &NamedParams::new()),
            WriteOutcome::Affected(4)
        );
    }
}
