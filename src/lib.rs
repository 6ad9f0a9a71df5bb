//! A small, synchronous convenience wrapper around one SQLite connection.
//!
//! ```
//! use db_connect::{Db, NamedParams, Value};
//!
//! let rows = Db::scoped(":memory:", |db| {
//!     db.execute_script("CREATE TABLE t (id INTEGER);");
//!     let sets: Vec<_> = (1..=3).map(|id| NamedParams::new().with("id", id)).collect();
//!     assert_eq!(db.execute_many("INSERT INTO t (id) VALUES (:id)", &sets).rows_affected(), Some(3));
//!     db.fetch_all("SELECT id FROM t ORDER BY id", &NamedParams::new())
//! })
//! .unwrap();
//! assert_eq!(rows, vec![vec![Value::Integer(1)], vec![Value::Integer(2)], vec![Value::Integer(3)]]);
//! ```

// Core infrastructure modules
pub mod core;

// Configuration
pub mod config;

pub use crate::core::db::{
    BatchCursor, Batches, DataSource, Db, NamedParams, Record, RowShape, Value, WriteOutcome, MEMORY,
};
pub use crate::core::{DbError, Result};
