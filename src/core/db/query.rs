/// Query Execution Module
///
/// Read operations on a `Db`. Single-shot reads prepare their own statement,
/// step it and return materialized rows. Batched reads go through a
/// [`BatchCursor`], which keeps one statement alive and pages through it
/// `arraysize` rows at a time.
///
/// Read errors are never swallowed; they reach the caller as `DbError`.

use crate::core::db::connection::Db;
use crate::core::db::params::{bind_named, NamedParams};
use crate::core::db::row::{Record, RowShape, Value};
use crate::core::Result;
use rusqlite::{Connection, Rows, Statement};
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

fn column_names(stmt: &Statement<'_>) -> Arc<[String]> {
    stmt.column_names().into_iter().map(String::from).collect()
}

impl Db {
    /// Executes `sql` and returns every row in tuple form.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if the query cannot be prepared or fails
    /// while stepping, and `DbError::Parameter` if a placeholder has no value.
    pub fn fetch_all(&self, sql: &str, params: &NamedParams) -> Result<Vec<Vec<Value>>> {
        self.query_rows(sql, params, None)
    }

    /// Executes `sql` and returns every row as a `Record`.
    pub fn fetch_all_as_map(&self, sql: &str, params: &NamedParams) -> Result<Vec<Record>> {
        self.query_rows(sql, params, None)
    }

    /// Returns the first row in tuple form, or an empty tuple when the query
    /// yields no rows.
    pub fn fetch_one(&self, sql: &str, params: &NamedParams) -> Result<Vec<Value>> {
        Ok(self.query_rows(sql, params, Some(1))?.pop().unwrap_or_default())
    }

    /// Returns the first row as a `Record`, or an empty record when the query
    /// yields no rows.
    pub fn fetch_one_as_map(&self, sql: &str, params: &NamedParams) -> Result<Record> {
        Ok(self.query_rows(sql, params, Some(1))?.pop().unwrap_or_default())
    }

    /// Creates the batch cursor used for paged reads.
    ///
    /// The cursor starts with this session's current `arraysize`.
    pub fn batch_cursor(&self) -> BatchCursor<'_> {
        BatchCursor {
            conn: self.connection(),
            arraysize: self.arraysize(),
            stmt: None,
        }
    }

    fn query_rows<R: RowShape>(
        &self,
        sql: &str,
        params: &NamedParams,
        limit: Option<usize>,
    ) -> Result<Vec<R>> {
        let mut stmt = self.connection().prepare(sql)?;
        bind_named(&mut stmt, params)?;
        let columns = column_names(&stmt);

        let mut out = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            out.push(R::from_row(&columns, row)?);
            if limit.is_some_and(|n| out.len() >= n) {
                break;
            }
        }
        Ok(out)
    }
}

/// The long-lived cursor behind batched reads.
///
/// Each `fetch_many*` call replaces the cursor's statement and restarts from
/// the first row. The returned [`Batches`] borrows the cursor mutably, so a
/// second batched read on the same cursor cannot start while one is still in
/// progress. Single-shot reads on the `Db` are unaffected; they never touch
/// this statement.
pub struct BatchCursor<'conn> {
    conn: &'conn Connection,
    arraysize: NonZeroUsize,
    stmt: Option<Statement<'conn>>,
}

impl<'conn> BatchCursor<'conn> {
    /// Rows fetched per batch.
    pub fn arraysize(&self) -> NonZeroUsize {
        self.arraysize
    }

    pub fn set_arraysize(&mut self, arraysize: NonZeroUsize) {
        self.arraysize = arraysize;
    }

    /// Executes `sql` and returns a lazy sequence of tuple-form batches.
    ///
    /// # Errors
    ///
    /// Preparation and binding errors are returned here; errors hit while
    /// stepping are yielded by the iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use db_connect::{Db, NamedParams};
    ///
    /// let db = Db::open(":memory:").unwrap();
    /// let mut cursor = db.batch_cursor();
    /// let batches: Vec<_> = cursor
    ///     .fetch_many("SELECT 1 UNION ALL SELECT 2", &NamedParams::new())
    ///     .unwrap()
    ///     .collect::<Result<_, _>>()
    ///     .unwrap();
    /// assert_eq!(batches.len(), 2);
    /// ```
    pub fn fetch_many(&mut self, sql: &str, params: &NamedParams) -> Result<Batches<'_, Vec<Value>>> {
        self.start(sql, params)
    }

    /// Executes `sql` and returns a lazy sequence of `Record` batches.
    pub fn fetch_many_as_map(&mut self, sql: &str, params: &NamedParams) -> Result<Batches<'_, Record>> {
        self.start(sql, params)
    }

    fn start<R: RowShape>(&mut self, sql: &str, params: &NamedParams) -> Result<Batches<'_, R>> {
        let prepared = self.conn.prepare(sql)?;
        let size = self.arraysize.get();
        let stmt = self.stmt.insert(prepared);
        bind_named(stmt, params)?;
        let columns = column_names(stmt);

        Ok(Batches {
            rows: stmt.raw_query(),
            columns,
            size,
            done: false,
            shape: PhantomData,
        })
    }
}

impl fmt::Debug for BatchCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchCursor")
            .field("arraysize", &self.arraysize)
            .field("active", &self.stmt.is_some())
            .finish()
    }
}

/// Lazy, single-pass sequence of row batches from a [`BatchCursor`].
///
/// Every `next()` performs one bounded fetch of up to `arraysize` rows. The
/// sequence ends the first time a fetch finds no rows, so an empty batch is
/// never yielded. A stepping error is yielded once, after which the sequence
/// ends.
pub struct Batches<'c, R> {
    rows: Rows<'c>,
    columns: Arc<[String]>,
    size: usize,
    done: bool,
    shape: PhantomData<R>,
}

impl<R> Batches<'_, R> {
    /// Column names of the result set.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl<R: RowShape> Iterator for Batches<'_, R> {
    type Item = Result<Vec<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            let row = match self.rows.next() {
                Ok(Some(row)) => R::from_row(&self.columns, row),
                Ok(None) => {
                    self.done = true;
                    break;
                }
                Err(err) => Err(err),
            };
            match row {
                Ok(row) => batch.push(row),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err.into()));
                }
            }
        }

        if batch.is_empty() {
            debug!("No results returned, end of batches");
            None
        } else {
            Some(Ok(batch))
        }
    }
}

impl<R: RowShape> FusedIterator for Batches<'_, R> {}

impl<R> fmt::Debug for Batches<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batches")
            .field("columns", &self.columns)
            .field("size", &self.size)
            .field("done", &self.done)
            .finish()
    }
}
