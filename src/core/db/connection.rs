/// Connection Management Module
///
/// Opening, closing and scoped use of a `Db`, the wrapper that owns exactly
/// one SQLite session.

use crate::config::DatabaseConfig;
use crate::core::{DbError, Result};
use rusqlite::Connection;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Reserved data-source token for a transient, non-persistent session.
pub const MEMORY: &str = ":memory:";

/// Where a session's data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Transient in-memory database, gone when the session closes
    Memory,
    /// Database file on disk
    File(PathBuf),
}

impl DataSource {
    pub fn is_memory(&self) -> bool {
        matches!(self, DataSource::Memory)
    }
}

impl From<&str> for DataSource {
    fn from(source: &str) -> Self {
        if source == MEMORY {
            DataSource::Memory
        } else {
            DataSource::File(PathBuf::from(source))
        }
    }
}

impl From<String> for DataSource {
    fn from(source: String) -> Self {
        DataSource::from(source.as_str())
    }
}

impl From<&Path> for DataSource {
    fn from(path: &Path) -> Self {
        DataSource::File(path.to_path_buf())
    }
}

impl From<PathBuf> for DataSource {
    fn from(path: PathBuf) -> Self {
        DataSource::File(path)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Memory => f.write_str(MEMORY),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A single open SQLite session.
///
/// The session is opened by the constructor and closed when the wrapper is
/// closed, leaves a `Db::scoped` body, or is dropped. Every method that
/// releases the session takes `self` by value, so a closed `Db` cannot be
/// used again.
#[derive(Debug)]
pub struct Db {
    conn: Connection,
    source: DataSource,
    arraysize: NonZeroUsize,
}

impl Db {
    /// Opens a session on `source`, a file path or [`MEMORY`].
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if SQLite cannot open the source, e.g. a
    /// path in a directory that does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use db_connect::Db;
    ///
    /// let db = Db::open(":memory:").unwrap();
    /// assert!(db.source().is_memory());
    /// ```
    pub fn open(source: impl Into<DataSource>) -> Result<Self> {
        let source = source.into();
        let conn = match &source {
            DataSource::Memory => Connection::open_in_memory()?,
            DataSource::File(path) => Connection::open(path)?,
        };
        debug!("Opened database {}", source);

        Ok(Db {
            conn,
            source,
            arraysize: NonZeroUsize::MIN,
        })
    }

    /// Opens a session as described by a `[database]` configuration section.
    pub fn open_with(config: &DatabaseConfig) -> Result<Self> {
        let mut db = Db::open(config.path.as_str())?;
        db.arraysize = config.arraysize;

        if let Some(ms) = config.busy_timeout_ms {
            db.conn.busy_timeout(Duration::from_millis(ms))?;
        }
        if let Some(enabled) = config.foreign_keys {
            db.conn.pragma_update(None, "foreign_keys", enabled)?;
        }
        Ok(db)
    }

    /// Opens `source`, runs `body` with the session, then closes it.
    ///
    /// The session is released on every exit path: normal return, an error
    /// returned by `body`, or a panic unwinding through it. When `body`
    /// succeeds, a failure to close is returned as the error.
    pub fn scoped<T, E, F>(source: impl Into<DataSource>, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Db) -> std::result::Result<T, E>,
        E: From<DbError>,
    {
        let db = Db::open(source)?;
        db.run_scoped(body)
    }

    /// Like [`Db::scoped`], opening the session from configuration.
    pub fn scoped_with<T, E, F>(config: &DatabaseConfig, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Db) -> std::result::Result<T, E>,
        E: From<DbError>,
    {
        let db = Db::open_with(config)?;
        db.run_scoped(body)
    }

    fn run_scoped<T, E, F>(mut self, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Db) -> std::result::Result<T, E>,
        E: From<DbError>,
    {
        match body(&mut self) {
            Ok(value) => {
                self.close()?;
                Ok(value)
            }
            Err(err) => {
                debug!("Scoped body failed, closing database {}", self.source);
                drop(self);
                Err(err)
            }
        }
    }

    /// Closes the session.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if SQLite refuses to close, for instance
    /// while a statement is still being stepped elsewhere. The connection is
    /// still released when the error is dropped.
    pub fn close(self) -> Result<()> {
        let source = self.source;
        self.conn.close().map_err(|(_, err)| DbError::Database(err))?;
        debug!("Closed database {}", source);
        Ok(())
    }

    /// The data source this session was opened on.
    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Rows per fetch for batch cursors created from now on.
    pub fn arraysize(&self) -> NonZeroUsize {
        self.arraysize
    }

    pub fn set_arraysize(&mut self, arraysize: NonZeroUsize) {
        self.arraysize = arraysize;
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}
