/// Error Module
///
/// This module defines the error type shared by every fallible operation in
/// the crate. Reads and connection management surface these errors to the
/// caller; write operations catch them, roll back, and report only
/// `WriteOutcome::Failed`.
use thiserror::Error;

/// Error type for db-connect.
///
/// This enum covers:
/// - Driver errors from SQLite (open, prepare, step, close)
/// - Named-parameter binding problems
/// - Configuration loading and validation
/// - File system and JSON serialization failures
#[derive(Error, Debug)]
pub enum DbError {
    /// Database-related errors from SQLite operations
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A statement placeholder that could not be bound from the supplied names
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use DbError as the error type.
pub type Result<T> = std::result::Result<T, DbError>;
