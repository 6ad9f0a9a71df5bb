/// Core Module for db-connect
///
/// Holds the connection wrapper and the error type everything else builds on.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DbError, Result};
