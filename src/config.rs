/// Configuration Module
///
/// Loads the TOML file that says how to open a `Db`: the data source, the
/// default batch size for cursors, and optional connection settings.

use crate::core::db::connection::{DataSource, MEMORY};
use crate::core::{DbError, Result};
use serde::Deserialize;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// How to open a `Db`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:`
    pub path: String,
    /// Rows per batch for batched reads
    pub arraysize: NonZeroUsize,
    pub busy_timeout_ms: Option<u64>,
    /// `PRAGMA foreign_keys`; left at the engine default when unset
    pub foreign_keys: Option<bool>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: MEMORY.to_string(),
            arraysize: NonZeroUsize::MIN,
            busy_timeout_ms: None,
            foreign_keys: None,
        }
    }
}

impl DatabaseConfig {
    pub fn source(&self) -> DataSource {
        DataSource::from(self.path.as_str())
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| DbError::Config(e.to_string()))
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// use db_connect::config::load_config;
///
/// let config = load_config("db-connect.toml").expect("Failed to load config");
/// println!("{:?}", config.database);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
