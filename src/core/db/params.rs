/// Named Parameter Module
///
/// Queries take their parameters by name. Names are stored without SQLite's
/// placeholder prefix, so `"id"`, `":id"`, `"@id"` and `"$id"` all refer to
/// the same parameter.

use crate::core::db::row::Value;
use crate::core::{DbError, Result};
use rusqlite::Statement;
use std::collections::HashMap;

const PREFIXES: [char; 3] = [':', '@', '$'];

fn normalize(name: &str) -> &str {
    name.strip_prefix(PREFIXES).unwrap_or(name)
}

/// Parameter bindings for one execution of a statement
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NamedParams {
    values: HashMap<String, Value>,
}

impl NamedParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a named value, replacing any earlier value for the same name
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(normalize(name).to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(normalize(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for NamedParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = NamedParams::new();
        for (name, value) in iter {
            params.insert(name.as_ref(), value);
        }
        params
    }
}

/// Binds every placeholder of `stmt` from `params`.
///
/// Each named placeholder must have a value. Positional `?` placeholders
/// have no name to look up and are rejected. Supplied names the statement
/// does not use are ignored.
pub(crate) fn bind_named(stmt: &mut Statement<'_>, params: &NamedParams) -> Result<()> {
    for index in 1..=stmt.parameter_count() {
        let Some(name) = stmt.parameter_name(index).map(str::to_owned) else {
            return Err(DbError::Parameter(format!(
                "positional parameter {index} cannot be bound by name"
            )));
        };
        let value = params
            .get(&name)
            .ok_or_else(|| DbError::Parameter(format!("no value supplied for parameter {name}")))?;
        stmt.raw_bind_parameter(index, value)?;
    }
    Ok(())
}
