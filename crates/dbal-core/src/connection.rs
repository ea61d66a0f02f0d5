//! Database connection contract.
//!
//! The engine never talks to a driver directly. It hands a batch of SQL
//! statements to a [`DatabaseConnection`] and reads back one result set per
//! statement, each row addressed by the column aliases used in the statement.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DbalError, Result};

/// A single cell of a result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    UInt(u64),
    Text(String),
}

impl Value {
    /// Returns whether the cell is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A result row whose cells are addressed by column alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    values: IndexMap<String, Value>,
}

impl ResultRow {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cell.
    #[must_use]
    pub fn with(mut self, alias: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(alias, value);
        self
    }

    /// Sets a cell.
    pub fn insert(&mut self, alias: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(alias.into(), value.into());
    }

    /// Returns the aliases in column order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Gets a cell by alias.
    pub fn get(&self, alias: &str) -> Result<&Value> {
        self.values
            .get(alias)
            .ok_or_else(|| DbalError::UnknownColumnAlias(alias.to_string()))
    }

    /// Gets a non-NULL text cell.
    pub fn get_str(&self, alias: &str) -> Result<&str> {
        self.get_opt_str(alias)?
            .ok_or_else(|| unexpected(alias, "a non-null string"))
    }

    /// Gets a text cell that may be NULL.
    pub fn get_opt_str(&self, alias: &str) -> Result<Option<&str>> {
        match self.get(alias)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s)),
            _ => Err(unexpected(alias, "a string")),
        }
    }

    /// Gets an unsigned integer cell that may be NULL.
    ///
    /// Text cells holding digits are accepted, since some drivers report
    /// catalog numbers as strings.
    pub fn get_opt_u64(&self, alias: &str) -> Result<Option<u64>> {
        match self.get(alias)? {
            Value::Null => Ok(None),
            Value::UInt(n) => Ok(Some(*n)),
            Value::Int(n) => u64::try_from(*n)
                .map(Some)
                .map_err(|_| unexpected(alias, "an unsigned integer")),
            Value::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| unexpected(alias, "an unsigned integer")),
        }
    }

    /// Gets a non-NULL unsigned integer cell.
    pub fn get_u64(&self, alias: &str) -> Result<u64> {
        self.get_opt_u64(alias)?
            .ok_or_else(|| unexpected(alias, "a non-null unsigned integer"))
    }
}

fn unexpected(alias: &str, expected: &'static str) -> DbalError {
    DbalError::UnexpectedValue {
        alias: alias.to_string(),
        expected,
    }
}

/// A connection able to run an ordered batch of statements.
pub trait DatabaseConnection {
    /// Executes the statements in order and returns one result set per
    /// statement. Statements that return no rows yield an empty set.
    fn execute_multiple_queries(&self, queries: &[&str]) -> Result<Vec<Vec<ResultRow>>>;
}

impl<C: DatabaseConnection + ?Sized> DatabaseConnection for &C {
    fn execute_multiple_queries(&self, queries: &[&str]) -> Result<Vec<Vec<ResultRow>>> {
        (**self).execute_multiple_queries(queries)
    }
}

impl<C: DatabaseConnection + ?Sized> DatabaseConnection for Box<C> {
    fn execute_multiple_queries(&self, queries: &[&str]) -> Result<Vec<Vec<ResultRow>>> {
        (**self).execute_multiple_queries(queries)
    }
}

impl<C: DatabaseConnection + ?Sized> DatabaseConnection for std::sync::Arc<C> {
    fn execute_multiple_queries(&self, queries: &[&str]) -> Result<Vec<Vec<ResultRow>>> {
        (**self).execute_multiple_queries(queries)
    }
}
