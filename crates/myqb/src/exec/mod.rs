//! Execution adapters and return-mode reshaping.
//!
//! The builder hands an assembled statement to an [`Executor`] and gets a
//! [`QueryOutcome`] back. [`ReturnMode::reshape`] then turns the outcome
//! into what the terminal call promised: every row, the first row, or the
//! insert metadata, optionally projected to one field.

#[cfg(feature = "mysql")]
mod mysql;


#[cfg(feature = "mysql")]
pub use mysql::MysqlExecutor;

use crate::error::QbResult;
use crate::row::Row;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Field name of the generated id in insert metadata.
pub const INSERT_ID: &str = "insertId";
/// Field name of the changed-row count in insert metadata.
pub const AFFECTED_ROWS: &str = "affectedRows";

/// Runs one statement and reports what the server returned.
///
/// Implementations own connection handling: a connection is obtained for
/// the call and released (or closed) before the call returns, whether the
/// statement succeeded or not.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn query(&self, sql: &str) -> QbResult<QueryOutcome>;
}

/// Raw result of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub rows: Vec<Row>,
    pub affected_rows: u64,
    pub last_insert_id: Option<u64>,
}

impl QueryOutcome {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn affected(affected_rows: u64, last_insert_id: Option<u64>) -> Self {
        Self {
            rows: Vec::new(),
            affected_rows,
            last_insert_id,
        }
    }

    /// `{"insertId": .., "affectedRows": ..}`
    pub fn metadata(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert(INSERT_ID.to_string(), self.last_insert_id.into());
        meta.insert(AFFECTED_ROWS.to_string(), self.affected_rows.into());
        meta
    }
}

/// How a raw outcome is reshaped before it reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnMode {
    /// Every row.
    #[default]
    Default,
    /// The first row only.
    Single,
    /// The driver's insert metadata.
    Insert,
}

impl ReturnMode {
    /// Reshape `outcome`; `projection` narrows the result to one field.
    ///
    /// - `Default`: array of row objects, or of the projected column's values.
    /// - `Single`: first row object (or `null`), or the projected field of it.
    /// - `Insert`: the metadata object, or the projected metadata field.
    ///
    /// A projected field that is absent yields `null`.
    pub fn reshape(self, outcome: QueryOutcome, projection: Option<&str>) -> Value {
        match self {
            ReturnMode::Default => Value::Array(
                outcome
                    .rows
                    .into_iter()
                    .map(|row| project(row, projection))
                    .collect(),
            ),
            ReturnMode::Single => outcome
                .rows
                .into_iter()
                .next()
                .map_or(Value::Null, |row| project(row, projection)),
            ReturnMode::Insert => project(outcome.metadata(), projection),
        }
    }
}

fn project(mut row: Row, projection: Option<&str>) -> Value {
    match projection {
        Some(field) => row.remove(field).unwrap_or(Value::Null),
        None => Value::Object(row),
    }
}
