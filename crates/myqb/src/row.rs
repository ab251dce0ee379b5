//! Row representation and typed access.

use crate::error::{QbError, QbResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// One result row: column name → value, in select-list order.
pub type Row = Map<String, Value>;

/// Deserialize a whole row into `T`.
///
/// ```
/// use myqb::row::{from_row, Row};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct User { id: i64, name: String }
///
/// let row: Row = json!({"id": 1, "name": "a"}).as_object().cloned().unwrap();
/// let user: User = from_row(row)?;
/// assert_eq!((user.id, user.name.as_str()), (1, "a"));
/// # Ok::<(), myqb::QbError>(())
/// ```
pub fn from_row<T: DeserializeOwned>(row: Row) -> QbResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| QbError::decode("<row>", e.to_string()))
}

/// Typed column access on a [`Row`].
pub trait RowExt {
    /// Get a column, failing when it is missing or has the wrong shape.
    fn try_get<T: DeserializeOwned>(&self, column: &str) -> QbResult<T>;

    /// Get a column, treating a missing column or `NULL` as `None`.
    fn try_get_opt<T: DeserializeOwned>(&self, column: &str) -> QbResult<Option<T>>;
}

impl RowExt for Row {
    fn try_get<T: DeserializeOwned>(&self, column: &str) -> QbResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| QbError::decode(column, "column not found"))?;
        serde_json::from_value(value.clone()).map_err(|e| QbError::decode(column, e.to_string()))
    }

    fn try_get_opt<T: DeserializeOwned>(&self, column: &str) -> QbResult<Option<T>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| QbError::decode(column, e.to_string())),
        }
    }
}

/// Render a value as a mapping key (used by `pluck`).
pub(crate) fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read a count-like value that may arrive as a number or a numeric string.
pub(crate) fn as_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
