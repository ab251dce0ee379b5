//! Error types for myqb

use std::time::Duration;
use thiserror::Error;

/// Result type alias for myqb operations
pub type QbResult<T> = Result<T, QbError>;

/// MySQL error code for duplicate entry on a unique key.
const ER_DUP_ENTRY: u16 = 1062;
/// MySQL error code for a parent row that is still referenced.
const ER_ROW_IS_REFERENCED: u16 = 1451;
/// MySQL error code for a missing parent row.
const ER_NO_REFERENCED_ROW: u16 = 1452;

/// Error types for building and executing queries
#[derive(Debug, Error)]
pub enum QbError {
    /// Invalid construction options (unknown database kind, bad URL, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure to connect or to acquire a pooled connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement failed inside the driver
    #[cfg(feature = "mysql")]
    #[error("Query error: {0}")]
    Query(#[from] mysql_async::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Builder state cannot produce an executable statement
    #[error("Validation error: {0}")]
    Validation(String),

    /// Terminal call on a builder that has no executor attached
    #[error("Query builder is detached: no executor attached")]
    Detached,

    /// A query hook refused to run the statement
    #[error("Query aborted by hook: {0}")]
    Aborted(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Wrap a driver error raised while opening or acquiring a connection.
    #[cfg(feature = "mysql")]
    pub fn connection(err: mysql_async::Error) -> Self {
        Self::Connection(err.to_string())
    }

    /// Parse a `mysql_async` error into a more specific QbError
    #[cfg(feature = "mysql")]
    pub fn from_driver_error(err: mysql_async::Error) -> Self {
        if let mysql_async::Error::Server(server) = &err {
            let detail = format!("{} ({})", server.message, server.state);
            match server.code {
                ER_DUP_ENTRY => return Self::UniqueViolation(detail),
                ER_ROW_IS_REFERENCED | ER_NO_REFERENCED_ROW => {
                    return Self::ForeignKeyViolation(detail);
                }
                _ => {}
            }
        }
        Self::Query(err)
    }
}
