//! Convenient imports for typical `myqb` usage.
//!
//! ```ignore
//! use myqb::prelude::*;
//! ```

pub use crate::{
    CompareOp, Condition, ConnectMethod, ConnectionConfig, Executor, QbError, QbOptions,
    QbResult, QueryBuilder, ReturnMode, Row, RowExt, TracingSqlHook, from_row,
};

#[cfg(feature = "mysql")]
pub use crate::{MysqlExecutor, create_pool};
