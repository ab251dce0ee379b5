//! # myqb
//!
//! A fluent MySQL query builder with pluggable execution.
//!
//! ## Features
//!
//! - **Chainable sessions**: `table(..)` starts a session, clause methods fill it, a terminal call runs it
//! - **Fixed clause order**: the rendered SQL does not depend on the order methods were called in
//! - **Escaped literals**: every value is escaped into the statement; `*_raw` methods take trusted templates
//! - **Isolated sub-queries**: grouped conditions, `EXISTS` and compound joins are built by closures on fresh sessions
//! - **Return modes**: all rows, first row, or insert metadata, optionally projected to one field
//! - **Query hooks**: observe, rewrite or veto each statement; `TracingSqlHook` logs through `tracing`
//!
//! ## Query Builder
//!
//! ```ignore
//! use myqb::prelude::*;
//! use serde_json::json;
//!
//! let mut db = QueryBuilder::new(QbOptions::mysql(ConnectionConfig::from_url(url)))?
//!     .with_hook(std::sync::Arc::new(TracingSqlHook::new()));
//!
//! // SELECT
//! let users = db
//!     .table("users")
//!     .where_eq("status", "active")
//!     .where_in("role", ["admin", "staff"])
//!     .order_by_desc(&["created_at"])
//!     .limit(10)
//!     .get()
//!     .await?;
//!
//! // INSERT
//! let id = db
//!     .table("users")
//!     .insert_get_id(json!({"name": "alice"}).as_object().unwrap())
//!     .await?;
//!
//! // UPDATE
//! db.table("users")
//!     .where_eq("id", 1)
//!     .update(json!({"status": "inactive"}).as_object().unwrap())
//!     .await?;
//!
//! // DELETE
//! db.table("users").where_eq("id", 1).delete().await?;
//! ```
//!
//! Rendering works without a connection:
//!
//! ```
//! use myqb::QueryBuilder;
//!
//! let mut qb = QueryBuilder::offline();
//! qb.table("users").where_eq("id", 1).where_null("deleted_at");
//! assert_eq!(qb.to_sql(), "SELECT * FROM users WHERE `id` = 1 AND `deleted_at` IS NULL");
//! ```

pub mod assemble;
pub mod condition;
pub mod config;
pub mod error;
pub mod escape;
pub mod exec;
pub mod fragment;
pub mod monitor;
pub mod prelude;
pub mod qb;
pub mod row;

#[cfg(feature = "mysql")]
pub mod pool;

pub use condition::{CompareOp, Condition, Conjunction, DatePart};
pub use config::{ConnectMethod, ConnectionConfig, DbKind, Defaults, QbOptions};
pub use error::{QbError, QbResult};
pub use escape::{escape, escape_all, escape_id, format};
pub use exec::{Executor, QueryOutcome, ReturnMode};
pub use fragment::Fragments;
pub use monitor::{HookAction, QueryContext, QueryHook, QueryResult, QueryType, TracingSqlHook};
pub use qb::{JoinKind, QueryBuilder};
pub use row::{Row, RowExt, from_row};

#[cfg(feature = "mysql")]
pub use exec::MysqlExecutor;
#[cfg(feature = "mysql")]
pub use pool::{create_pool, create_pool_with_config};
