//! Statement hooks and SQL logging.
//!
//! Hooks see every statement a [`QueryBuilder`](crate::QueryBuilder) sends to
//! its executor. They can log it, rewrite it, or veto it.
//!
//! ```rust,ignore
//! use myqb::monitor::TracingSqlHook;
//! use std::sync::Arc;
//!
//! let mut db = myqb::QueryBuilder::new(opts)?.with_hook(Arc::new(TracingSqlHook::new()));
//! db.table("users").where_eq("id", 1).first().await?;
//! ```

mod tracing_hook;
mod types;


pub use tracing_hook::TracingSqlHook;
pub use types::{HookAction, QueryContext, QueryHook, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
