//! The fluent query builder.
//!
//! A [`QueryBuilder`] owns one query session: a [`Fragments`] store that
//! clause methods write into and terminal methods assemble and execute.
//! Clause methods take `&mut self` and return `&mut Self`, so calls chain;
//! terminal methods are `async` and run the assembled statement through the
//! attached [`Executor`].
//!
//! # Usage
//!
//! ```ignore
//! use myqb::prelude::*;
//!
//! let mut db = QueryBuilder::new(QbOptions::mysql(ConnectionConfig::from_url(url)).pool())?;
//!
//! // SELECT * FROM users WHERE `status` = 'active' AND `age` > 18 ORDER BY `id` DESC LIMIT 1
//! let user = db
//!     .table("users")
//!     .where_eq("status", "active")
//!     .where_op("age", CompareOp::Gt, 18)
//!     .latest(&["id"])
//!     .first()
//!     .await?;
//!
//! // Grouped predicates come from an isolated sub-session.
//! let rows = db
//!     .table("users")
//!     .where_eq("role", "admin")
//!     .or_where_group(|q| q.where_eq("role", "staff").where_not_null("verified_at"))
//!     .get()
//!     .await?;
//! ```

mod exec;
mod filter;
mod join;
mod select;

#[cfg(test)]
mod tests;

pub use join::JoinKind;

use crate::assemble::assemble;
use crate::config::{DbKind, Defaults, QbOptions};
use crate::error::QbResult;
use crate::exec::Executor;
use crate::fragment::Fragments;
use crate::monitor::QueryHook;
use std::fmt;
use std::sync::Arc;

/// Chainable query builder bound to one session at a time.
#[derive(Clone)]
pub struct QueryBuilder {
    kind: DbKind,
    executor: Option<Arc<dyn Executor>>,
    hooks: Vec<Arc<dyn QueryHook>>,
    defaults: Defaults,
    fragments: Fragments,
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("kind", &self.kind)
            .field("attached", &self.executor.is_some())
            .field("hooks", &self.hooks.len())
            .field("defaults", &self.defaults)
            .field("fragments", &self.fragments)
            .finish()
    }
}

impl QueryBuilder {
    /// Build from options.
    ///
    /// Fails with [`QbError::Config`](crate::QbError::Config) for an unknown
    /// database kind or bad connection settings, before any connection is
    /// attempted. With `prevent = true` no executor is created and terminal
    /// calls fail with [`QbError::Detached`](crate::QbError::Detached) until
    /// one is attached. Pool mode must be set up inside a Tokio runtime.
    pub fn new(options: QbOptions) -> QbResult<Self> {
        let kind = options.db_kind()?;
        let executor = if options.prevent {
            None
        } else {
            Some(connect(&options)?)
        };
        Ok(Self {
            kind,
            executor,
            hooks: Vec::new(),
            defaults: options.defaults,
            fragments: Fragments::default(),
        })
    }

    /// A builder that never connects. Useful for rendering SQL only.
    pub fn offline() -> Self {
        Self {
            kind: DbKind::Mysql,
            executor: None,
            hooks: Vec::new(),
            defaults: Defaults::default(),
            fragments: Fragments::default(),
        }
    }

    /// Attach (or replace) the executor.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Add a statement hook. Hooks run in the order they were added.
    pub fn with_hook(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Replace the construction-time defaults.
    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Whether terminal calls have an executor to run on.
    pub fn is_attached(&self) -> bool {
        self.executor.is_some()
    }

    /// A fresh linked builder: same executor, hooks and defaults, empty session.
    pub fn create(&self) -> QueryBuilder {
        QueryBuilder {
            kind: self.kind,
            executor: self.executor.clone(),
            hooks: self.hooks.clone(),
            defaults: self.defaults.clone(),
            fragments: Fragments::default(),
        }
    }

    /// Start a new session on `table`, discarding every fragment of the old one.
    pub fn table(&mut self, table: &str) -> &mut Self {
        self.fragments = Fragments::for_table(table);
        self
    }

    /// The statement the current session renders to.
    pub fn to_sql(&self) -> String {
        assemble(&self.fragments)
    }

    /// Read-only view of the session's fragments.
    pub fn fragments(&self) -> &Fragments {
        &self.fragments
    }

    /// Run `build` on an isolated, detached session and hand it back.
    ///
    /// The closure returns the builder it was given, usually as the tail of
    /// a chain: `|q| q.where_eq("a", 1).or_where_eq("b", 2)`.
    fn sub_session<F>(&self, build: F) -> QueryBuilder
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        let mut sub = QueryBuilder {
            kind: self.kind,
            executor: None,
            hooks: Vec::new(),
            defaults: self.defaults.clone(),
            fragments: Fragments::default(),
        };
        build(&mut sub);
        sub
    }
}

#[cfg(feature = "mysql")]
fn connect(options: &QbOptions) -> QbResult<Arc<dyn Executor>> {
    let executor = crate::exec::MysqlExecutor::from_options(options)?;
    tracing::debug!(
        target: "myqb.exec",
        method = ?executor.method(),
        "executor created"
    );
    Ok(Arc::new(executor))
}

#[cfg(not(feature = "mysql"))]
fn connect(_options: &QbOptions) -> QbResult<Arc<dyn Executor>> {
    Err(crate::error::QbError::config(
        "built without the `mysql` feature; attach an executor with `with_executor`",
    ))
}
