use crate::exec::ReturnMode;
use std::fmt;
use std::time::Duration;

/// The kind of SQL statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// `SHOW COLUMNS` / `SHOW KEYS`
    Show,
    /// DDL, TRUNCATE, and anything else
    Other,
}

impl QueryType {
    /// Detect the statement kind from its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start().trim_start_matches('(').trim_start();
        let keyword: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" => QueryType::Select,
            "INSERT" => QueryType::Insert,
            "UPDATE" => QueryType::Update,
            "DELETE" => QueryType::Delete,
            "SHOW" => QueryType::Show,
            _ => QueryType::Other,
        }
    }
}

/// Context information about the statement being executed.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// SQL as assembled by the builder.
    pub sql: String,
    /// SQL actually sent to the executor (differs when a hook rewrote it).
    pub exec_sql: String,
    pub query_type: QueryType,
    /// How the raw result will be reshaped.
    pub return_mode: ReturnMode,
    /// Target table of the session, when one is set.
    pub table: Option<String>,
}

impl QueryContext {
    pub fn new(sql: &str, return_mode: ReturnMode) -> Self {
        Self {
            sql: sql.to_string(),
            exec_sql: sql.to_string(),
            query_type: QueryType::from_sql(sql),
            return_mode,
            table: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        let table = table.into();
        self.table = (!table.is_empty()).then_some(table);
        self
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Summary of an execution handed to [`QueryHook::after_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// Statement returned rows.
    Rows(usize),
    /// Statement changed rows.
    Affected(u64),
    /// Statement failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    /// Create an error result, truncating the message.
    pub fn error(msg: String) -> Self {
        if msg.len() > MAX_ERROR_LEN {
            let truncated = super::truncate_sql_bytes(&msg, MAX_ERROR_LEN);
            Self::Error(format!("{truncated}..."))
        } else {
            Self::Error(msg)
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Action to take after a hook inspected a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Run the statement as is.
    Continue,
    /// Run this SQL instead.
    ModifySql(String),
    /// Refuse to run the statement.
    Abort(String),
}

/// Hook into statement execution.
pub trait QueryHook: Send + Sync {
    /// Called before the statement is sent to the executor.
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    /// Called once the executor finished, on success and on failure.
    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}
