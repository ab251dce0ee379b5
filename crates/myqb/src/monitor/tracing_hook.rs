use super::truncate_sql_bytes;
use super::types::{HookAction, QueryContext, QueryHook, QueryResult};
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based hook that emits each statement before it runs and its
/// outcome afterwards, on target `myqb.sql`.
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Statements slower than this are reported at `WARN`.
    pub slow_threshold: Option<Duration>,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            slow_threshold: None,
        }
    }
}

impl TracingSqlHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Warn about statements slower than `threshold`.
    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let sql = self.truncate_sql(&ctx.exec_sql);
        let table = ctx.table.as_deref().unwrap_or("-");
        emit_at_level!(
            self.level,
            target: "myqb.sql",
            query_type = ?ctx.query_type,
            return_mode = ?ctx.return_mode,
            table,
            sql = %sql,
        );
        HookAction::Continue
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let elapsed_ms = duration.as_secs_f64() * 1000.0;
        if let QueryResult::Error(message) = result {
            tracing::warn!(
                target: "myqb.sql",
                query_type = ?ctx.query_type,
                elapsed_ms,
                error = %message,
                "statement failed"
            );
            return;
        }
        if self.slow_threshold.is_some_and(|t| duration >= t) {
            tracing::warn!(
                target: "myqb.sql",
                query_type = ?ctx.query_type,
                elapsed_ms,
                sql = %self.truncate_sql(&ctx.exec_sql),
                "slow statement"
            );
            return;
        }
        emit_at_level!(
            self.level,
            target: "myqb.sql",
            query_type = ?ctx.query_type,
            elapsed_ms,
            result = %result,
        );
    }
}
