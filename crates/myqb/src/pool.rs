//! Connection pool utilities

use crate::config::ConnectionConfig;
use crate::error::{QbError, QbResult};
use mysql_async::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts};

/// Default upper bound on pooled connections.
pub const DEFAULT_POOL_MAX: usize = 10;

/// Create a connection pool from a [`ConnectionConfig`].
///
/// Connections are opened lazily, on first checkout.
///
/// # Example
///
/// ```ignore
/// let pool = myqb::create_pool(&ConnectionConfig::from_url("mysql://root@localhost/app"))?;
/// let executor = myqb::MysqlExecutor::from_pool(pool);
/// ```
pub fn create_pool(config: &ConnectionConfig) -> QbResult<Pool> {
    let opts = config.to_opts()?;
    build_pool(opts, config.pool_max.unwrap_or(DEFAULT_POOL_MAX))
}

/// Create a connection pool from a URL with a custom maximum size.
pub fn create_pool_with_config(database_url: &str, max_size: usize) -> QbResult<Pool> {
    let opts = Opts::from_url(database_url).map_err(|e| QbError::config(e.to_string()))?;
    build_pool(opts, max_size)
}

fn build_pool(opts: Opts, max_size: usize) -> QbResult<Pool> {
    let constraints = PoolConstraints::new(0, max_size)
        .filter(|_| max_size > 0)
        .ok_or_else(|| QbError::config(format!("invalid pool size {max_size}")))?;
    let opts: Opts = OptsBuilder::from_opts(opts)
        .pool_opts(PoolOpts::default().with_constraints(constraints))
        .into();
    Ok(Pool::new(opts))
}
