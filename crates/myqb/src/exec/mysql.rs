//! `mysql_async`-backed executor.

use super::{Executor, QueryOutcome};
use crate::config::{ConnectMethod, ConnectionConfig, QbOptions};
use crate::error::{QbError, QbResult};
use crate::row::Row;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use mysql_async::consts::ColumnType;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, Pool, Value as MyValue};
use serde_json::{Number, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Target {
    Pool(Pool),
    Single(Opts),
}

/// Runs statements over the MySQL text protocol.
///
/// In pool mode a connection is checked out per statement and returned when
/// the statement finishes. In single mode a connection is opened per
/// statement and closed afterwards, on success and on failure.
#[derive(Debug, Clone)]
pub struct MysqlExecutor {
    target: Target,
    query_timeout: Option<Duration>,
}

impl MysqlExecutor {
    /// Build an executor for `config` using the given connection method.
    pub fn new(config: &ConnectionConfig, method: ConnectMethod) -> QbResult<Self> {
        let target = match method {
            ConnectMethod::Pool => Target::Pool(crate::pool::create_pool(config)?),
            ConnectMethod::Single => Target::Single(config.to_opts()?),
        };
        Ok(Self {
            target,
            query_timeout: None,
        })
    }

    /// Build an executor from full builder options (method and timeout included).
    pub fn from_options(options: &QbOptions) -> QbResult<Self> {
        let executor = Self::new(&options.config, options.method)?;
        Ok(match options.query_timeout() {
            Some(timeout) => executor.with_query_timeout(timeout),
            None => executor,
        })
    }

    /// Use an existing pool.
    pub fn from_pool(pool: Pool) -> Self {
        Self {
            target: Target::Pool(pool),
            query_timeout: None,
        }
    }

    /// Fail statements that take longer than `timeout`.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> ConnectMethod {
        match self.target {
            Target::Pool(_) => ConnectMethod::Pool,
            Target::Single(_) => ConnectMethod::Single,
        }
    }

    /// Close pooled connections. A no-op in single mode.
    pub async fn disconnect(self) -> QbResult<()> {
        match self.target {
            Target::Pool(pool) => pool.disconnect().await.map_err(QbError::connection),
            Target::Single(_) => Ok(()),
        }
    }

    async fn run(&self, sql: &str) -> QbResult<QueryOutcome> {
        match &self.target {
            Target::Pool(pool) => {
                let mut conn = pool.get_conn().await.map_err(QbError::connection)?;
                run_on(&mut conn, sql).await
            }
            Target::Single(opts) => {
                let mut conn = Conn::new(opts.clone())
                    .await
                    .map_err(QbError::connection)?;
                let result = run_on(&mut conn, sql).await;
                if let Err(e) = conn.disconnect().await {
                    tracing::debug!(target: "myqb.exec", error = %e, "disconnect failed");
                }
                result
            }
        }
    }
}

#[async_trait]
impl Executor for MysqlExecutor {
    async fn query(&self, sql: &str) -> QbResult<QueryOutcome> {
        match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(sql))
                .await
                .map_err(|_| QbError::Timeout(limit))?,
            None => self.run(sql).await,
        }
    }
}

async fn run_on(conn: &mut Conn, sql: &str) -> QbResult<QueryOutcome> {
    let rows: Vec<mysql_async::Row> = conn
        .query(sql)
        .await
        .map_err(QbError::from_driver_error)?;
    let affected_rows = conn.affected_rows();
    let last_insert_id = conn.last_insert_id();
    let rows = rows.iter().map(convert_row).collect::<QbResult<Vec<_>>>()?;
    Ok(QueryOutcome {
        rows,
        affected_rows,
        last_insert_id,
    })
}

fn convert_row(row: &mysql_async::Row) -> QbResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns_ref().iter().enumerate() {
        let name = column.name_str().into_owned();
        let value = match row.as_ref(idx) {
            Some(raw) => convert_value(&name, column.column_type(), raw)?,
            None => Value::Null,
        };
        out.insert(name, value);
    }
    Ok(out)
}

/// Convert one driver value, using the column type to interpret text.
pub(crate) fn convert_value(column: &str, ty: ColumnType, value: &MyValue) -> QbResult<Value> {
    Ok(match value {
        MyValue::NULL => Value::Null,
        MyValue::Int(v) => Value::from(*v),
        MyValue::UInt(v) => Value::from(*v),
        MyValue::Float(v) => float(f64::from(*v)),
        MyValue::Double(v) => float(*v),
        MyValue::Date(year, month, day, hour, minute, second, micros) => Value::String(
            format_date(ty, *year, *month, *day, (*hour, *minute, *second, *micros)),
        ),
        MyValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let hours = u64::from(*days) * 24 + u64::from(*hours);
            let sign = if *negative { "-" } else { "" };
            let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if *micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            Value::String(text)
        }
        MyValue::Bytes(bytes) => convert_text(column, ty, bytes)?,
    })
}

fn convert_text(column: &str, ty: ColumnType, bytes: &[u8]) -> QbResult<Value> {
    use ColumnType::*;

    let text = || std::str::from_utf8(bytes).map_err(|e| QbError::decode(column, e.to_string()));
    match ty {
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_LONG | MYSQL_TYPE_INT24
        | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => {
            let text = text()?.trim();
            text.parse::<i64>()
                .map(Value::from)
                .or_else(|_| text.parse::<u64>().map(Value::from))
                .map_err(|e| QbError::decode(column, e.to_string()))
        }
        MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE => text()?
            .trim()
            .parse::<f64>()
            .map(float)
            .map_err(|e| QbError::decode(column, e.to_string())),
        MYSQL_TYPE_JSON => {
            serde_json::from_slice(bytes).map_err(|e| QbError::decode(column, e.to_string()))
        }
        MYSQL_TYPE_BIT if bytes.len() <= 8 => Ok(Value::from(
            bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
        )),
        // DECIMAL stays textual to keep its precision.
        _ => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn format_date(ty: ColumnType, year: u16, month: u8, day: u8, time: (u8, u8, u8, u32)) -> String {
    let (hour, minute, second, micros) = time;
    let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day));
    if ty == ColumnType::MYSQL_TYPE_DATE {
        return match date {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => format!("{year:04}-{month:02}-{day:02}"),
        };
    }
    let datetime: Option<NaiveDateTime> = date.and_then(|d| {
        d.and_hms_micro_opt(
            u32::from(hour),
            u32::from(minute),
            u32::from(second),
            micros,
        )
    });
    match datetime {
        Some(dt) if micros > 0 => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        // Zero dates have no calendar value.
        None => format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"),
    }
}
