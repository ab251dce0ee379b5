//! Terminal calls: assemble, run through hooks and the executor, reshape.

use super::QueryBuilder;
use crate::condition::{quote_column, render_assignments};
use crate::error::{QbError, QbResult};
use crate::exec::{INSERT_ID, QueryOutcome, ReturnMode};
use crate::monitor::{HookAction, QueryContext, QueryResult, QueryType};
use crate::row::{Row, as_count, from_row, key_string};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Instant;

const PLUCK_KEY: &str = "keyColumn";
const PLUCK_VALUE: &str = "valueColumn";

impl QueryBuilder {
    // ==================== Core ====================

    /// Run the assembled statement and reshape the outcome per `mode`.
    pub async fn execute(&self, mode: ReturnMode, projection: Option<&str>) -> QbResult<Value> {
        let outcome = self.run(self.to_sql(), mode).await?;
        Ok(mode.reshape(outcome, projection))
    }

    /// Send `sql` through the hooks to the executor.
    async fn run(&self, sql: String, mode: ReturnMode) -> QbResult<QueryOutcome> {
        let executor = self.executor.as_ref().ok_or(QbError::Detached)?;
        let mut ctx = QueryContext::new(&sql, mode).with_table(self.fragments.table.as_str());

        for hook in &self.hooks {
            match hook.before_query(&ctx) {
                HookAction::Continue => {}
                HookAction::ModifySql(exec_sql) => {
                    ctx.query_type = QueryType::from_sql(&exec_sql);
                    ctx.exec_sql = exec_sql;
                }
                HookAction::Abort(reason) => return Err(QbError::Aborted(reason)),
            }
        }

        let start = Instant::now();
        let result = executor.query(&ctx.exec_sql).await;
        let duration = start.elapsed();

        let summary = match &result {
            Ok(outcome) if ctx.query_type == QueryType::Select || !outcome.rows.is_empty() => {
                QueryResult::Rows(outcome.rows.len())
            }
            Ok(outcome) => QueryResult::Affected(outcome.affected_rows),
            Err(e) => QueryResult::error(e.to_string()),
        };
        for hook in &self.hooks {
            hook.after_query(&ctx, duration, &summary);
        }
        result
    }

    // ==================== Reads ====================

    /// Every row of the current statement.
    pub async fn get(&mut self) -> QbResult<Vec<Row>> {
        Ok(self.run(self.to_sql(), ReturnMode::Default).await?.rows)
    }

    /// Alias of [`get`](Self::get).
    pub async fn get_all(&mut self) -> QbResult<Vec<Row>> {
        self.get().await
    }

    /// Every row, deserialized into `T`.
    pub async fn get_as<T: DeserializeOwned>(&mut self) -> QbResult<Vec<T>> {
        self.get().await?.into_iter().map(from_row).collect()
    }

    /// The first row; sets `LIMIT 1`, replacing any earlier limit.
    pub async fn first(&mut self) -> QbResult<Option<Row>> {
        self.limit(1);
        self.single().await
    }

    /// The first row deserialized into `T`.
    pub async fn first_as<T: DeserializeOwned>(&mut self) -> QbResult<Option<T>> {
        self.first().await?.map(from_row).transpose()
    }

    /// One field of the first row (`null` when there is no row or no such field).
    pub async fn value(&mut self, column: &str) -> QbResult<Value> {
        self.limit(1);
        self.execute(ReturnMode::Single, Some(column)).await
    }

    /// `SELECT count(*) as c ...`
    pub async fn count(&mut self) -> QbResult<u64> {
        self.fragments.select = "count(*) as c".to_string();
        let c = self.execute(ReturnMode::Single, Some("c")).await?;
        Ok(as_count(&c))
    }

    /// Whether the current condition matches at least one row.
    pub async fn exists(&mut self) -> QbResult<bool> {
        self.limit(1);
        Ok(self.count().await? > 0)
    }

    pub async fn doesnt_exist(&mut self) -> QbResult<bool> {
        Ok(!self.exists().await?)
    }

    /// Map `key` to `value` (defaults to `key`) over every row.
    ///
    /// An empty key is a no-op: nothing runs and the map is empty.
    pub async fn pluck(&mut self, key: &str, value: Option<&str>) -> QbResult<Map<String, Value>> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(Map::new());
        }
        let value = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(key);
        self.fragments.select = format!(
            "{} as {PLUCK_KEY}, {} as {PLUCK_VALUE}",
            quote_column(key),
            quote_column(value)
        );
        let mut plucked = Map::new();
        for mut row in self.get().await? {
            let k = row.remove(PLUCK_KEY).unwrap_or(Value::Null);
            let v = row.remove(PLUCK_VALUE).unwrap_or(Value::Null);
            plucked.insert(key_string(&k), v);
        }
        Ok(plucked)
    }

    pub async fn max(&mut self, column: &str) -> QbResult<Value> {
        self.aggregate("max", column).await
    }

    pub async fn min(&mut self, column: &str) -> QbResult<Value> {
        self.aggregate("min", column).await
    }

    pub async fn sum(&mut self, column: &str) -> QbResult<Value> {
        self.aggregate("sum", column).await
    }

    /// `avg(a+b+...)` over the given columns.
    pub async fn avg(&mut self, columns: &[&str]) -> QbResult<Value> {
        let expr = columns
            .iter()
            .map(|c| quote_column(c))
            .collect::<Vec<_>>()
            .join("+");
        if expr.is_empty() {
            return Err(QbError::validation("avg needs at least one column"));
        }
        self.fragments.select = format!("avg({expr}) as av");
        self.execute(ReturnMode::Single, Some("av")).await
    }

    async fn aggregate(&mut self, function: &str, column: &str) -> QbResult<Value> {
        self.fragments.select = format!("{function}({}) as m", quote_column(column));
        self.value("m").await
    }

    async fn single(&self) -> QbResult<Option<Row>> {
        let outcome = self.run(self.to_sql(), ReturnMode::Single).await?;
        Ok(outcome.rows.into_iter().next())
    }

    // ==================== Writes ====================

    /// `INSERT INTO table SET ...`; returns the affected row count.
    pub async fn insert(&mut self, payload: &Map<String, Value>) -> QbResult<u64> {
        self.set_insert(payload)?;
        Ok(self.run(self.to_sql(), ReturnMode::Default).await?.affected_rows)
    }

    /// Insert and return the generated id.
    pub async fn insert_get_id(&mut self, payload: &Map<String, Value>) -> QbResult<Option<u64>> {
        self.set_insert(payload)?;
        let id = self.execute(ReturnMode::Insert, Some(INSERT_ID)).await?;
        Ok(id.as_u64())
    }

    /// `UPDATE table SET ... WHERE ...`; returns the affected row count.
    pub async fn update(&mut self, payload: &Map<String, Value>) -> QbResult<u64> {
        if payload.is_empty() {
            return Err(QbError::validation("update payload is empty"));
        }
        self.fragments.update = render_assignments(payload);
        Ok(self.run(self.to_sql(), ReturnMode::Default).await?.affected_rows)
    }

    /// `DELETE FROM table WHERE ...`; returns the affected row count.
    pub async fn delete(&mut self) -> QbResult<u64> {
        self.fragments.delete = true;
        Ok(self.run(self.to_sql(), ReturnMode::Default).await?.affected_rows)
    }

    /// `TRUNCATE TABLE table`
    pub async fn truncate(&mut self) -> QbResult<Value> {
        let sql = format!("TRUNCATE TABLE {}", self.target_table()?);
        Ok(ReturnMode::Insert.reshape(self.run(sql, ReturnMode::Insert).await?, None))
    }

    /// `DROP TABLE table`
    pub async fn drop_table(&mut self) -> QbResult<Value> {
        let sql = format!("DROP TABLE {}", self.target_table()?);
        Ok(ReturnMode::Insert.reshape(self.run(sql, ReturnMode::Insert).await?, None))
    }

    fn set_insert(&mut self, payload: &Map<String, Value>) -> QbResult<()> {
        if payload.is_empty() {
            return Err(QbError::validation("insert payload is empty"));
        }
        self.fragments.insert = render_assignments(payload);
        Ok(())
    }

    fn target_table(&self) -> QbResult<&str> {
        let table = self.fragments.table.trim();
        if table.is_empty() {
            Err(QbError::validation("no table selected"))
        } else {
            Ok(table)
        }
    }

    // ==================== Schema ====================

    /// `SHOW COLUMNS FROM table`; the session's fragments are left untouched.
    pub async fn get_columns(&self) -> QbResult<Vec<Row>> {
        let sql = format!("SHOW COLUMNS FROM {}", self.target_table()?);
        Ok(self.run(sql, ReturnMode::Default).await?.rows)
    }

    /// Column names of the session's table.
    pub async fn columns(&self) -> QbResult<Vec<String>> {
        Ok(self
            .get_columns()
            .await?
            .into_iter()
            .filter_map(|mut row| match row.remove("Field") {
                Some(Value::String(name)) => Some(name),
                _ => None,
            })
            .collect())
    }

    /// Name of the primary key column, if the table has one.
    pub async fn primary(&self) -> QbResult<Option<String>> {
        let sql = format!(
            "SHOW KEYS FROM {} WHERE Key_name = 'PRIMARY'",
            self.target_table()?
        );
        let outcome = self.run(sql, ReturnMode::Single).await?;
        Ok(match ReturnMode::Single.reshape(outcome, Some("Column_name")) {
            Value::String(name) => Some(name),
            _ => None,
        })
    }

    // ==================== Lenient variants ====================

    /// [`get`](Self::get) after dropping selected columns the table does not have.
    pub async fn get_force(&mut self) -> QbResult<Vec<Row>> {
        self.retain_known_select().await?;
        self.get().await
    }

    /// Like [`get_force`](Self::get_force) but returns the first row only.
    pub async fn get_force_single(&mut self) -> QbResult<Option<Row>> {
        self.retain_known_select().await?;
        self.single().await
    }

    /// [`insert`](Self::insert) after dropping payload fields the table does not have.
    pub async fn force_insert(&mut self, payload: &Map<String, Value>) -> QbResult<u64> {
        let payload = self.known_fields(payload).await?;
        self.insert(&payload).await
    }

    /// [`update`](Self::update) after dropping payload fields the table does not have.
    pub async fn force_update(&mut self, payload: &Map<String, Value>) -> QbResult<u64> {
        let payload = self.known_fields(payload).await?;
        self.update(&payload).await
    }

    async fn retain_known_select(&mut self) -> QbResult<()> {
        let known = self.columns().await?;
        let kept: Vec<String> = self
            .fragments
            .select_columns()
            .into_iter()
            .filter(|c| known.iter().any(|k| k == bare_column(c)))
            .collect();
        self.fragments.select = kept.join(", ");
        Ok(())
    }

    async fn known_fields(&self, payload: &Map<String, Value>) -> QbResult<Map<String, Value>> {
        let known = self.columns().await?;
        Ok(payload
            .iter()
            .filter(|(k, _)| known.iter().any(|c| c == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Unqualified, unquoted name of a select-list column: `` `u`.`id` `` is `id`.
fn bare_column(column: &str) -> &str {
    let column = column.trim();
    column
        .rsplit('.')
        .next()
        .unwrap_or(column)
        .trim()
        .trim_matches('`')
}
