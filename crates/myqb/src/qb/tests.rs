use super::*;
use crate::condition::{CompareOp, Condition};
use crate::config::ConnectionConfig;
use crate::error::QbError;
use crate::exec::{QueryOutcome, ReturnMode};
use crate::monitor::{HookAction, QueryContext, QueryResult};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ── Scripted executor: records SQL, replays queued outcomes ──

#[derive(Default)]
struct Scripted {
    sql: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<QbResult<QueryOutcome>>>,
}

impl Scripted {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn reply(&self, outcome: QueryOutcome) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(outcome));
        self
    }

    fn fail(&self, err: QbError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    fn rows(&self, rows: Value) -> &Self {
        self.reply(QueryOutcome::from_rows(to_rows(rows)))
    }

    fn statements(&self) -> Vec<String> {
        self.sql.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for Scripted {
    async fn query(&self, sql: &str) -> QbResult<QueryOutcome> {
        self.sql.lock().unwrap().push(sql.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryOutcome::default()))
    }
}

fn to_rows(rows: Value) -> Vec<crate::row::Row> {
    rows.as_array()
        .expect("array")
        .iter()
        .map(|r| r.as_object().cloned().expect("object"))
        .collect()
}

fn map(v: Value) -> Map<String, Value> {
    v.as_object().cloned().expect("object")
}

fn db(exec: &Arc<Scripted>) -> QueryBuilder {
    QueryBuilder::offline().with_executor(exec.clone())
}

// ── SQL rendering ──

#[test]
fn test_bare_select() {
    let mut qb = QueryBuilder::offline();
    qb.table("users");
    assert_eq!(qb.to_sql(), "SELECT * FROM users");
}

#[test]
fn test_where_connectors_follow_each_call() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .or_where_eq("a", 1)
        .where_eq("b", 2)
        .or_where_op("c", CompareOp::Gte, 3)
        .where_op("d", CompareOp::Like, "x%");
    let sql = qb.to_sql();
    assert_eq!(
        sql,
        "SELECT * FROM users WHERE `a` = 1 AND `b` = 2 OR `c` >= 3 AND `d` LIKE 'x%'"
    );
    assert_eq!(sql.matches("WHERE").count(), 1);
}

#[test]
fn test_where_map_and_triple() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .where_map([("status", json!("on")), ("age >", json!(18))])
        .or_where_triple("name", "like", "a%")
        .where_triple("id", 5, Value::Null);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE `status` = 'on' AND `age` > 18 OR `name` LIKE 'a%' AND `id` = 5"
    );
}

#[test]
fn test_empty_inputs_are_noops() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .where_map(Vec::<(String, Value)>::new())
        .group_by(&[])
        .where_exists(|q| q)
        .or_where_group(|q| q);
    assert_eq!(qb.to_sql(), "SELECT * FROM users");
}

#[test]
fn test_table_resets_session() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .where_eq("a", 1)
        .order_by_desc(&["id"])
        .limit(5)
        .raw("SELECT 1", &[]);
    qb.table("posts").where_eq("b", 2);
    assert_eq!(qb.to_sql(), "SELECT * FROM posts WHERE `b` = 2");
    assert_eq!(qb.fragments().limit, "");
}

#[test]
fn test_grouped_conditions() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .where_eq("role", "admin")
        .or_where_group(|q| q.where_eq("role", "staff").where_not_null("verified_at"));
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE `role` = 'admin' OR (`role` = 'staff' AND `verified_at` IS NOT NULL)"
    );
}

#[test]
fn test_grouped_raw_where_drops_keyword() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .where_eq("a", 1)
        .where_group(|q| q.where_raw("WHERE b = ? OR c = ?", &[json!(2), json!(3)]));
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE `a` = 1 AND (b = 2 OR c = 3)"
    );

    qb.table("users")
        .where_group(|q| q.where_raw("where b = ?", &[json!(2)]));
    assert_eq!(qb.to_sql(), "SELECT * FROM users WHERE (b = 2)");
}

#[test]
fn test_grouped_having() {
    let mut qb = QueryBuilder::offline();
    qb.table("orders")
        .group_by(&["user_id"])
        .having_op("c", CompareOp::Gt, 2)
        .or_having_group(|q| q.having_raw("HAVING sum(total) > ?", &[json!(10)]));
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM orders GROUP BY `user_id` HAVING `c` > 2 OR (sum(total) > 10)"
    );
}

#[test]
fn test_odd_column_names_are_quoted() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .where_map([("first-name", json!("a"))])
        .where_eq("id = 1 OR 1", 1);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE `first-name` = 'a' AND `id = 1 OR 1` = 1"
    );
}

#[test]
fn test_sub_session_is_isolated() {
    let mut qb = QueryBuilder::offline();
    qb.table("users").limit(3);
    qb.where_group(|q| q.table("other").where_eq("x", 1).limit(99));
    assert_eq!(qb.to_sql(), "SELECT * FROM users WHERE (`x` = 1) LIMIT 3");
}

#[test]
fn test_where_exists_keeps_inner_where() {
    let mut qb = QueryBuilder::offline();
    qb.table("users").where_eq("active", true).where_exists(|q| {
        q.table("posts")
            .select(&["id"])
            .where_column("posts.user_id", CompareOp::Eq, "users.id")
    });
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE `active` = true AND EXISTS \
         (SELECT `id` FROM posts WHERE `posts`.`user_id` = `users`.`id`)"
    );
}

#[test]
fn test_where_not_exists() {
    let mut qb = QueryBuilder::offline();
    qb.table("users").where_not_exists(|q| q.table("bans"));
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE NOT EXISTS (SELECT * FROM bans)"
    );
}

#[test]
fn test_in_family_and_nulls() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .where_in("id", [1, 2, 3])
        .or_where_not_in("role", ["a", "b"])
        .where_null("deleted_at")
        .or_where_in("x", Vec::<i32>::new());
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE `id` IN (1, 2, 3) OR `role` NOT IN ('a', 'b') \
         AND `deleted_at` IS NULL OR 1=0"
    );
}

#[test]
fn test_date_parts_use_joiner() {
    let mut qb = QueryBuilder::offline();
    qb.table("logs")
        .where_year("created_at", 2024)
        .where_month("created_at", 2)
        .where_date("created_at", "2024-02-29")
        .where_day("created_at", 29)
        .where_time("created_at", "10:00:00");
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM logs WHERE YEAR(`created_at`) = 2024 AND MONTH(`created_at`) = 2 \
         AND DATE(`created_at`) = '2024-02-29' AND DAY(`created_at`) = 29 \
         AND TIME(`created_at`) = '10:00:00'"
    );
}

#[test]
fn test_where_raw_overwrites() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .where_eq("a", 1)
        .where_raw("WHERE ?? = ?", &[json!("name"), json!("o'neil")]);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE `name` = 'o\\'neil'"
    );
}

#[test]
fn test_injection_stays_one_predicate() {
    let mut qb = QueryBuilder::offline();
    qb.table("users").where_eq("name", "x' OR '1'='1");
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE `name` = 'x\\' OR \\'1\\'=\\'1'"
    );
}

#[test]
fn test_having() {
    let mut qb = QueryBuilder::offline();
    qb.table("orders")
        .select(&["user_id", "count(*) as c"])
        .group_by(&["user_id"])
        .having_op("c", CompareOp::Gt, 2)
        .or_having_map([("c <", json!(100))]);
    assert_eq!(
        qb.to_sql(),
        "SELECT `user_id`, count(*) as c FROM orders GROUP BY `user_id` HAVING `c` > 2 OR `c` < 100"
    );

    qb.having_raw("HAVING sum(total) > ?", &[json!(10)]);
    assert!(qb.to_sql().ends_with("HAVING sum(total) > 10"));
}

#[test]
fn test_joins() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .join("roles", "users.role_id", CompareOp::Eq, "roles.id")
        .and_join(Condition::eq("roles.active", 1))
        .left_join_with("posts", |j| {
            j.on_join(Condition::columns("posts.user_id", CompareOp::Eq, "users.id"))
                .or_join(Condition::eq("posts.pinned", true))
        })
        .right_join("teams", "teams.id", CompareOp::Eq, "users.team_id");
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users INNER JOIN roles ON `users`.`role_id` = `roles`.`id` \
         AND `roles`.`active` = 1 LEFT JOIN posts ON `posts`.`user_id` = `users`.`id` \
         OR `posts`.`pinned` = true RIGHT JOIN teams ON `teams`.`id` = `users`.`team_id`"
    );
}

#[test]
fn test_join_callback_opens_on_clause() {
    let mut qb = QueryBuilder::offline();
    qb.table("a")
        .join_with("b", |j| j.and_join(Condition::columns("a.id", CompareOp::Eq, "b.a_id")));
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM a INNER JOIN b ON `a`.`id` = `b`.`a_id`"
    );
}

#[test]
fn test_clause_order_is_fixed() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .union_sql("SELECT * FROM admins")
        .having_raw("c > 1", &[])
        .offset(20)
        .limit(10)
        .group_by(&["role"])
        .order_by_asc(&["id"])
        .where_eq("active", 1)
        .join("roles", "roles.id", CompareOp::Eq, "users.role_id")
        .select(&["role", "count(*) as c"]);
    assert_eq!(
        qb.to_sql(),
        "SELECT `role`, count(*) as c FROM users INNER JOIN roles ON `roles`.`id` = `users`.`role_id` \
         WHERE `active` = 1 ORDER BY `id` ASC GROUP BY `role` LIMIT 10 OFFSET 20 HAVING c > 1 \
         UNION SELECT * FROM admins"
    );
}

#[test]
fn test_ordering_defaults() {
    let mut qb = QueryBuilder::offline();
    qb.table("users").order_by_desc(&[]);
    assert_eq!(qb.to_sql(), "SELECT * FROM users");

    let mut qb = QueryBuilder::offline().with_defaults(crate::config::Defaults {
        order_column: Some("created_at".to_string()),
    });
    qb.table("users").latest(&[]);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users ORDER BY `created_at` DESC LIMIT 1"
    );
    qb.table("users").oldest(&["id", "name"]);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users ORDER BY `id`, `name` ASC LIMIT 1"
    );
}

#[test]
fn test_raw_order_group_and_pagination() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .order_by_raw("FIELD(id, ?)", &[json!([3, 1])])
        .group_by_raw("YEAR(created_at)", &[])
        .take(5)
        .skip(10);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users ORDER BY FIELD(id, 3, 1) GROUP BY YEAR(created_at) LIMIT 5 OFFSET 10"
    );
}

#[test]
fn test_selection_helpers() {
    let mut qb = QueryBuilder::offline();
    qb.table("users").add_select("id").add_select("name");
    assert_eq!(qb.to_sql(), "SELECT `id`, `name` FROM users");

    qb.table("users").distinct("email");
    assert_eq!(qb.to_sql(), "SELECT DISTINCT `email` FROM users");

    qb.table("users").select_raw("count(??) as n", &[json!("id")]);
    assert_eq!(qb.to_sql(), "SELECT count(`id`) as n FROM users");
}

#[test]
fn test_union_with_builder() {
    let mut other = QueryBuilder::offline();
    other.table("admins").where_eq("active", 1);

    let mut qb = QueryBuilder::offline();
    qb.table("users").union(&other);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users UNION SELECT * FROM admins WHERE `active` = 1"
    );
}

#[test]
fn test_raw_override() {
    let mut qb = QueryBuilder::offline();
    qb.table("users")
        .where_eq("a", 1)
        .raw("SELECT * FROM t WHERE id = ?", &[json!(7)]);
    assert_eq!(qb.to_sql(), "SELECT * FROM t WHERE id = 7");
}

#[test]
fn test_unknown_kind_is_rejected() {
    let opts = QbOptions {
        kind: "oracle".to_string(),
        ..QbOptions::offline()
    };
    let err = QueryBuilder::new(opts).unwrap_err();
    assert_eq!(err.to_string(), "Configuration error: Invalid type connection name oracle");
}

#[test]
fn test_prevent_builds_detached() {
    let qb = QueryBuilder::new(QbOptions::mysql(ConnectionConfig::default()).prevent(true)).unwrap();
    assert!(!qb.is_attached());
    assert_eq!(qb.kind(), DbKind::Mysql);
}

// ── Execution ──

#[tokio::test]
async fn test_detached_terminal_fails() {
    let mut qb = QueryBuilder::offline();
    let err = qb.table("users").get().await.unwrap_err();
    assert!(matches!(err, QbError::Detached));
}

#[tokio::test]
async fn test_get_returns_rows() {
    let exec = Scripted::new();
    exec.rows(json!([{"id": 1}, {"id": 2}]));
    let mut qb = db(&exec);
    let rows = qb.table("users").get().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(exec.statements(), vec!["SELECT * FROM users"]);
}

#[tokio::test]
async fn test_get_as_deserializes() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct User {
        id: i64,
        name: String,
    }

    let exec = Scripted::new();
    exec.rows(json!([{"id": 1, "name": "a"}]));
    let users: Vec<User> = db(&exec).table("users").get_as().await.unwrap();
    assert_eq!(users, vec![User { id: 1, name: "a".into() }]);
}

#[tokio::test]
async fn test_first_overrides_limit() {
    let exec = Scripted::new();
    exec.rows(json!([{"id": 1}, {"id": 2}]));
    let mut qb = db(&exec);
    let row = qb.table("users").limit(10).first().await.unwrap().unwrap();
    assert_eq!(row["id"], json!(1));
    let sql = &exec.statements()[0];
    assert_eq!(sql, "SELECT * FROM users LIMIT 1");
    assert_eq!(sql.matches("LIMIT").count(), 1);
}

#[tokio::test]
async fn test_first_on_empty_result() {
    let exec = Scripted::new();
    let mut qb = db(&exec);
    assert!(qb.table("users").first().await.unwrap().is_none());
}

#[tokio::test]
async fn test_value_projects_first_row() {
    let exec = Scripted::new();
    exec.rows(json!([{"name": "bob", "id": 4}]));
    let mut qb = db(&exec);
    let name = qb.table("users").where_eq("id", 4).value("name").await.unwrap();
    assert_eq!(name, json!("bob"));
    assert_eq!(
        exec.statements(),
        vec!["SELECT * FROM users WHERE `id` = 4 LIMIT 1"]
    );
}

#[tokio::test]
async fn test_count_and_exists() {
    let exec = Scripted::new();
    exec.rows(json!([{"c": 0}]))
        .rows(json!([{"c": 0}]))
        .rows(json!([{"c": 1}]))
        .rows(json!([{"c": 1}]))
        .rows(json!([{"c": "3"}]));
    let mut qb = db(&exec);
    assert_eq!(qb.table("users").count().await.unwrap(), 0);
    assert!(!qb.table("users").exists().await.unwrap());
    assert!(qb.table("users").exists().await.unwrap());
    assert!(!qb.table("users").doesnt_exist().await.unwrap());
    assert_eq!(qb.table("users").where_eq("a", 1).count().await.unwrap(), 3);

    let sql = exec.statements();
    assert_eq!(sql[0], "SELECT count(*) as c FROM users");
    assert_eq!(sql[1], "SELECT count(*) as c FROM users LIMIT 1");
    assert_eq!(sql[2], "SELECT count(*) as c FROM users LIMIT 1");
    assert_eq!(sql[4], "SELECT count(*) as c FROM users WHERE `a` = 1");
}

#[tokio::test]
async fn test_pluck() {
    let exec = Scripted::new();
    exec.rows(json!([
        {"keyColumn": 1, "valueColumn": "a"},
        {"keyColumn": 2, "valueColumn": "b"}
    ]));
    let mut qb = db(&exec);
    let plucked = qb.table("users").pluck("id", Some("name")).await.unwrap();
    assert_eq!(Value::Object(plucked), json!({"1": "a", "2": "b"}));
    assert_eq!(
        exec.statements(),
        vec!["SELECT `id` as keyColumn, `name` as valueColumn FROM users"]
    );
}

#[tokio::test]
async fn test_pluck_without_key_is_noop() {
    let exec = Scripted::new();
    let mut qb = db(&exec);
    assert!(qb.table("users").pluck("", None).await.unwrap().is_empty());
    assert!(exec.statements().is_empty());
}

#[tokio::test]
async fn test_aggregates() {
    let exec = Scripted::new();
    exec.rows(json!([{"m": 9}]))
        .rows(json!([{"m": 1}]))
        .rows(json!([{"m": 30}]))
        .rows(json!([{"av": 2.5}]));
    let mut qb = db(&exec);
    assert_eq!(qb.table("t").max("score").await.unwrap(), json!(9));
    assert_eq!(qb.table("t").min("score").await.unwrap(), json!(1));
    assert_eq!(qb.table("t").sum("score").await.unwrap(), json!(30));
    assert_eq!(qb.table("t").avg(&["a", "b"]).await.unwrap(), json!(2.5));

    let sql = exec.statements();
    assert_eq!(sql[0], "SELECT max(`score`) as m FROM t LIMIT 1");
    assert_eq!(sql[2], "SELECT sum(`score`) as m FROM t LIMIT 1");
    assert_eq!(sql[3], "SELECT avg(`a`+`b`) as av FROM t");
}

#[tokio::test]
async fn test_insert_update_delete() {
    let exec = Scripted::new();
    exec.reply(QueryOutcome::affected(1, Some(7)))
        .reply(QueryOutcome::affected(1, Some(8)))
        .reply(QueryOutcome::affected(2, None))
        .reply(QueryOutcome::affected(3, None));
    let mut qb = db(&exec);

    let n = qb.table("users").insert(&map(json!({"name": "a", "age": 3}))).await.unwrap();
    assert_eq!(n, 1);
    let id = qb.table("users").insert_get_id(&map(json!({"name": "b"}))).await.unwrap();
    assert_eq!(id, Some(8));
    let n = qb
        .table("users")
        .where_eq("id", 1)
        .update(&map(json!({"name": "c"})))
        .await
        .unwrap();
    assert_eq!(n, 2);
    let n = qb.table("users").where_op("age", CompareOp::Lt, 18).delete().await.unwrap();
    assert_eq!(n, 3);

    assert_eq!(
        exec.statements(),
        vec![
            "INSERT INTO users SET `name` = 'a', `age` = 3",
            "INSERT INTO users SET `name` = 'b'",
            "UPDATE users SET `name` = 'c' WHERE `id` = 1",
            "DELETE FROM users WHERE `age` < 18",
        ]
    );
}

#[tokio::test]
async fn test_empty_payload_is_rejected() {
    let exec = Scripted::new();
    let mut qb = db(&exec);
    let err = qb.table("users").insert(&Map::new()).await.unwrap_err();
    assert!(matches!(err, QbError::Validation(_)));
    let err = qb.table("users").update(&Map::new()).await.unwrap_err();
    assert!(matches!(err, QbError::Validation(_)));
    assert!(exec.statements().is_empty());
}

#[tokio::test]
async fn test_truncate_and_drop() {
    let exec = Scripted::new();
    let mut qb = db(&exec);
    let meta = qb.table("users").truncate().await.unwrap();
    assert_eq!(meta, json!({"insertId": null, "affectedRows": 0}));
    qb.table("users").drop_table().await.unwrap();
    assert_eq!(
        exec.statements(),
        vec!["TRUNCATE TABLE users", "DROP TABLE users"]
    );
    assert_eq!(qb.to_sql(), "SELECT * FROM users");
}

#[tokio::test]
async fn test_schema_queries() {
    let exec = Scripted::new();
    exec.rows(json!([{"Field": "id", "Type": "int"}, {"Field": "name", "Type": "text"}]))
        .rows(json!([{"Column_name": "id", "Key_name": "PRIMARY"}]));
    let mut qb = db(&exec);
    qb.table("users").where_eq("id", 1);
    assert_eq!(qb.columns().await.unwrap(), vec!["id", "name"]);
    assert_eq!(qb.primary().await.unwrap().as_deref(), Some("id"));
    assert_eq!(
        exec.statements(),
        vec![
            "SHOW COLUMNS FROM users",
            "SHOW KEYS FROM users WHERE Key_name = 'PRIMARY'",
        ]
    );
    assert_eq!(qb.to_sql(), "SELECT * FROM users WHERE `id` = 1");
}

#[tokio::test]
async fn test_force_insert_drops_unknown_fields() {
    let exec = Scripted::new();
    exec.rows(json!([{"Field": "id"}, {"Field": "name"}]));
    let mut qb = db(&exec);
    qb.table("users")
        .force_insert(&map(json!({"id": 1, "ghost": "x"})))
        .await
        .unwrap();
    assert_eq!(
        exec.statements(),
        vec!["SHOW COLUMNS FROM users", "INSERT INTO users SET `id` = 1"]
    );
}

#[tokio::test]
async fn test_force_update_drops_unknown_fields() {
    let exec = Scripted::new();
    exec.rows(json!([{"Field": "id"}, {"Field": "name"}]));
    let mut qb = db(&exec);
    qb.table("users")
        .where_eq("id", 1)
        .force_update(&map(json!({"name": "z", "ghost": 0})))
        .await
        .unwrap();
    assert_eq!(
        exec.statements()[1],
        "UPDATE users SET `name` = 'z' WHERE `id` = 1"
    );
}

#[tokio::test]
async fn test_get_force_filters_select() {
    let exec = Scripted::new();
    exec.rows(json!([{"Field": "id"}, {"Field": "name"}]))
        .rows(json!([{"id": 1, "name": "a"}]))
        .rows(json!([{"Field": "id"}]))
        .rows(json!([{"id": 1}]));
    let mut qb = db(&exec);
    let rows = qb
        .table("users")
        .select(&["id", "ghost", "name"])
        .get_force()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let row = qb
        .table("users")
        .select(&["id", "name"])
        .get_force_single()
        .await
        .unwrap();
    assert_eq!(row.unwrap()["id"], json!(1));

    let sql = exec.statements();
    assert_eq!(sql[1], "SELECT `id`, `name` FROM users");
    assert_eq!(sql[3], "SELECT `id` FROM users");
}

#[tokio::test]
async fn test_get_force_keeps_qualified_columns() {
    let exec = Scripted::new();
    exec.rows(json!([{"Field": "id"}, {"Field": "name"}]))
        .rows(json!([{"id": 1, "name": "a"}]));
    let mut qb = db(&exec);
    qb.table("users")
        .select(&["users.id", "users.ghost", "`name`"])
        .get_force()
        .await
        .unwrap();
    assert_eq!(exec.statements()[1], "SELECT `users`.`id`, `name` FROM users");
}

#[tokio::test]
async fn test_insert_keys_are_quoted() {
    let exec = Scripted::new();
    exec.reply(QueryOutcome::affected(1, Some(1)));
    let mut qb = db(&exec);
    qb.table("users")
        .insert(&map(json!({"first-name": "a", "x = 1, admin": 1})))
        .await
        .unwrap();
    assert_eq!(
        exec.statements()[0],
        "INSERT INTO users SET `first-name` = 'a', `x = 1, admin` = 1"
    );
}

#[tokio::test]
async fn test_execute_modes() {
    let exec = Scripted::new();
    exec.rows(json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]))
        .reply(QueryOutcome::affected(1, Some(5)));
    let mut qb = db(&exec);
    qb.table("users");
    let names = qb.execute(ReturnMode::Default, Some("name")).await.unwrap();
    assert_eq!(names, json!(["a", "b"]));
    let meta = qb.execute(ReturnMode::Insert, None).await.unwrap();
    assert_eq!(meta, json!({"insertId": 5, "affectedRows": 1}));
}

#[tokio::test]
async fn test_driver_error_propagates() {
    let exec = Scripted::new();
    exec.fail(QbError::UniqueViolation("Duplicate entry".into()));
    let mut qb = db(&exec);
    let err = qb
        .table("users")
        .insert(&map(json!({"id": 1})))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}

// ── Hooks ──

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(String, QueryResult)>>,
    rewrite: Option<String>,
    abort: bool,
}

impl QueryHook for Recorder {
    fn before_query(&self, _ctx: &QueryContext) -> HookAction {
        if self.abort {
            return HookAction::Abort("read only".into());
        }
        match &self.rewrite {
            Some(sql) => HookAction::ModifySql(sql.clone()),
            None => HookAction::Continue,
        }
    }

    fn after_query(&self, ctx: &QueryContext, _duration: Duration, result: &QueryResult) {
        self.seen
            .lock()
            .unwrap()
            .push((ctx.exec_sql.clone(), result.clone()));
    }
}

#[tokio::test]
async fn test_hooks_observe_and_rewrite() {
    let exec = Scripted::new();
    exec.rows(json!([{"id": 1}]));
    let hook = Arc::new(Recorder {
        rewrite: Some("SELECT * FROM users_v2".into()),
        ..Recorder::default()
    });
    let mut qb = db(&exec).with_hook(hook.clone());
    qb.table("users").get().await.unwrap();

    assert_eq!(exec.statements(), vec!["SELECT * FROM users_v2"]);
    let seen = hook.seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![("SELECT * FROM users_v2".to_string(), QueryResult::Rows(1))]
    );
}

#[tokio::test]
async fn test_hook_abort_stops_execution() {
    let exec = Scripted::new();
    let hook = Arc::new(Recorder {
        abort: true,
        ..Recorder::default()
    });
    let mut qb = db(&exec).with_hook(hook);
    let err = qb.table("users").delete().await.unwrap_err();
    assert!(matches!(err, QbError::Aborted(reason) if reason == "read only"));
    assert!(exec.statements().is_empty());
}

#[tokio::test]
async fn test_create_links_executor_and_hooks() {
    let exec = Scripted::new();
    exec.reply(QueryOutcome::affected(4, None));
    let hook = Arc::new(Recorder::default());
    let mut parent = db(&exec).with_hook(hook.clone());
    parent.table("users").where_eq("a", 1);

    let mut child = parent.create();
    assert_eq!(child.fragments(), &crate::fragment::Fragments::default());
    child.table("posts").delete().await.unwrap();

    assert_eq!(exec.statements(), vec!["DELETE FROM posts"]);
    assert_eq!(hook.seen.lock().unwrap()[0].1, QueryResult::Affected(4));
    assert_eq!(parent.to_sql(), "SELECT * FROM users WHERE `a` = 1");
}
