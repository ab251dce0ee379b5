//! JOIN builders.

use super::QueryBuilder;
use crate::condition::{CompareOp, Condition, JoinConnector, push_join_predicate};

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

impl QueryBuilder {
    /// `INNER JOIN table ON left op right`
    pub fn join(&mut self, table: &str, left: &str, op: CompareOp, right: &str) -> &mut Self {
        self.join_on(JoinKind::Inner, table, left, op, right)
    }

    /// `LEFT JOIN table ON left op right`
    pub fn left_join(&mut self, table: &str, left: &str, op: CompareOp, right: &str) -> &mut Self {
        self.join_on(JoinKind::Left, table, left, op, right)
    }

    /// `RIGHT JOIN table ON left op right`
    pub fn right_join(&mut self, table: &str, left: &str, op: CompareOp, right: &str) -> &mut Self {
        self.join_on(JoinKind::Right, table, left, op, right)
    }

    /// `INNER JOIN table <on>` where `<on>` is the join text the callback builds
    /// with [`on_join`](Self::on_join) / [`and_join`](Self::and_join) /
    /// [`or_join`](Self::or_join).
    pub fn join_with<F>(&mut self, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        self.join_sub(JoinKind::Inner, table, build)
    }

    pub fn left_join_with<F>(&mut self, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        self.join_sub(JoinKind::Left, table, build)
    }

    pub fn right_join_with<F>(&mut self, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        self.join_sub(JoinKind::Right, table, build)
    }

    /// Append `ON cond` to the join text.
    pub fn on_join(&mut self, cond: Condition) -> &mut Self {
        self.push_join(JoinConnector::On, cond)
    }

    /// Append `AND cond`; opens the `ON` clause when the join text is empty.
    pub fn and_join(&mut self, cond: Condition) -> &mut Self {
        self.push_join(JoinConnector::And, cond)
    }

    /// Append `OR cond`; opens the `ON` clause when the join text is empty.
    pub fn or_join(&mut self, cond: Condition) -> &mut Self {
        self.push_join(JoinConnector::Or, cond)
    }

    fn push_join(&mut self, connector: JoinConnector, cond: Condition) -> &mut Self {
        if !cond.is_empty() {
            push_join_predicate(&mut self.fragments.join, connector, &cond.render());
        }
        self
    }

    fn join_on(&mut self, kind: JoinKind, table: &str, left: &str, op: CompareOp, right: &str) -> &mut Self {
        let on = Condition::columns(left, op, right).render();
        self.append_join(kind, table, &format!("ON {on}"))
    }

    fn join_sub<F>(&mut self, kind: JoinKind, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        let sub = self.sub_session(build);
        self.append_join(kind, table, &sub.fragments.join)
    }

    fn append_join(&mut self, kind: JoinKind, table: &str, on: &str) -> &mut Self {
        let join = &mut self.fragments.join;
        if !join.is_empty() {
            join.push(' ');
        }
        join.push_str(kind.as_str());
        join.push(' ');
        join.push_str(table.trim());
        let on = on.trim();
        if !on.is_empty() {
            join.push(' ');
            join.push_str(on);
        }
        self
    }
}
