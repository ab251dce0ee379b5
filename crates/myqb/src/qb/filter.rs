//! WHERE and HAVING builders.
//!
//! Every method renders a [`Condition`] and appends it through the shared
//! joiner, so the connector (`AND` / `OR`) is only emitted before the second
//! and later predicates of a slot. Empty input leaves the builder unchanged.

use super::QueryBuilder;
use crate::assemble::strip_leading_keyword;
use crate::condition::{CompareOp, Condition, Conjunction, DatePart, push_predicate};
use crate::escape::format;
use crate::fragment::Slot;
use serde_json::Value;

impl QueryBuilder {
    /// Append `cond` to a predicate slot.
    pub(crate) fn push_condition(&mut self, slot: Slot, conj: Conjunction, cond: Condition) -> &mut Self {
        if !cond.is_empty() {
            push_predicate(self.fragments.slot_mut(slot), conj, &cond.render());
        }
        self
    }

    // ==================== WHERE: generic ====================

    /// `AND` an arbitrary condition.
    pub fn where_cond(&mut self, cond: Condition) -> &mut Self {
        self.push_condition(Slot::Where, Conjunction::And, cond)
    }

    /// `OR` an arbitrary condition.
    pub fn or_where_cond(&mut self, cond: Condition) -> &mut Self {
        self.push_condition(Slot::Where, Conjunction::Or, cond)
    }

    /// `AND` column→value pairs (themselves joined with `AND`).
    ///
    /// A key may carry its operator: `("age >=", 18)`, `("name like", "a%")`.
    /// An empty map is a no-op.
    pub fn where_map<K, V, I>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.where_cond(Condition::pairs(pairs))
    }

    /// `OR` column→value pairs.
    pub fn or_where_map<K, V, I>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.or_where_cond(Condition::pairs(pairs))
    }

    /// `AND column = value`
    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_cond(Condition::eq(column, value))
    }

    /// `OR column = value`
    pub fn or_where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.or_where_cond(Condition::eq(column, value))
    }

    /// `AND column op value`
    pub fn where_op(&mut self, column: &str, op: CompareOp, value: impl Into<Value>) -> &mut Self {
        self.where_cond(Condition::op(column, op, value))
    }

    /// `OR column op value`
    pub fn or_where_op(&mut self, column: &str, op: CompareOp, value: impl Into<Value>) -> &mut Self {
        self.or_where_cond(Condition::op(column, op, value))
    }

    /// `(column, operator-or-value, value)`; see [`Condition::triple`].
    pub fn where_triple(
        &mut self,
        column: &str,
        middle: impl Into<Value>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.where_cond(Condition::triple(column, middle, value))
    }

    pub fn or_where_triple(
        &mut self,
        column: &str,
        middle: impl Into<Value>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.or_where_cond(Condition::triple(column, middle, value))
    }

    /// `AND left op right`, comparing two columns.
    pub fn where_column(&mut self, left: &str, op: CompareOp, right: &str) -> &mut Self {
        self.where_cond(Condition::columns(left, op, right))
    }

    /// `AND ( ... )` built by a sub-session's WHERE predicates.
    pub fn where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        let cond = self.grouped(Slot::Where, build);
        self.where_cond(cond)
    }

    /// `OR ( ... )` built by a sub-session's WHERE predicates.
    pub fn or_where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        let cond = self.grouped(Slot::Where, build);
        self.or_where_cond(cond)
    }

    /// The sub-session's `slot` text as one parenthesized predicate.
    ///
    /// A leading `WHERE` / `HAVING` (e.g. from `where_raw`) is dropped so the
    /// keyword never ends up inside the parentheses.
    fn grouped<F>(&self, slot: Slot, build: F) -> Condition
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        let keyword = match slot {
            Slot::Where => "WHERE",
            Slot::Having => "HAVING",
            Slot::Join => "ON",
        };
        let sub = self.sub_session(build);
        Condition::group(strip_leading_keyword(keyword, sub.fragments.slot(slot)))
    }

    /// Replace the WHERE text with a formatted template (`?` values, `??` identifiers).
    ///
    /// The text is trusted: it is inserted without further escaping.
    pub fn where_raw(&mut self, template: &str, values: &[Value]) -> &mut Self {
        self.fragments.where_clause = format(template, values);
        self
    }

    // ==================== WHERE: special forms ====================

    /// `AND column IN (values)`; an empty list matches nothing.
    pub fn where_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.where_cond(in_list(column, values, false))
    }

    pub fn or_where_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.or_where_cond(in_list(column, values, false))
    }

    /// `AND column NOT IN (values)`; an empty list matches everything.
    pub fn where_not_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.where_cond(in_list(column, values, true))
    }

    pub fn or_where_not_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.or_where_cond(in_list(column, values, true))
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.where_cond(Condition::Null {
            column: column.to_string(),
            negated: false,
        })
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.where_cond(Condition::Null {
            column: column.to_string(),
            negated: true,
        })
    }

    /// `AND EXISTS (statement)` where the statement is the sub-session's SQL.
    ///
    /// A callback that leaves the sub-session untouched is a no-op.
    pub fn where_exists<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        self.exists_condition(build, false)
    }

    /// `AND NOT EXISTS (statement)`
    pub fn where_not_exists<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        self.exists_condition(build, true)
    }

    fn exists_condition<F>(&mut self, build: F, negated: bool) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        let sub = self.sub_session(build);
        if sub.fragments == Default::default() {
            return self;
        }
        self.where_cond(Condition::Exists {
            statement: sub.to_sql(),
            negated,
        })
    }

    /// `AND DATE(column) = value`
    pub fn where_date(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_part(DatePart::Date, column, value)
    }

    /// `AND DAY(column) = value`
    pub fn where_day(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_part(DatePart::Day, column, value)
    }

    /// `AND MONTH(column) = value`
    pub fn where_month(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_part(DatePart::Month, column, value)
    }

    /// `AND YEAR(column) = value`
    pub fn where_year(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_part(DatePart::Year, column, value)
    }

    /// `AND TIME(column) = value`
    pub fn where_time(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_part(DatePart::Time, column, value)
    }

    fn where_part(&mut self, part: DatePart, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_cond(Condition::DatePart {
            part,
            column: column.to_string(),
            value: value.into(),
        })
    }

    // ==================== HAVING ====================

    pub fn having_cond(&mut self, cond: Condition) -> &mut Self {
        self.push_condition(Slot::Having, Conjunction::And, cond)
    }

    pub fn or_having_cond(&mut self, cond: Condition) -> &mut Self {
        self.push_condition(Slot::Having, Conjunction::Or, cond)
    }

    /// `AND` column→value pairs into HAVING.
    pub fn having_map<K, V, I>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.having_cond(Condition::pairs(pairs))
    }

    pub fn or_having_map<K, V, I>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.or_having_cond(Condition::pairs(pairs))
    }

    pub fn having_op(&mut self, column: &str, op: CompareOp, value: impl Into<Value>) -> &mut Self {
        self.having_cond(Condition::op(column, op, value))
    }

    pub fn or_having_op(&mut self, column: &str, op: CompareOp, value: impl Into<Value>) -> &mut Self {
        self.or_having_cond(Condition::op(column, op, value))
    }

    /// `AND ( ... )` built by a sub-session's HAVING predicates.
    pub fn having_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        let cond = self.grouped(Slot::Having, build);
        self.having_cond(cond)
    }

    /// `OR ( ... )` built by a sub-session's HAVING predicates.
    pub fn or_having_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder) -> &mut QueryBuilder,
    {
        let cond = self.grouped(Slot::Having, build);
        self.or_having_cond(cond)
    }

    /// Replace the HAVING text with a formatted template.
    pub fn having_raw(&mut self, template: &str, values: &[Value]) -> &mut Self {
        self.fragments.having = format(template, values);
        self
    }
}

fn in_list<I>(column: &str, values: I, negated: bool) -> Condition
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Condition::In {
        column: column.to_string(),
        values: values.into_iter().map(Into::into).collect(),
        negated,
    }
}
