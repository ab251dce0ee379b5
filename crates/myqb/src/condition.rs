//! Predicate shapes and the boolean joiner.
//!
//! Every WHERE / HAVING / JOIN ... ON predicate is a [`Condition`]. The
//! builder renders it to text and hands it to [`push_predicate`], which
//! decides the connecting word: an empty fragment gets no prefix, a
//! non-empty one gets the requested `AND` / `OR`.
//!
//! # Example
//! ```
//! use myqb::condition::{push_predicate, CompareOp, Condition, Conjunction};
//!
//! let mut clause = String::new();
//! push_predicate(&mut clause, Conjunction::And, &Condition::eq("status", "active").render());
//! push_predicate(&mut clause, Conjunction::Or, &Condition::op("age", CompareOp::Gt, 18).render());
//! assert_eq!(clause, "`status` = 'active' OR `age` > 18");
//! ```

use crate::escape::{escape, escape_id};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// `column op` keys in column→value maps, e.g. `"age >="` or `"name like"`.
static KEY_OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(.+?)(?:\s*(>=|<=|!=|>|<|=)|\s+(like))\s*$").expect("valid regex")
});

/// Plain (possibly dotted) identifiers that are safe to backtick-quote.
static PLAIN_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)*$").expect("valid regex")
});

/// Recognized comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Like => "LIKE",
        }
    }

    /// Parse an operator token; `None` when the text is not an operator.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "=" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Gte),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Lte),
            t if t.eq_ignore_ascii_case("like") => Some(CompareOp::Like),
            _ => None,
        }
    }
}

impl FromStr for CompareOp {
    type Err = crate::error::QbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompareOp::parse(s)
            .ok_or_else(|| crate::error::QbError::validation(format!("Unknown operator '{s}'")))
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connecting word placed before the second and later predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// SQL date/time functions used by the `where_date` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Date,
    Day,
    Month,
    Year,
    Time,
}

impl DatePart {
    pub fn function(self) -> &'static str {
        match self {
            DatePart::Date => "DATE",
            DatePart::Day => "DAY",
            DatePart::Month => "MONTH",
            DatePart::Year => "YEAR",
            DatePart::Time => "TIME",
        }
    }
}

/// One predicate, in one of the shapes the builder accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Column→value pairs joined with `AND`. A key may carry its own
    /// operator (`"age >"`); otherwise `=` is used.
    Pairs(Vec<(String, Value)>),
    /// `column op literal`
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// `column op column`
    Columns {
        left: String,
        op: CompareOp,
        right: String,
    },
    /// `column [NOT] IN (list)`
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null { column: String, negated: bool },
    /// `FUNC(column) = literal`
    DatePart {
        part: DatePart,
        column: String,
        value: Value,
    },
    /// `[NOT] EXISTS (statement)`
    Exists { statement: String, negated: bool },
    /// Text produced by a sub-session, wrapped in parentheses as one predicate.
    Group(String),
    /// Caller-trusted SQL, inserted verbatim.
    Raw(String),
}

impl Condition {
    /// Pairs from any column→value iterator.
    pub fn pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Condition::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Pairs from a JSON object, preserving key order.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Condition::Pairs(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::op(column, CompareOp::Eq, value)
    }

    pub fn op(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `(column, operator-or-value, value)` form.
    ///
    /// When `middle` is a string naming a recognized operator the result is
    /// `column middle value`; otherwise `middle` is the value of an equality
    /// and `value` is ignored.
    pub fn triple(column: impl Into<String>, middle: impl Into<Value>, value: impl Into<Value>) -> Self {
        let middle = middle.into();
        match middle.as_str().and_then(CompareOp::parse) {
            Some(op) => Self::op(column, op, value),
            None => Self::op(column, CompareOp::Eq, middle),
        }
    }

    pub fn columns(left: impl Into<String>, op: CompareOp, right: impl Into<String>) -> Self {
        Condition::Columns {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    pub fn group(text: impl Into<String>) -> Self {
        Condition::Group(text.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Condition::Raw(sql.into())
    }

    /// Whether rendering would produce no predicate at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Pairs(pairs) => pairs.is_empty(),
            Condition::Group(text) | Condition::Raw(text) => text.trim().is_empty(),
            Condition::Exists { statement, .. } => statement.trim().is_empty(),
            _ => false,
        }
    }

    /// Render to predicate text (no leading connector).
    pub fn render(&self) -> String {
        match self {
            Condition::Pairs(pairs) => pairs
                .iter()
                .map(|(key, value)| render_pair(key, value))
                .collect::<Vec<_>>()
                .join(" AND "),
            Condition::Compare { column, op, value } => {
                format!("{} {} {}", quote_ident(column), op, escape(value))
            }
            Condition::Columns { left, op, right } => {
                format!("{} {} {}", quote_column(left), op, quote_column(right))
            }
            Condition::In {
                column,
                values,
                negated,
            } => {
                // Empty lists have no valid IN form; fall back to a constant.
                if values.is_empty() {
                    let constant = if *negated { "1=1" } else { "1=0" };
                    return constant.to_string();
                }
                let list = values.iter().map(escape).collect::<Vec<_>>().join(", ");
                let not = if *negated { "NOT " } else { "" };
                format!("{} {not}IN ({list})", quote_ident(column))
            }
            Condition::Null { column, negated } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} IS {not}NULL", quote_ident(column))
            }
            Condition::DatePart {
                part,
                column,
                value,
            } => format!("{}({}) = {}", part.function(), quote_ident(column), escape(value)),
            Condition::Exists { statement, negated } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{not}EXISTS ({})", statement.trim())
            }
            Condition::Group(text) => format!("({})", text.trim()),
            Condition::Raw(sql) => sql.trim().to_string(),
        }
    }
}

/// Append `predicate` to `target`, prefixed with `conj` only when `target`
/// already holds a predicate. Returns `false` for an empty predicate, which
/// leaves `target` untouched.
pub fn push_predicate(target: &mut String, conj: Conjunction, predicate: &str) -> bool {
    let predicate = predicate.trim();
    if predicate.is_empty() {
        return false;
    }
    if !target.trim().is_empty() {
        target.push(' ');
        target.push_str(conj.as_str());
        target.push(' ');
    } else {
        target.clear();
    }
    target.push_str(predicate);
    true
}

/// How a predicate attaches to the join fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinConnector {
    /// Start an `ON` clause.
    On,
    And,
    Or,
}

/// Append a join predicate. `AND` / `OR` on an empty fragment open the
/// `ON` clause instead, so a join fragment never starts with a connector.
pub fn push_join_predicate(target: &mut String, connector: JoinConnector, predicate: &str) -> bool {
    let predicate = predicate.trim();
    if predicate.is_empty() {
        return false;
    }
    let word = match connector {
        JoinConnector::On => "ON",
        _ if target.trim().is_empty() => "ON",
        JoinConnector::And => "AND",
        JoinConnector::Or => "OR",
    };
    if !target.trim().is_empty() {
        target.push(' ');
    } else {
        target.clear();
    }
    target.push_str(word);
    target.push(' ');
    target.push_str(predicate);
    true
}

/// Render `` `col` = literal `` assignments for INSERT ... SET / UPDATE ... SET.
pub fn render_assignments(payload: &Map<String, Value>) -> String {
    payload
        .iter()
        .map(|(column, value)| format!("{} = {}", quote_ident(column), escape(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Backtick-quote a predicate or assignment column, whatever it contains.
pub fn quote_ident(column: &str) -> String {
    escape_id(column.trim())
}

/// Backtick-quote plain identifiers; expressions (`count(*)`, `t.*`,
/// already-quoted names) are passed through unchanged.
pub fn quote_column(column: &str) -> String {
    let column = column.trim();
    if PLAIN_IDENT.is_match(column) {
        escape_id(column)
    } else {
        column.to_string()
    }
}

/// Split a map key into its column and optional trailing operator.
pub fn split_key(key: &str) -> (&str, CompareOp) {
    match KEY_OPERATOR.captures(key) {
        Some(caps) => {
            let column = caps.get(1).map_or(key, |m| m.as_str());
            let op = caps
                .get(2)
                .or_else(|| caps.get(3))
                .and_then(|m| CompareOp::parse(m.as_str()))
                .unwrap_or(CompareOp::Eq);
            (column.trim(), op)
        }
        None => (key.trim(), CompareOp::Eq),
    }
}

fn render_pair(key: &str, value: &Value) -> String {
    let (column, op) = split_key(key);
    format!("{} {} {}", quote_ident(column), op, escape(value))
}
