//! MySQL literal and identifier escaping.
//!
//! Values are embedded in the generated SQL as literals (there are no
//! placeholders in the final statement), so every value that reaches a
//! fragment goes through [`escape`] first. The `*_raw` builder methods use
//! [`format`] instead, and the caller owns the safety of the template.
//!
//! ```
//! use myqb::escape::{escape, escape_id, format};
//! use serde_json::json;
//!
//! assert_eq!(escape(&json!("O'Reilly")), r"'O\'Reilly'");
//! assert_eq!(escape_id("users.id"), "`users`.`id`");
//! assert_eq!(format("?? = ?", &[json!("name"), json!("bob")]), "`name` = 'bob'");
//! ```

use serde_json::Value;

/// Escape a value into SQL literal text.
///
/// - `null` renders as `NULL`, booleans as `true`/`false`, numbers unquoted.
/// - Strings are single-quoted with MySQL backslash escapes.
/// - Arrays render as a comma separated list; nested arrays become `(a, b)` groups.
/// - Objects render as `` `key` = value `` pairs separated by `, `.
pub fn escape(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => escape_string(s),
        Value::Array(items) => array_to_list(items),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{} = {}", escape_id(k), escape(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Escape every leaf of a value while keeping its shape.
///
/// Arrays stay arrays and objects keep their key names; each scalar is
/// replaced by a string holding its escaped literal text.
pub fn escape_all(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(escape_all).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), escape_all(v)))
                .collect(),
        ),
        scalar => Value::String(escape(scalar)),
    }
}

/// Quote an identifier with backticks.
///
/// Dots separate qualified parts (`db.table` becomes `` `db`.`table` ``) and
/// embedded backticks are doubled.
pub fn escape_id(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('`');
    for c in name.chars() {
        match c {
            '`' => out.push_str("``"),
            '.' => out.push_str("`.`"),
            c => out.push(c),
        }
    }
    out.push('`');
    out
}

/// Positional placeholder substitution.
///
/// `??` takes the next value as an identifier, `?` as a literal. Runs of
/// three or more `?` are copied through unchanged. Once the values run out,
/// any remaining placeholders are left in place.
pub fn format(template: &str, values: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut values = values.iter();
    let mut exhausted = false;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '?' {
            out.push(c);
            continue;
        }
        let mut run = 1;
        while chars.peek() == Some(&'?') {
            chars.next();
            run += 1;
        }
        if run > 2 || exhausted {
            out.extend(std::iter::repeat_n('?', run));
            continue;
        }
        match values.next() {
            Some(value) if run == 2 => out.push_str(&identifier_of(value)),
            Some(value) => out.push_str(&escape(value)),
            None => {
                exhausted = true;
                out.extend(std::iter::repeat_n('?', run));
            }
        }
    }
    out
}

fn identifier_of(value: &Value) -> String {
    match value {
        Value::String(s) => escape_id(s),
        Value::Array(items) => items
            .iter()
            .map(identifier_of)
            .collect::<Vec<_>>()
            .join(", "),
        other => escape_id(&other.to_string()),
    }
}

fn array_to_list(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Array(inner) => format!("({})", array_to_list(inner)),
            other => escape(other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
