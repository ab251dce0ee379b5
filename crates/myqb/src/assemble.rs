//! Statement assembly from a populated [`Fragments`] store.
//!
//! Clause order is fixed per statement shape and does not depend on the
//! order in which the builder methods were called:
//!
//! - raw:    the override text, verbatim
//! - insert: `INSERT INTO t SET ...`
//! - update: `UPDATE t <join> SET ... <where>`
//! - delete: `DELETE FROM t <join> <where>`
//! - select: `SELECT <list|*> FROM t <join> <where> <order> <group> <limit> <offset> <having> <union>`
//!
//! Empty fragments render as nothing; the final text has blank runs
//! collapsed and is trimmed.

use crate::fragment::{Fragments, StatementMode};

/// Render the statement described by `fragments`.
pub fn assemble(fragments: &Fragments) -> String {
    let f = fragments;
    let where_clause = keyword_clause("WHERE", &f.where_clause);
    let table = f.table.trim();

    let sql = match f.mode() {
        StatementMode::Raw => return f.raw.trim().to_string(),
        StatementMode::Insert => format!("INSERT INTO {table} SET {}", f.insert),
        StatementMode::Update => format!(
            "UPDATE {table} {} SET {} {where_clause}",
            f.join, f.update
        ),
        StatementMode::Delete => format!(
            "DELETE {} {} {where_clause}",
            keyword_clause("FROM", table),
            f.join
        ),
        StatementMode::Select => {
            let select = match keyword_clause("SELECT", &f.select) {
                s if s.is_empty() => "SELECT *".to_string(),
                s => s,
            };
            let from = keyword_clause("FROM", table);
            let having = keyword_clause("HAVING", &f.having);
            let parts: [&str; 10] = [
                &select,
                &from,
                &f.join,
                &where_clause,
                &f.order,
                &f.group,
                &f.limit,
                &f.offset,
                &having,
                &f.union,
            ];
            parts.join(" ")
        }
    };
    normalize_whitespace(&sql)
}

/// Prefix `body` with exactly one `keyword`.
///
/// Leading copies of the keyword already present in `body` are dropped
/// first, so the result is the same whether the text was accumulated with
/// or without its keyword. An empty body renders as an empty string.
pub fn keyword_clause(keyword: &str, body: &str) -> String {
    let rest = strip_leading_keyword(keyword, body);
    if rest.is_empty() {
        String::new()
    } else {
        format!("{keyword} {rest}")
    }
}

/// `body` trimmed, without any leading copies of `keyword`.
pub fn strip_leading_keyword<'a>(keyword: &str, body: &'a str) -> &'a str {
    let mut rest = body.trim();
    while let Some(stripped) = strip_keyword(rest, keyword) {
        rest = stripped.trim_start();
    }
    rest
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let tail = &text[keyword.len()..];
    match tail.chars().next() {
        None => Some(tail),
        Some(c) if c.is_whitespace() || c == '(' => Some(tail),
        Some(_) => None,
    }
}

/// Collapse runs of whitespace into single spaces and trim.
///
/// Text inside quoted literals and quoted identifiers (`'..'`, `".."`,
/// `` `..` ``) is copied unchanged.
pub fn normalize_whitespace(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;
    let mut chars = sql.chars();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' && q != '`' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if matches!(c, '\'' | '"' | '`') {
            quote = Some(c);
        }
        out.push(c);
    }
    out
}
