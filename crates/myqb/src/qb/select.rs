//! Selection, ordering, grouping, pagination and composition.

use super::QueryBuilder;
use crate::assemble::keyword_clause;
use crate::condition::quote_column;
use crate::escape::format;
use serde_json::Value;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(quote_column)
        .collect::<Vec<_>>()
        .join(", ")
}

impl QueryBuilder {
    // ==================== Selection ====================

    /// Set the select list. An empty slice selects `*`.
    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        self.fragments.select = column_list(columns);
        self
    }

    /// Set the select list from a formatted template.
    pub fn select_raw(&mut self, template: &str, values: &[Value]) -> &mut Self {
        self.fragments.select = format(template, values);
        self
    }

    /// Append one expression to the select list.
    pub fn add_select(&mut self, column: &str) -> &mut Self {
        let column = column.trim();
        if column.is_empty() {
            return self;
        }
        let column = quote_column(column);
        let select = &mut self.fragments.select;
        if !select.trim().is_empty() {
            select.push_str(", ");
        }
        select.push_str(&column);
        self
    }

    /// `SELECT DISTINCT column`
    pub fn distinct(&mut self, column: &str) -> &mut Self {
        self.fragments.select = format!("DISTINCT {}", quote_column(column));
        self
    }

    // ==================== Ordering / grouping ====================

    /// `ORDER BY columns ASC`; with no columns, the configured default order
    /// column is used, and without one the ordering is cleared.
    pub fn order_by_asc(&mut self, columns: &[&str]) -> &mut Self {
        self.order(columns, Direction::Asc)
    }

    /// `ORDER BY columns DESC`, with the same fallback as [`order_by_asc`](Self::order_by_asc).
    pub fn order_by_desc(&mut self, columns: &[&str]) -> &mut Self {
        self.order(columns, Direction::Desc)
    }

    /// `ORDER BY <template>`
    pub fn order_by_raw(&mut self, template: &str, values: &[Value]) -> &mut Self {
        self.fragments.order = keyword_clause("ORDER BY", &format(template, values));
        self
    }

    /// `GROUP BY columns`; an empty slice is a no-op.
    pub fn group_by(&mut self, columns: &[&str]) -> &mut Self {
        let list = column_list(columns);
        if !list.is_empty() {
            self.fragments.group = format!("GROUP BY {list}");
        }
        self
    }

    /// `GROUP BY <template>`
    pub fn group_by_raw(&mut self, template: &str, values: &[Value]) -> &mut Self {
        self.fragments.group = keyword_clause("GROUP BY", &format(template, values));
        self
    }

    /// Order ascending and keep one row.
    pub fn oldest(&mut self, columns: &[&str]) -> &mut Self {
        self.order_by_asc(columns).limit(1)
    }

    /// Order descending and keep one row.
    pub fn latest(&mut self, columns: &[&str]) -> &mut Self {
        self.order_by_desc(columns).limit(1)
    }

    fn order(&mut self, columns: &[&str], direction: Direction) -> &mut Self {
        let mut list = column_list(columns);
        if list.is_empty() {
            if let Some(default) = self.defaults.order_column.as_deref() {
                list = column_list(&[default]);
            }
        }
        self.fragments.order = if list.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {list} {}", direction.as_str())
        };
        self
    }

    // ==================== Pagination ====================

    pub fn limit(&mut self, count: u64) -> &mut Self {
        self.fragments.limit = format!("LIMIT {count}");
        self
    }

    pub fn offset(&mut self, count: u64) -> &mut Self {
        self.fragments.offset = format!("OFFSET {count}");
        self
    }

    /// Alias of [`limit`](Self::limit).
    pub fn take(&mut self, count: u64) -> &mut Self {
        self.limit(count)
    }

    /// Alias of [`offset`](Self::offset).
    pub fn skip(&mut self, count: u64) -> &mut Self {
        self.offset(count)
    }

    // ==================== Composition ====================

    /// Replace the whole statement with a formatted template.
    ///
    /// While set, every other fragment is ignored until the next [`table`](Self::table).
    pub fn raw(&mut self, template: &str, values: &[Value]) -> &mut Self {
        self.fragments.raw = format(template, values);
        self
    }

    /// `UNION <other statement>`
    pub fn union(&mut self, other: &QueryBuilder) -> &mut Self {
        self.union_sql(&other.to_sql())
    }

    /// `UNION <sql>`
    pub fn union_sql(&mut self, sql: &str) -> &mut Self {
        self.fragments.union = keyword_clause("UNION", sql);
        self
    }
}
