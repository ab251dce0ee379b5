//! Per-session clause storage.
//!
//! A [`Fragments`] value holds one string per SQL clause. Clause builders
//! write into it, the assembler reads from it. `QueryBuilder::table` is the
//! only place a store is reset.

/// The statement shape a store renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementMode {
    /// A raw override replaces every other fragment.
    Raw,
    Insert,
    Update,
    Delete,
    Select,
}

/// Fragment slots that accept boolean-joined predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Where,
    Having,
    Join,
}

/// Clause text for one query session.
///
/// Keyword-prefixed slots (`order`, `group`, `limit`, `offset`, `union`,
/// `join`) hold their keyword already. `select`, `where_clause`, `having`,
/// `insert` and `update` hold bare bodies; the assembler adds the keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    pub table: String,
    pub select: String,
    pub join: String,
    pub where_clause: String,
    pub group: String,
    pub having: String,
    pub order: String,
    pub limit: String,
    pub offset: String,
    pub insert: String,
    pub update: String,
    pub delete: bool,
    pub union: String,
    pub raw: String,
}

impl Fragments {
    /// A fresh store targeting `table`.
    pub fn for_table(table: &str) -> Self {
        Self {
            table: table.trim().to_string(),
            ..Self::default()
        }
    }

    /// Which statement this store renders, first match wins.
    pub fn mode(&self) -> StatementMode {
        if !self.raw.trim().is_empty() {
            StatementMode::Raw
        } else if !self.insert.trim().is_empty() {
            StatementMode::Insert
        } else if !self.update.trim().is_empty() {
            StatementMode::Update
        } else if self.delete {
            StatementMode::Delete
        } else {
            StatementMode::Select
        }
    }

    pub fn slot(&self, slot: Slot) -> &str {
        match slot {
            Slot::Where => &self.where_clause,
            Slot::Having => &self.having,
            Slot::Join => &self.join,
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut String {
        match slot {
            Slot::Where => &mut self.where_clause,
            Slot::Having => &mut self.having,
            Slot::Join => &mut self.join,
        }
    }

    /// The select list split into trimmed column expressions.
    pub fn select_columns(&self) -> Vec<String> {
        self.select
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}
