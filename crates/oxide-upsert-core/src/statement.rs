//! SQL generation.
//!
//! Statements use numbered `$N` placeholders, which PostgreSQL and SQLite
//! both accept. Parameters are returned alongside the SQL in placeholder
//! order.

use crate::error::Result;
use crate::ident::{derive_index_name, quote_in};
use crate::plan::UpsertPlan;
use crate::value::SqlValue;

/// Suffix mixed into the name of the unique index backing bulk upserts.
pub const HASH_INDEX_SUFFIX: &str = "hash_idx";

/// A SQL statement with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `$1..$n` placeholders.
    pub sql: String,
    /// Values bound to the placeholders, in order.
    pub params: Vec<SqlValue>,
}

impl Statement {
    fn new(sql: String, params: Vec<SqlValue>) -> Self {
        Self { sql, params }
    }
}

/// Hands out `$1`, `$2`, ... in order.
struct Placeholders(usize);

impl Placeholders {
    const fn new() -> Self {
        Self(0)
    }

    fn fresh(&mut self) -> String {
        self.0 += 1;
        format!("${}", self.0)
    }
}

impl UpsertPlan {
    /// `CREATE UNIQUE INDEX IF NOT EXISTS` over the unique key columns.
    ///
    /// The index name is derived from the table, the keys and `suffix`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the derived name fails identifier validation,
    /// which a derived name never does.
    pub fn create_unique_index(&self, suffix: &str) -> Result<Statement> {
        let name = derive_index_name(self.table(), self.unique_keys(), suffix);
        let index = quote_in("index name", &name)?;
        let sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {index} ON {} ({})",
            self.quoted_table(),
            self.quoted_keys().join(", ")
        );
        Ok(Statement::new(sql, Vec::new()))
    }

    /// Multi-row `INSERT ... ON CONFLICT` covering every row.
    ///
    /// Non-key columns are overwritten from `EXCLUDED`; when every column is
    /// part of the key the conflict action is `DO NOTHING`. Rows must have
    /// passed [`check_rows`](Self::check_rows).
    #[must_use]
    pub fn bulk_upsert<R: AsRef<[SqlValue]>>(&self, rows: &[R]) -> Statement {
        let width = self.columns().len();
        let mut placeholders = Placeholders::new();
        let mut params = Vec::with_capacity(rows.len() * width);
        let mut groups = Vec::with_capacity(rows.len());
        for row in rows {
            let row = row.as_ref();
            let group: Vec<String> = (0..width).map(|_| placeholders.fresh()).collect();
            groups.push(format!("({})", group.join(", ")));
            params.extend_from_slice(&row[..width]);
        }

        let updates: Vec<String> = self
            .quoted_columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_key_column(*i))
            .map(|(_, col)| format!("{col} = EXCLUDED.{col}"))
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {} ON CONFLICT ({})",
            self.quoted_table(),
            self.quoted_columns().join(", "),
            groups.join(", "),
            self.quoted_keys().join(", ")
        );
        if updates.is_empty() {
            sql.push_str(" DO NOTHING");
        } else {
            sql.push_str(" DO UPDATE SET ");
            sql.push_str(&updates.join(", "));
        }

        Statement::new(sql, params)
    }

    /// `SELECT 1 ... LIMIT 1` probe for a row with the same unique key.
    #[must_use]
    pub fn exists_probe(&self, row: &[SqlValue]) -> Statement {
        let mut placeholders = Placeholders::new();
        let predicate = self.key_predicate(&mut placeholders);
        let sql = format!(
            "SELECT 1 FROM {} WHERE {predicate} LIMIT 1",
            self.quoted_table()
        );
        Statement::new(sql, self.key_values(row))
    }

    /// Single-row `INSERT` of every column.
    #[must_use]
    pub fn insert_row(&self, row: &[SqlValue]) -> Statement {
        let mut placeholders = Placeholders::new();
        let values: Vec<String> = self
            .columns()
            .iter()
            .map(|_| placeholders.fresh())
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quoted_table(),
            self.quoted_columns().join(", "),
            values.join(", ")
        );
        Statement::new(sql, row.to_vec())
    }

    /// `UPDATE` setting every column, key columns included, filtered by the
    /// row's unique key.
    #[must_use]
    pub fn update_row(&self, row: &[SqlValue]) -> Statement {
        let mut placeholders = Placeholders::new();
        let assignments: Vec<String> = self
            .quoted_columns()
            .iter()
            .map(|col| format!("{col} = {}", placeholders.fresh()))
            .collect();
        let predicate = self.key_predicate(&mut placeholders);

        let mut params = row.to_vec();
        params.extend(self.key_values(row));

        let sql = format!(
            "UPDATE {} SET {} WHERE {predicate}",
            self.quoted_table(),
            assignments.join(", ")
        );
        Statement::new(sql, params)
    }

    fn key_predicate(&self, placeholders: &mut Placeholders) -> String {
        self.quoted_keys()
            .iter()
            .map(|key| format!("{key} = {}", placeholders.fresh()))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}
