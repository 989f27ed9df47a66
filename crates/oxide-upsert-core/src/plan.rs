//! Batch validation.
//!
//! An [`UpsertPlan`] is built once per upsert call from the table name, the
//! column list and the unique key columns. Building it performs every
//! structural check that does not depend on the rows; the rows themselves are
//! checked with [`UpsertPlan::check_rows`].

use std::collections::HashMap;

use crate::error::{Result, ValidationError};
use crate::ident::quote_in;
use crate::value::SqlValue;

/// Separator between key values in a composite key.
pub const COMPOSITE_KEY_SEPARATOR: char = '|';

/// A validated table/columns/unique-key triple with pre-quoted identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertPlan {
    table: String,
    quoted_table: String,
    columns: Vec<String>,
    quoted_columns: Vec<String>,
    unique_keys: Vec<String>,
    quoted_keys: Vec<String>,
    key_positions: Vec<usize>,
}

impl UpsertPlan {
    /// Validates the inputs of an upsert call.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the column or unique key list is
    /// empty, if any name is not a safe identifier, if a column is listed
    /// twice, or if a unique key is not one of the columns.
    pub fn new<C, K>(table: &str, columns: &[C], unique_keys: &[K]) -> Result<Self>
    where
        C: AsRef<str>,
        K: AsRef<str>,
    {
        if columns.is_empty() {
            return Err(ValidationError::EmptyColumns);
        }
        if unique_keys.is_empty() {
            return Err(ValidationError::EmptyUniqueKeys);
        }

        let quoted_table = quote_in("table", table)?;

        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(columns.len());
        let mut quoted_columns = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let column = column.as_ref();
            quoted_columns.push(quote_in(format!("column[{i}]"), column)?);
            if positions.insert(column, i).is_some() {
                return Err(ValidationError::DuplicateColumn(column.to_string()));
            }
        }

        let mut key_positions = Vec::with_capacity(unique_keys.len());
        let mut quoted_keys = Vec::with_capacity(unique_keys.len());
        for key in unique_keys {
            let key = key.as_ref();
            let Some(&position) = positions.get(key) else {
                return Err(ValidationError::UnknownUniqueKey(key.to_string()));
            };
            key_positions.push(position);
            quoted_keys.push(quote_in(format!("unique key {key:?}"), key)?);
        }

        Ok(Self {
            table: table.to_string(),
            quoted_table,
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            quoted_columns,
            unique_keys: unique_keys.iter().map(|k| k.as_ref().to_string()).collect(),
            quoted_keys,
            key_positions,
        })
    }

    /// Raw table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Quoted table name.
    #[must_use]
    pub fn quoted_table(&self) -> &str {
        &self.quoted_table
    }

    /// Raw column names, in row order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Quoted column names, in row order.
    #[must_use]
    pub fn quoted_columns(&self) -> &[String] {
        &self.quoted_columns
    }

    /// Raw unique key names, in caller order.
    #[must_use]
    pub fn unique_keys(&self) -> &[String] {
        &self.unique_keys
    }

    /// Quoted unique key names, in caller order.
    #[must_use]
    pub fn quoted_keys(&self) -> &[String] {
        &self.quoted_keys
    }

    /// Returns whether the column at `position` is part of the unique key.
    #[must_use]
    pub fn is_key_column(&self, position: usize) -> bool {
        self.key_positions.contains(&position)
    }

    /// Checks that every row has exactly one value per column.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RowLengthMismatch`] for the first row of the
    /// wrong length.
    pub fn check_rows<R: AsRef<[SqlValue]>>(&self, rows: &[R]) -> Result<()> {
        let expected = self.columns.len();
        for (row, values) in rows.iter().enumerate() {
            let actual = values.as_ref().len();
            if actual != expected {
                return Err(ValidationError::RowLengthMismatch {
                    row,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// The row's unique key values, in unique key order.
    ///
    /// The row must have passed [`check_rows`](Self::check_rows).
    #[must_use]
    pub fn key_values(&self, row: &[SqlValue]) -> Vec<SqlValue> {
        self.key_positions.iter().map(|&i| row[i].clone()).collect()
    }

    /// Joins the row's stringified unique key values with `|`.
    #[must_use]
    pub fn composite_key(&self, row: &[SqlValue]) -> String {
        let mut key = String::new();
        for (n, &i) in self.key_positions.iter().enumerate() {
            if n > 0 {
                key.push(COMPOSITE_KEY_SEPARATOR);
            }
            key.push_str(&row[i].to_string());
        }
        key
    }

    /// Finds the first pair of rows sharing a composite key.
    ///
    /// Returns the index of the earlier row and of the row that collided with
    /// it.
    #[must_use]
    pub fn find_duplicate<R: AsRef<[SqlValue]>>(&self, rows: &[R]) -> Option<(usize, usize)> {
        let mut seen: HashMap<String, usize> = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let key = self.composite_key(row.as_ref());
            if let Some(&first) = seen.get(&key) {
                return Some((first, idx));
            }
            seen.insert(key, idx);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ToSqlValue;

    fn users_plan() -> UpsertPlan {
        UpsertPlan::new("users", &["id", "name", "email"], &["id"]).unwrap()
    }

    #[test]
    fn test_plan_quotes_identifiers() {
        let plan = UpsertPlan::new("users", &["tenant", "id", "name"], &["id", "tenant"]).unwrap();
        assert_eq!(plan.table(), "users");
        assert_eq!(plan.quoted_table(), "\"users\"");
        assert_eq!(plan.quoted_columns(), ["\"tenant\"", "\"id\"", "\"name\""]);
        assert_eq!(plan.quoted_keys(), ["\"id\"", "\"tenant\""]);
        assert!(plan.is_key_column(0));
        assert!(plan.is_key_column(1));
        assert!(!plan.is_key_column(2));
    }

    #[test]
    fn test_plan_rejects_empty_lists() {
        let none: [&str; 0] = [];
        assert_eq!(
            UpsertPlan::new("users", &none, &["id"]),
            Err(ValidationError::EmptyColumns)
        );
        assert_eq!(
            UpsertPlan::new("users", &["id"], &none),
            Err(ValidationError::EmptyUniqueKeys)
        );
    }

    #[test]
    fn test_plan_rejects_bad_identifiers() {
        assert_eq!(
            UpsertPlan::new("bad table", &["id"], &["id"]),
            Err(ValidationError::InvalidIdentifier {
                context: "table".into(),
                name: "bad table".into(),
            })
        );
        assert_eq!(
            UpsertPlan::new("users", &["id", "na-me"], &["id"]),
            Err(ValidationError::InvalidIdentifier {
                context: "column[1]".into(),
                name: "na-me".into(),
            })
        );
    }

    #[test]
    fn test_plan_rejects_unknown_key() {
        assert_eq!(
            UpsertPlan::new("users", &["id", "name"], &["email"]),
            Err(ValidationError::UnknownUniqueKey("email".into()))
        );
    }

    #[test]
    fn test_plan_rejects_duplicate_column() {
        assert_eq!(
            UpsertPlan::new("users", &["id", "name", "id"], &["id"]),
            Err(ValidationError::DuplicateColumn("id".into()))
        );
    }

    #[test]
    fn test_check_rows() {
        let plan = users_plan();
        let good = vec![vec![1_i64.to_sql_value(), "a".to_sql_value(), "a@x".to_sql_value()]];
        assert!(plan.check_rows(&good).is_ok());

        let bad = vec![
            vec![1_i64.to_sql_value(), "a".to_sql_value(), "a@x".to_sql_value()],
            vec![2_i64.to_sql_value(), "b".to_sql_value()],
        ];
        let err = plan.check_rows(&bad).unwrap_err();
        assert_eq!(
            err,
            ValidationError::RowLengthMismatch {
                row: 1,
                expected: 3,
                actual: 2,
            }
        );
        assert_eq!(
            err.to_string(),
            "row 1: columns (3) and values (2) length mismatch"
        );
    }

    #[test]
    fn test_composite_key_follows_key_order() {
        let plan = UpsertPlan::new("t", &["a", "b", "c"], &["c", "a"]).unwrap();
        let row = vec![1_i64.to_sql_value(), "x".to_sql_value(), "z".to_sql_value()];
        assert_eq!(plan.composite_key(&row), "z|1");
        assert_eq!(plan.key_values(&row), vec![SqlValue::Text("z".into()), SqlValue::Int(1)]);
    }

    #[test]
    fn test_find_duplicate() {
        let plan = users_plan();
        let rows = vec![
            vec![1_i64.to_sql_value(), "John".to_sql_value(), "j@x".to_sql_value()],
            vec![2_i64.to_sql_value(), "Jane".to_sql_value(), "ja@x".to_sql_value()],
            vec![1_i64.to_sql_value(), "Jim".to_sql_value(), "ji@x".to_sql_value()],
        ];
        assert_eq!(plan.find_duplicate(&rows), Some((0, 2)));
        assert_eq!(plan.find_duplicate(&rows[..2]), None);
    }

    #[test]
    fn test_find_duplicate_composite() {
        let plan = UpsertPlan::new("t", &["a", "b"], &["a", "b"]).unwrap();
        let rows = vec![
            vec![1_i64.to_sql_value(), 1_i64.to_sql_value()],
            vec![1_i64.to_sql_value(), 2_i64.to_sql_value()],
            vec![2_i64.to_sql_value(), 1_i64.to_sql_value()],
        ];
        assert_eq!(plan.find_duplicate(&rows), None);
    }
}
