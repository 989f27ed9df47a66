//! Binding [`SqlValue`]s to sqlx queries.

use oxide_upsert_core::{SqlValue, Statement};
use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::Any;

/// Builds a query for `statement` with its parameters bound in order.
pub(crate) fn prepare(statement: &Statement) -> Query<'_, Any, AnyArguments<'_>> {
    statement
        .params
        .iter()
        .fold(sqlx::query(&statement.sql), bind_value)
}

fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: &'q SqlValue,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Blob(b) => query.bind(b.as_slice()),
    }
}
