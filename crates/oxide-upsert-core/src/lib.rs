//! # oxide-upsert-core
//!
//! Driver-independent building blocks for idempotent batch upserts.
//!
//! This crate provides:
//! - Identifier validation and quoting, the only path by which table, column
//!   and index names reach generated SQL
//! - Deterministic unique-index naming from a table and its key columns
//! - Structural validation of a batch (columns, unique keys, row shapes) and
//!   in-batch duplicate key detection
//! - SQL generation for row-by-row and bulk `ON CONFLICT` upserts
//!
//! Values never appear in SQL text. Every statement is returned together with
//! its positional parameters, to be bound by the database driver.
//!
//! ## Example
//!
//! ```rust
//! use oxide_upsert_core::{ToSqlValue, UpsertPlan};
//!
//! let plan = UpsertPlan::new("users", &["id", "name"], &["id"]).unwrap();
//! let rows = vec![
//!     vec![1_i64.to_sql_value(), "Alice".to_sql_value()],
//!     vec![2_i64.to_sql_value(), "Bob".to_sql_value()],
//! ];
//!
//! let statement = plan.bulk_upsert(&rows);
//! assert_eq!(
//!     statement.sql,
//!     "INSERT INTO \"users\" (\"id\", \"name\") VALUES ($1, $2), ($3, $4) \
//!      ON CONFLICT (\"id\") DO UPDATE SET \"name\" = EXCLUDED.\"name\""
//! );
//! assert_eq!(statement.params.len(), 4);
//! ```
//!
//! ## Injection safety
//!
//! ```rust
//! use oxide_upsert_core::{quote_identifier, UpsertPlan};
//!
//! assert_eq!(quote_identifier("users").unwrap(), "\"users\"");
//! assert!(quote_identifier("users\"; DROP TABLE users; --").is_err());
//! assert!(UpsertPlan::new("users", &["id", "na me"], &["id"]).is_err());
//! ```

mod error;
pub mod ident;
pub mod plan;
pub mod statement;
pub mod value;

pub use error::{Result, ValidationError};
pub use ident::{derive_index_name, is_safe_identifier, quote_identifier};
pub use plan::UpsertPlan;
pub use statement::Statement;
pub use value::{Row, SqlValue, ToSqlValue};
