//! # oxide-upsert
//!
//! Interchangeable strategies for idempotently writing a batch of rows into a
//! table: rows whose unique key is new are inserted, rows whose key already
//! exists are updated.
//!
//! Every strategy implements [`Upserter`], so callers can hold a
//! `Box<dyn Upserter>` and swap strategies without code changes:
//!
//! - [`NaiveUpserter`] probes each row's key and issues an `UPDATE` or
//!   `INSERT`, all inside one transaction. Needs no schema change. Duplicate
//!   keys within a batch are applied in order, the last row winning.
//! - [`HashIndexedUpserter`] ensures a unique index over the key columns and
//!   writes the whole batch with one `INSERT ... ON CONFLICT DO UPDATE`.
//!   Duplicate keys within a batch are rejected.
//! - [`BatchedUpserter`] splits large batches into fixed-size chunks and hands
//!   each one to an inner strategy (by default [`HashIndexedUpserter`]).
//!   Chunks already written stay written if a later chunk fails.
//!
//! All strategies run on an [`sqlx::AnyPool`]. Call
//! [`sqlx::any::install_default_drivers`] once before connecting it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oxide_upsert::{BatchedUpserter, ToSqlValue, Upserter};
//!
//! sqlx::any::install_default_drivers();
//! let pool = sqlx::AnyPool::connect("postgres://localhost/app").await?;
//!
//! let upserter: Box<dyn Upserter> = Box::new(BatchedUpserter::new(pool).with_batch_size(1000));
//! let rows = vec![
//!     vec![1_i64.to_sql_value(), "Alice".to_sql_value()],
//!     vec![2_i64.to_sql_value(), "Bob".to_sql_value()],
//! ];
//! upserter.upsert("users", &["id", "name"], &rows, &["id"]).await?;
//! ```
//!
//! ## Choosing a strategy from configuration
//!
//! ```rust,ignore
//! use oxide_upsert::UpsertConfig;
//!
//! let config: UpsertConfig =
//!     serde_json::from_str(r#"{"strategy": "batched", "batch": {"batch_size": 250}}"#)?;
//! let upserter = config.build(pool)?;
//! ```

mod batched;
mod bind;
mod config;
mod error;
mod hash_indexed;
mod naive;

use std::sync::Arc;

use async_trait::async_trait;

pub use batched::BatchedUpserter;
pub use config::{BatchConfig, Strategy, UpsertConfig, DEFAULT_BATCH_SIZE};
pub use error::{ExecStage, Result, UpsertError};
pub use hash_indexed::HashIndexedUpserter;
pub use naive::NaiveUpserter;

// Re-export the value model so callers need a single dependency.
pub use oxide_upsert_core::{Row, SqlValue, ToSqlValue, ValidationError};

/// Writes a batch of rows, inserting new keys and updating existing ones.
#[async_trait]
pub trait Upserter: Send + Sync {
    /// Upserts `rows` into `table`.
    ///
    /// Each row holds one value per entry of `columns`, in the same order.
    /// `unique_keys` is the non-empty subset of `columns` that identifies a
    /// row. An empty batch succeeds without touching the database.
    ///
    /// Dropping the returned future aborts the in-flight statement.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError::Validation`] for malformed inputs,
    /// [`UpsertError::DuplicateKey`] when a strategy cannot resolve repeated
    /// keys within one batch, and [`UpsertError::Execution`] when the
    /// database rejects a statement.
    async fn upsert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
        unique_keys: &[&str],
    ) -> Result<()>;
}

#[async_trait]
impl<U: Upserter + ?Sized> Upserter for Arc<U> {
    async fn upsert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
        unique_keys: &[&str],
    ) -> Result<()> {
        (**self).upsert(table, columns, rows, unique_keys).await
    }
}

#[async_trait]
impl<U: Upserter + ?Sized> Upserter for Box<U> {
    async fn upsert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
        unique_keys: &[&str],
    ) -> Result<()> {
        (**self).upsert(table, columns, rows, unique_keys).await
    }
}
