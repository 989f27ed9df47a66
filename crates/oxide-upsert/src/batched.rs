//! Chunked upsert.

use async_trait::async_trait;
use oxide_upsert_core::{Row, UpsertPlan, ValidationError};
use sqlx::AnyPool;
use tracing::debug;

use crate::config::{BatchConfig, DEFAULT_BATCH_SIZE};
use crate::error::Result;
use crate::hash_indexed::HashIndexedUpserter;
use crate::Upserter;

/// Splits a batch into chunks of at most `batch_size` rows and upserts each
/// chunk, in order, with an inner strategy.
///
/// This bounds statement size and parameter count for the bulk strategy.
/// Chunks are independent: if one fails, the chunks before it stay written,
/// the rest are not attempted, and the chunk's error is returned as-is (row
/// indices in it are relative to the chunk).
#[derive(Debug, Clone)]
pub struct BatchedUpserter<U = HashIndexedUpserter> {
    inner: U,
    batch_size: usize,
}

impl BatchedUpserter {
    /// Creates a chunked bulk upserter on `pool` with the default batch size.
    #[must_use]
    pub const fn new(pool: AnyPool) -> Self {
        Self::with_inner(HashIndexedUpserter::new(pool))
    }
}

impl<U> BatchedUpserter<U> {
    /// Wraps `inner`, which receives one call per chunk.
    #[must_use]
    pub const fn with_inner(inner: U) -> Self {
        Self {
            inner,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Returns a copy using `batch_size` rows per chunk.
    ///
    /// A size of zero is reported by [`Upserter::upsert`].
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Wraps `inner` with the chunk size from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBatchSize`] if the configured size is
    /// zero.
    pub fn from_config(
        inner: U,
        config: &BatchConfig,
    ) -> std::result::Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self::with_inner(inner).with_batch_size(config.batch_size))
    }

    /// Rows per chunk.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The strategy each chunk is delegated to.
    #[must_use]
    pub const fn inner(&self) -> &U {
        &self.inner
    }
}

#[async_trait]
impl<U: Upserter> Upserter for BatchedUpserter<U> {
    async fn upsert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
        unique_keys: &[&str],
    ) -> Result<()> {
        let plan = UpsertPlan::new(table, columns, unique_keys)?;
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize(self.batch_size).into());
        }
        plan.check_rows(rows)?;
        if rows.is_empty() {
            return Ok(());
        }

        for (n, chunk) in rows.chunks(self.batch_size).enumerate() {
            debug!(
                table = %plan.table(),
                chunk = n,
                offset = n * self.batch_size,
                rows = chunk.len(),
                "Upserting chunk"
            );
            self.inner.upsert(table, columns, chunk, unique_keys).await?;
        }
        Ok(())
    }
}
