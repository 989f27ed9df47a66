//! Bulk upsert backed by a unique index.

use async_trait::async_trait;
use oxide_upsert_core::statement::HASH_INDEX_SUFFIX;
use oxide_upsert_core::{Row, UpsertPlan};
use sqlx::AnyPool;
use tracing::{debug, info};

use crate::bind::prepare;
use crate::error::{ExecStage, Result, UpsertError};
use crate::Upserter;

/// Writes a whole batch with one `INSERT ... ON CONFLICT` statement.
///
/// `ON CONFLICT` needs a uniqueness guarantee over the key columns, so each
/// call first runs `CREATE UNIQUE INDEX IF NOT EXISTS` with a name derived
/// from the table and keys. After the first call for a table/key set this is
/// a no-op on the database side.
///
/// A single statement cannot update the same key twice, so batches with
/// repeated keys are rejected with [`UpsertError::DuplicateKey`] before any
/// statement runs.
#[derive(Debug, Clone)]
pub struct HashIndexedUpserter {
    pool: AnyPool,
}

impl HashIndexedUpserter {
    /// Creates a bulk upserter on `pool`.
    #[must_use]
    pub const fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    async fn ensure_unique_index(&self, plan: &UpsertPlan) -> Result<()> {
        let statement = plan.create_unique_index(HASH_INDEX_SUFFIX)?;
        debug!(sql = %statement.sql, "Ensuring unique index");
        prepare(&statement)
            .execute(&self.pool)
            .await
            .map_err(UpsertError::exec(ExecStage::CreateUniqueIndex, None))?;
        Ok(())
    }
}

#[async_trait]
impl Upserter for HashIndexedUpserter {
    async fn upsert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
        unique_keys: &[&str],
    ) -> Result<()> {
        let plan = UpsertPlan::new(table, columns, unique_keys)?;
        plan.check_rows(rows)?;
        if rows.is_empty() {
            return Ok(());
        }
        if let Some((first, second)) = plan.find_duplicate(rows) {
            return Err(UpsertError::DuplicateKey { first, second });
        }

        self.ensure_unique_index(&plan).await?;

        let statement = plan.bulk_upsert(rows);
        debug!(
            sql = %statement.sql,
            params = statement.params.len(),
            "Executing bulk upsert"
        );
        let result = prepare(&statement)
            .execute(&self.pool)
            .await
            .map_err(UpsertError::exec(ExecStage::BulkUpsert, None))?;

        info!(
            table = %plan.table(),
            rows = rows.len(),
            affected = result.rows_affected(),
            "Bulk upsert applied"
        );
        Ok(())
    }
}
