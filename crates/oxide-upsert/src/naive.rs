//! Row-by-row upsert inside a single transaction.

use async_trait::async_trait;
use oxide_upsert_core::{Row, UpsertPlan};
use sqlx::{AnyConnection, AnyPool};
use tracing::{debug, info, warn};

use crate::bind::prepare;
use crate::error::{ExecStage, Result, UpsertError};
use crate::Upserter;

/// Probes each row's key and issues an `UPDATE` or an `INSERT`.
///
/// All rows are written in one transaction, committed only if every row
/// succeeds. Rows sharing a key are applied in batch order, so the last one
/// wins.
///
/// The probe and the write are separate statements. A concurrent writer can
/// insert the same key in between, in which case the `INSERT` fails with the
/// database's uniqueness error and the call is rolled back. It is not retried.
#[derive(Debug, Clone)]
pub struct NaiveUpserter {
    pool: AnyPool,
}

#[derive(Debug, Default)]
struct Outcome {
    inserted: usize,
    updated: usize,
}

impl NaiveUpserter {
    /// Creates a row-by-row upserter on `pool`.
    #[must_use]
    pub const fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    async fn apply_rows(
        conn: &mut AnyConnection,
        plan: &UpsertPlan,
        rows: &[Row],
    ) -> Result<Outcome> {
        let mut outcome = Outcome::default();

        for (idx, row) in rows.iter().enumerate() {
            let probe = plan.exists_probe(row);
            debug!(sql = %probe.sql, row = idx, "Checking existing row");
            let existing = prepare(&probe)
                .fetch_optional(&mut *conn)
                .await
                .map_err(UpsertError::exec(ExecStage::CheckExisting, Some(idx)))?;

            let (statement, stage) = if existing.is_some() {
                outcome.updated += 1;
                (plan.update_row(row), ExecStage::UpdateRow)
            } else {
                outcome.inserted += 1;
                (plan.insert_row(row), ExecStage::InsertRow)
            };

            debug!(sql = %statement.sql, row = idx, "Executing SQL");
            prepare(&statement)
                .execute(&mut *conn)
                .await
                .map_err(UpsertError::exec(stage, Some(idx)))?;
        }

        Ok(outcome)
    }
}

#[async_trait]
impl Upserter for NaiveUpserter {
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

        // Dropping `tx` on any early return rolls it back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(UpsertError::exec(ExecStage::Begin, None))?;

        match Self::apply_rows(&mut tx, &plan, rows).await {
            Ok(outcome) => {
                tx.commit()
                    .await
                    .map_err(UpsertError::exec(ExecStage::Commit, None))?;
                info!(
                    table = %plan.table(),
                    rows = rows.len(),
                    inserted = outcome.inserted,
                    updated = outcome.updated,
                    "Naive upsert committed"
                );
                Ok(())
            }
            Err(err) => {
                warn!(table = %plan.table(), error = %err, "Rolling back naive upsert");
                if let Err(rollback) = tx.rollback().await {
                    warn!(table = %plan.table(), error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}
