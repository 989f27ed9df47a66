//! Error types for upsert strategies.

use std::fmt;

use oxide_upsert_core::ValidationError;
use thiserror::Error;

/// The statement an [`UpsertError::Execution`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStage {
    /// Opening the transaction.
    Begin,
    /// `CREATE UNIQUE INDEX IF NOT EXISTS`.
    CreateUniqueIndex,
    /// Existence probe for a row's key.
    CheckExisting,
    /// Single-row `INSERT`.
    InsertRow,
    /// Single-row `UPDATE`.
    UpdateRow,
    /// Multi-row `INSERT ... ON CONFLICT`.
    BulkUpsert,
    /// Committing the transaction.
    Commit,
}

impl fmt::Display for ExecStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Begin => "begin tx",
            Self::CreateUniqueIndex => "create unique index",
            Self::CheckExisting => "check existing row",
            Self::InsertRow => "insert row",
            Self::UpdateRow => "update row",
            Self::BulkUpsert => "exec upsert",
            Self::Commit => "commit tx",
        })
    }
}

/// Errors returned by [`Upserter::upsert`](crate::Upserter::upsert).
#[derive(Debug, Error)]
pub enum UpsertError {
    /// The inputs were rejected before touching the database.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Two rows of one bulk batch share a unique key.
    #[error("rows {first} and {second} share duplicate unique key values")]
    DuplicateKey {
        /// Index of the first row carrying the key.
        first: usize,
        /// Index of the row that repeated it.
        second: usize,
    },

    /// The database rejected a statement.
    #[error("{}{stage}: {source}", row_prefix(*.row))]
    Execution {
        /// Row being written, when the statement was row-specific.
        row: Option<usize>,
        /// Which statement failed.
        stage: ExecStage,
        /// The driver error.
        #[source]
        source: sqlx::Error,
    },
}

fn row_prefix(row: Option<usize>) -> String {
    row.map(|r| format!("row {r}: ")).unwrap_or_default()
}

impl UpsertError {
    /// Wraps a driver error from `stage`, optionally tagged with a row index.
    pub(crate) fn exec(stage: ExecStage, row: Option<usize>) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Execution { row, stage, source }
    }

    /// Returns whether the inputs failed validation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns whether the batch contained a repeated unique key.
    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// The row the error refers to, if any.
    #[must_use]
    pub const fn row(&self) -> Option<usize> {
        match self {
            Self::Validation(ValidationError::RowLengthMismatch { row, .. }) => Some(*row),
            Self::DuplicateKey { second, .. } => Some(*second),
            Self::Execution { row, .. } => *row,
            Self::Validation(_) => None,
        }
    }
}

/// Result type alias for upsert operations.
pub type Result<T> = std::result::Result<T, UpsertError>;
