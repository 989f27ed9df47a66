//! Validation errors.

use thiserror::Error;

/// Structural problems detected before any statement is built or executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The column list is empty.
    #[error("at least one column is required")]
    EmptyColumns,

    /// The unique key list is empty.
    #[error("at least one unique key is required")]
    EmptyUniqueKeys,

    /// A name failed identifier validation.
    #[error("{context}: invalid identifier {name:?}")]
    InvalidIdentifier {
        /// Where the name was used (e.g. `table`, `column[2]`).
        context: String,
        /// The rejected name.
        name: String,
    },

    /// A column is listed more than once.
    #[error("column {0:?} listed more than once")]
    DuplicateColumn(String),

    /// A unique key does not name one of the columns.
    #[error("unique key {0:?} not found in columns")]
    UnknownUniqueKey(String),

    /// A row does not have one value per column.
    #[error("row {row}: columns ({expected}) and values ({actual}) length mismatch")]
    RowLengthMismatch {
        /// Index of the offending row in the batch.
        row: usize,
        /// Number of columns.
        expected: usize,
        /// Number of values in the row.
        actual: usize,
    },

    /// The configured batch size is zero.
    #[error("batch size must be positive, got {0}")]
    InvalidBatchSize(usize),
}

/// Result type alias for validation.
pub type Result<T> = std::result::Result<T, ValidationError>;
