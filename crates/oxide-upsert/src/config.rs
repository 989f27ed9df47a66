//! Strategy configuration.

use oxide_upsert_core::ValidationError;
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

use crate::batched::BatchedUpserter;
use crate::error::Result;
use crate::hash_indexed::HashIndexedUpserter;
use crate::naive::NaiveUpserter;
use crate::Upserter;

/// Default maximum rows per chunk for [`BatchedUpserter`].
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Chunking options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum rows per generated statement. Must be positive.
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl BatchConfig {
    /// Checks the options.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBatchSize`] if `batch_size` is zero.
    pub const fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }
}

/// Which upsert strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// [`NaiveUpserter`].
    Naive,
    /// [`HashIndexedUpserter`].
    HashIndexed,
    /// [`BatchedUpserter`] over [`HashIndexedUpserter`].
    #[default]
    Batched,
}

/// Strategy selection plus its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsertConfig {
    /// Strategy to build.
    pub strategy: Strategy,
    /// Chunking options, used by [`Strategy::Batched`].
    pub batch: BatchConfig,
}

impl UpsertConfig {
    /// Builds the configured strategy on `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBatchSize`] (wrapped) if the batched
    /// strategy is selected with a zero batch size.
    pub fn build(&self, pool: AnyPool) -> Result<Box<dyn Upserter>> {
        Ok(match self.strategy {
            Strategy::Naive => Box::new(NaiveUpserter::new(pool)),
            Strategy::HashIndexed => Box::new(HashIndexedUpserter::new(pool)),
            Strategy::Batched => Box::new(BatchedUpserter::from_config(
                HashIndexedUpserter::new(pool),
                &self.batch,
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UpsertConfig::default();
        assert_eq!(config.strategy, Strategy::Batched);
        assert_eq!(config.batch.batch_size, DEFAULT_BATCH_SIZE);
        assert!(config.batch.validate().is_ok());
    }

    #[test]
    fn test_deserialize() {
        let config: UpsertConfig =
            serde_json::from_str(r#"{"strategy": "hash_indexed", "batch": {"batch_size": 64}}"#)
                .unwrap();
        assert_eq!(config.strategy, Strategy::HashIndexed);
        assert_eq!(config.batch.batch_size, 64);

        let config: UpsertConfig = serde_json::from_str(r#"{"strategy": "naive"}"#).unwrap();
        assert_eq!(config.strategy, Strategy::Naive);
        assert_eq!(config.batch, BatchConfig::default());

        let config: UpsertConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, UpsertConfig::default());
    }

    #[test]
    fn test_zero_batch_size_is_invalid() {
        let batch = BatchConfig { batch_size: 0 };
        assert_eq!(batch.validate(), Err(ValidationError::InvalidBatchSize(0)));
    }
}
