use thiserror::Error;

use crate::shared::StoreError;

#[derive(Debug, Clone, Error)]
pub enum RewardError {
    #[error("Failed to load player context: {0}")]
    Context(StoreError),

    #[error("Failed to credit rewards: {0}")]
    Ledger(StoreError),

    #[error("Achievement evaluation failed: {0}")]
    Achievement(StoreError),
}
