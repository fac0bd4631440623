use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use arcade::game::GameOutcome;
use arcade::rewards::{AchievementEvaluator, LedgerSink, RewardCredit};
use arcade::StoreError;

// ============================================================================
// Mock Collaborators
// ============================================================================

/// Ledger that records every credit, optionally failing instead
#[derive(Clone, Default)]
pub struct MockLedger {
    credits: Arc<RwLock<Vec<(String, RewardCredit)>>>,
    failing: bool,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub async fn credits(&self) -> Vec<(String, RewardCredit)> {
        self.credits.read().await.clone()
    }

    pub async fn credits_for(&self, player_id: &str) -> Vec<RewardCredit> {
        self.credits
            .read()
            .await
            .iter()
            .filter(|(id, _)| id == player_id)
            .map(|(_, credit)| credit.clone())
            .collect()
    }
}

#[async_trait]
impl LedgerSink for MockLedger {
    async fn credit(&self, player_id: &str, credit: &RewardCredit) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Database("ledger offline".to_string()));
        }
        self.credits
            .write()
            .await
            .push((player_id.to_string(), credit.clone()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockAchievementEvaluator {
    outcomes: Arc<RwLock<Vec<(String, GameOutcome)>>>,
}

impl MockAchievementEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn outcomes(&self) -> Vec<(String, GameOutcome)> {
        self.outcomes.read().await.clone()
    }
}

#[async_trait]
impl AchievementEvaluator for MockAchievementEvaluator {
    async fn evaluate(&self, player_id: &str, outcome: &GameOutcome) -> Result<(), StoreError> {
        self.outcomes
            .write()
            .await
            .push((player_id.to_string(), outcome.clone()));
        Ok(())
    }
}
