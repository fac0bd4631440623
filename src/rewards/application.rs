use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{PlayerContext, RewardCalculator, RewardCredit, RewardError, RewardInput, RewardResult};
use crate::game::GameOutcome;
use crate::shared::StoreError;

/// Read-only source of the player's history and memberships
#[async_trait]
pub trait PlayerContextProvider: Send + Sync {
    async fn player_context(&self, player_id: &str) -> Result<PlayerContext, StoreError>;
}

/// Economy store receiving the reward deltas of a completed session
#[async_trait]
pub trait LedgerSink: Send + Sync {
    async fn credit(&self, player_id: &str, credit: &RewardCredit) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AchievementEvaluator: Send + Sync {
    async fn evaluate(&self, player_id: &str, outcome: &GameOutcome) -> Result<(), StoreError>;
}

/// Records outcomes in the log instead of evaluating achievements
#[derive(Debug, Default)]
pub struct TracingAchievementEvaluator;

#[async_trait]
impl AchievementEvaluator for TracingAchievementEvaluator {
    async fn evaluate(&self, player_id: &str, outcome: &GameOutcome) -> Result<(), StoreError> {
        info!(
            player_id = %player_id,
            session_id = %outcome.session_id,
            game_type = %outcome.game_type,
            score = outcome.score,
            won = outcome.won,
            "Outcome ready for achievement evaluation"
        );
        Ok(())
    }
}

/// Terminal bookkeeping for a completed session: fetch context, calculate,
/// credit the ledger and notify the achievement evaluator.
pub struct RewardApplier {
    calculator: RewardCalculator,
    context_provider: Arc<dyn PlayerContextProvider>,
    ledger: Arc<dyn LedgerSink>,
    achievements: Arc<dyn AchievementEvaluator>,
}

impl RewardApplier {
    pub fn new(
        calculator: RewardCalculator,
        context_provider: Arc<dyn PlayerContextProvider>,
        ledger: Arc<dyn LedgerSink>,
        achievements: Arc<dyn AchievementEvaluator>,
    ) -> Self {
        Self {
            calculator,
            context_provider,
            ledger,
            achievements,
        }
    }

    pub fn calculator(&self) -> &RewardCalculator {
        &self.calculator
    }

    /// The ledger is credited once and the evaluator notified once, even when
    /// one of them fails. A ledger failure takes precedence in the error.
    #[instrument(skip(self, outcome), fields(session_id = %outcome.session_id, player_id = %outcome.player_id))]
    pub async fn apply(&self, outcome: &GameOutcome) -> Result<RewardResult, RewardError> {
        let player_id = outcome.player_id.as_str();

        let context = match self.context_provider.player_context(player_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "Failed to load player context, rewards skipped");
                self.notify_achievements(player_id, outcome).await.ok();
                return Err(RewardError::Context(e));
            }
        };

        let input = RewardInput::from_outcome(outcome, context.faction);
        let rewards = self.calculator.calculate(&input, &context);
        debug!(
            currency = rewards.currency,
            experience = rewards.experience,
            multiplier = rewards.breakdown.total,
            "Rewards calculated"
        );

        let credit = RewardCredit::new(outcome, &rewards);
        let ledger_result = self.ledger.credit(player_id, &credit).await;
        if let Err(e) = &ledger_result {
            warn!(error = %e, "Failed to credit rewards");
        }

        let achievement_result = self.notify_achievements(player_id, outcome).await;

        ledger_result.map_err(RewardError::Ledger)?;
        achievement_result?;

        info!(
            currency = rewards.currency,
            experience = rewards.experience,
            "Rewards applied"
        );
        Ok(rewards)
    }

    async fn notify_achievements(
        &self,
        player_id: &str,
        outcome: &GameOutcome,
    ) -> Result<(), RewardError> {
        self.achievements
            .evaluate(player_id, outcome)
            .await
            .map_err(|e| {
                warn!(error = %e, "Achievement evaluation failed");
                RewardError::Achievement(e)
            })
    }
}
