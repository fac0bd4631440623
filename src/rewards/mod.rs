pub mod bonuses;

mod application;
mod calculator;
mod config;
mod errors;
mod models;

pub use application::{
    AchievementEvaluator, LedgerSink, PlayerContextProvider, RewardApplier,
    TracingAchievementEvaluator,
};
pub use calculator::RewardCalculator;
pub use config::{Faction, RewardConfig};
pub use errors::RewardError;
pub use models::*;

/// One named bonus of the reward formula.
///
/// Returns the bonus as a fraction of the base amount (0.3 means +30%),
/// already clamped to its own cap.
pub trait BonusCalculator: Send + Sync {
    fn kind(&self) -> BonusKind;

    fn calculate(
        &self,
        input: &RewardInput,
        context: &PlayerContext,
        config: &RewardConfig,
    ) -> f64;
}
