pub use history::{StreakBonus, VarietyBonus};
pub use membership::{GuildBonus, PlotBonus};
pub use performance::{AccuracyBonus, SpeedBonus};

mod history;
mod membership;
mod performance;

use std::sync::Arc;

use super::BonusCalculator;

/// The six standard bonuses, in breakdown order
pub fn standard_bonuses() -> Vec<Arc<dyn BonusCalculator>> {
    vec![
        Arc::new(SpeedBonus::new()),
        Arc::new(AccuracyBonus::new()),
        Arc::new(StreakBonus::new()),
        Arc::new(VarietyBonus::new()),
        Arc::new(GuildBonus::new()),
        Arc::new(PlotBonus::new()),
    ]
}
