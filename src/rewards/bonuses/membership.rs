use super::super::{BonusCalculator, BonusKind, PlayerContext, RewardConfig, RewardInput};

pub struct GuildBonus;

impl Default for GuildBonus {
    fn default() -> Self {
        Self::new()
    }
}

impl GuildBonus {
    pub fn new() -> Self {
        Self
    }
}

impl BonusCalculator for GuildBonus {
    fn kind(&self) -> BonusKind {
        BonusKind::Guild
    }

    fn calculate(
        &self,
        _input: &RewardInput,
        context: &PlayerContext,
        config: &RewardConfig,
    ) -> f64 {
        if context.guild_present {
            config.guild_weight
        } else {
            0.0
        }
    }
}

/// Scales with the tier of the player's neighbourhood plot
pub struct PlotBonus;

impl Default for PlotBonus {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotBonus {
    pub fn new() -> Self {
        Self
    }
}

impl BonusCalculator for PlotBonus {
    fn kind(&self) -> BonusKind {
        BonusKind::Plot
    }

    fn calculate(
        &self,
        _input: &RewardInput,
        context: &PlayerContext,
        config: &RewardConfig,
    ) -> f64 {
        context
            .plot_tier
            .map(|tier| (f64::from(tier) * config.plot_weight).min(config.max_plot_bonus))
            .unwrap_or(0.0)
    }
}
