use super::super::{BonusCalculator, BonusKind, PlayerContext, RewardConfig, RewardInput};

/// Rewards finishing faster than the standard duration
pub struct SpeedBonus;

impl Default for SpeedBonus {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedBonus {
    pub fn new() -> Self {
        Self
    }
}

impl BonusCalculator for SpeedBonus {
    fn kind(&self) -> BonusKind {
        BonusKind::Speed
    }

    fn calculate(
        &self,
        input: &RewardInput,
        _context: &PlayerContext,
        config: &RewardConfig,
    ) -> f64 {
        if config.standard_duration_ms == 0 {
            return 0.0;
        }
        let standard = config.standard_duration_ms as f64;
        let saved = ((standard - input.duration_ms as f64) / standard).max(0.0);
        (saved * config.speed_weight).min(config.max_speed_bonus)
    }
}

pub struct AccuracyBonus;

impl Default for AccuracyBonus {
    fn default() -> Self {
        Self::new()
    }
}

impl AccuracyBonus {
    pub fn new() -> Self {
        Self
    }
}

impl BonusCalculator for AccuracyBonus {
    fn kind(&self) -> BonusKind {
        BonusKind::Accuracy
    }

    // Out-of-range accuracy passes straight through
    fn calculate(
        &self,
        input: &RewardInput,
        _context: &PlayerContext,
        config: &RewardConfig,
    ) -> f64 {
        (input.accuracy_percent / 100.0 * config.accuracy_weight).min(config.max_accuracy_bonus)
    }
}
