use super::super::{BonusCalculator, BonusKind, PlayerContext, RewardConfig, RewardInput};

/// Linear per-win bonus up to `max_streak_stacks`
pub struct StreakBonus;

impl Default for StreakBonus {
    fn default() -> Self {
        Self::new()
    }
}

impl StreakBonus {
    pub fn new() -> Self {
        Self
    }
}

impl BonusCalculator for StreakBonus {
    fn kind(&self) -> BonusKind {
        BonusKind::Streak
    }

    fn calculate(
        &self,
        _input: &RewardInput,
        context: &PlayerContext,
        config: &RewardConfig,
    ) -> f64 {
        let stacks = context.win_streak.min(config.max_streak_stacks);
        f64::from(stacks) * config.streak_weight
    }
}

/// Rewards spreading play across game types
pub struct VarietyBonus;

impl Default for VarietyBonus {
    fn default() -> Self {
        Self::new()
    }
}

impl VarietyBonus {
    pub fn new() -> Self {
        Self
    }
}

impl BonusCalculator for VarietyBonus {
    fn kind(&self) -> BonusKind {
        BonusKind::Variety
    }

    fn calculate(
        &self,
        _input: &RewardInput,
        context: &PlayerContext,
        config: &RewardConfig,
    ) -> f64 {
        let total = context.total_games();
        if total == 0 {
            return 0.0;
        }
        let ratio = context.distinct_game_types() as f64 / f64::from(total);
        (ratio * config.variety_weight).min(config.max_variety_bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameType;
    use crate::rewards::Faction;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn input() -> RewardInput {
        RewardInput {
            game_type: GameType::TicTacToe,
            score: 100,
            duration_ms: 60_000,
            accuracy_percent: 0.0,
            faction: Faction::Tide,
        }
    }

    #[rstest]
    #[case(0, 0.0)]
    #[case(1, 0.05)]
    #[case(5, 0.25)]
    #[case(10, 0.25)]
    fn streak_is_capped_at_five_stacks(#[case] win_streak: u32, #[case] expected: f64) {
        let context = PlayerContext {
            win_streak,
            ..PlayerContext::default()
        };
        let bonus = StreakBonus::new().calculate(&input(), &context, &RewardConfig::default());
        assert!((bonus - expected).abs() < 1e-9);
    }

    #[test]
    fn variety_is_zero_without_history() {
        let bonus = VarietyBonus::new().calculate(
            &input(),
            &PlayerContext::default(),
            &RewardConfig::default(),
        );
        assert_eq!(bonus, 0.0);
    }

    #[test]
    fn variety_uses_distinct_over_total() {
        let mut games_played_by_type = BTreeMap::new();
        games_played_by_type.insert(GameType::Trivia, 3);
        games_played_by_type.insert(GameType::TicTacToe, 1);
        let context = PlayerContext {
            games_played_by_type,
            ..PlayerContext::default()
        };

        let bonus = VarietyBonus::new().calculate(&input(), &context, &RewardConfig::default());
        // 2 distinct / 4 total * 0.2
        assert!((bonus - 0.1).abs() < 1e-9);
    }

    #[test]
    fn variety_is_capped() {
        let mut games_played_by_type = BTreeMap::new();
        games_played_by_type.insert(GameType::Trivia, 1);
        let context = PlayerContext {
            games_played_by_type,
            ..PlayerContext::default()
        };
        let config = RewardConfig {
            variety_weight: 0.8,
            ..RewardConfig::default()
        };

        let bonus = VarietyBonus::new().calculate(&input(), &context, &config);
        assert_eq!(bonus, config.max_variety_bonus);
    }
}
