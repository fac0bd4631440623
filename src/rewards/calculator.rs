use std::collections::BTreeMap;
use std::sync::Arc;

use super::{
    bonuses::standard_bonuses, BonusCalculator, MultiplierBreakdown, PlayerContext, RewardConfig,
    RewardInput, RewardResult,
};

/// Pure reward formula: base amounts scaled by the clamped sum of bonuses.
///
/// Holds no mutable state, so one calculator can be shared by every session.
#[derive(Clone)]
pub struct RewardCalculator {
    config: RewardConfig,
    bonuses: Vec<Arc<dyn BonusCalculator>>,
}

impl Default for RewardCalculator {
    fn default() -> Self {
        Self::new(RewardConfig::default())
    }
}

impl RewardCalculator {
    pub fn new(config: RewardConfig) -> Self {
        Self {
            config,
            bonuses: standard_bonuses(),
        }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn calculate(&self, input: &RewardInput, context: &PlayerContext) -> RewardResult {
        let mut breakdown = MultiplierBreakdown::default();
        for bonus in &self.bonuses {
            breakdown.set(bonus.kind(), bonus.calculate(input, context, &self.config));
        }
        breakdown.total = (1.0 + breakdown.bonus_sum()).min(self.config.max_total_bonus);

        let scale = |amount: u64| (amount as f64 * breakdown.total).floor() as u64;

        let resources: BTreeMap<String, u64> = self
            .config
            .resources_for(input.faction)
            .into_iter()
            .map(|(kind, amount)| (kind, scale(amount)))
            .collect();

        RewardResult {
            faction: input.faction,
            currency: scale(self.config.base_currency),
            experience: scale(self.config.base_experience),
            resources,
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameType;
    use crate::rewards::Faction;

    fn input(duration_ms: u64, accuracy_percent: f64, faction: Faction) -> RewardInput {
        RewardInput {
            game_type: GameType::Trivia,
            score: 40,
            duration_ms,
            accuracy_percent,
            faction,
        }
    }

    fn maxed_context() -> PlayerContext {
        PlayerContext {
            faction: Faction::Ember,
            games_played_by_type: [
                (GameType::PuzzleBlock, 1),
                (GameType::TicTacToe, 1),
                (GameType::Trivia, 1),
            ]
            .into_iter()
            .collect(),
            win_streak: 10,
            guild_present: true,
            plot_tier: Some(5),
        }
    }

    #[test]
    fn total_multiplier_is_clamped_to_ceiling() {
        let calculator = RewardCalculator::default();
        let result = calculator.calculate(&input(0, 100.0, Faction::Ember), &maxed_context());

        assert_eq!(result.breakdown.total, 2.0);
        assert!(result.breakdown.bonus_sum() > 1.0);
        assert_eq!(result.breakdown.streak, 5.0 * 0.05);
        assert_eq!(result.breakdown.plot, 0.25);
        assert_eq!(result.currency, 20);
        assert_eq!(result.experience, 100);
        assert_eq!(result.resources["cinder"], 6);
        assert_eq!(result.resources["flint"], 4);
        assert_eq!(result.resources["ash"], 2);
    }

    #[test]
    fn each_field_is_floored_independently() {
        let config = RewardConfig {
            guild_weight: 0.33,
            ..RewardConfig::without_bonuses()
        };
        let calculator = RewardCalculator::new(config);
        let context = PlayerContext {
            guild_present: true,
            ..PlayerContext::default()
        };

        let result = calculator.calculate(&input(600_000, 0.0, Faction::Tide), &context);

        assert!((result.breakdown.total - 1.33).abs() < 1e-9);
        assert_eq!(result.currency, 13);
        assert_eq!(result.experience, 66);
        assert_eq!(result.resources["pearl"], 3);
        assert_eq!(result.resources["kelp"], 2);
        assert_eq!(result.resources["salt"], 1);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let calculator = RewardCalculator::default();
        let input = input(90_000, 80.0, Faction::Grove);
        let context = maxed_context();

        let first = serde_json::to_vec(&calculator.calculate(&input, &context)).unwrap();
        let second = serde_json::to_vec(&calculator.calculate(&input, &context)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_duration_does_not_divide_by_zero() {
        let calculator = RewardCalculator::default();
        let result = calculator.calculate(&input(0, 0.0, Faction::Ember), &PlayerContext::default());
        assert!(result.breakdown.speed.is_finite());
        assert_eq!(result.breakdown.speed, 0.3);
    }

    #[test]
    fn no_bonuses_pays_base_amounts() {
        let calculator = RewardCalculator::default();
        let result = calculator.calculate(
            &input(10 * 60 * 1000, 0.0, Faction::Ember),
            &PlayerContext::default(),
        );

        assert_eq!(result.breakdown, MultiplierBreakdown {
            total: 1.0,
            ..MultiplierBreakdown::default()
        });
        assert_eq!(result.currency, 10);
        assert_eq!(result.experience, 50);
        assert_eq!(result.faction, Faction::Ember);
    }

    #[test]
    fn custom_ceiling_is_respected() {
        let config = RewardConfig {
            max_total_bonus: 1.5,
            ..RewardConfig::default()
        };
        let calculator = RewardCalculator::new(config);
        let result = calculator.calculate(&input(0, 100.0, Faction::Ember), &maxed_context());
        assert_eq!(result.breakdown.total, 1.5);
        assert_eq!(result.currency, 15);
        assert_eq!(result.experience, 75);
    }
}
