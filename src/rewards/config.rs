use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Player faction; selects which resource bundle a reward pays out
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Faction {
    #[default]
    Ember,
    Tide,
    Grove,
}

impl Faction {
    fn default_bundle(self) -> BTreeMap<String, u64> {
        let kinds: [(&str, u64); 3] = match self {
            Faction::Ember => [("cinder", 3), ("flint", 2), ("ash", 1)],
            Faction::Tide => [("pearl", 3), ("kelp", 2), ("salt", 1)],
            Faction::Grove => [("timber", 3), ("moss", 2), ("seed", 1)],
        };
        kinds
            .into_iter()
            .map(|(name, amount)| (name.to_string(), amount))
            .collect()
    }
}

/// Tunable constants of the reward formula.
///
/// `max_total_bonus` caps the combined multiplier, baseline 1.0 included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub base_currency: u64,
    pub base_experience: u64,
    pub faction_resources: BTreeMap<Faction, BTreeMap<String, u64>>,
    pub speed_weight: f64,
    pub accuracy_weight: f64,
    pub streak_weight: f64,
    pub variety_weight: f64,
    pub guild_weight: f64,
    pub plot_weight: f64,
    pub max_speed_bonus: f64,
    pub max_accuracy_bonus: f64,
    pub max_variety_bonus: f64,
    pub max_plot_bonus: f64,
    pub max_streak_stacks: u32,
    pub max_total_bonus: f64,
    pub standard_duration_ms: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_currency: 10,
            base_experience: 50,
            faction_resources: Faction::iter()
                .map(|faction| (faction, faction.default_bundle()))
                .collect(),
            speed_weight: 0.3,
            accuracy_weight: 0.3,
            streak_weight: 0.05,
            variety_weight: 0.2,
            guild_weight: 0.1,
            plot_weight: 0.05,
            max_speed_bonus: 0.3,
            max_accuracy_bonus: 0.3,
            max_variety_bonus: 0.2,
            max_plot_bonus: 0.25,
            max_streak_stacks: 5,
            max_total_bonus: 2.0,
            standard_duration_ms: 5 * 60 * 1000,
        }
    }
}

impl RewardConfig {
    /// Config with every bonus switched off; handy as a base for overrides
    pub fn without_bonuses() -> Self {
        Self {
            speed_weight: 0.0,
            accuracy_weight: 0.0,
            streak_weight: 0.0,
            variety_weight: 0.0,
            guild_weight: 0.0,
            plot_weight: 0.0,
            ..Self::default()
        }
    }

    pub fn resources_for(&self, faction: Faction) -> BTreeMap<String, u64> {
        self.faction_resources
            .get(&faction)
            .cloned()
            .unwrap_or_default()
    }
}
