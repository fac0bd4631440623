use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Faction;
use crate::game::{GameOutcome, GameType};

/// Game metrics fed into the reward formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardInput {
    pub game_type: GameType,
    pub score: i64,
    pub duration_ms: u64,
    /// Expected in 0..=100; not validated here
    pub accuracy_percent: f64,
    pub faction: Faction,
}

impl RewardInput {
    pub fn from_outcome(outcome: &GameOutcome, faction: Faction) -> Self {
        Self {
            game_type: outcome.game_type,
            score: outcome.score,
            duration_ms: outcome.duration_ms,
            accuracy_percent: outcome.accuracy.unwrap_or(0.0),
            faction,
        }
    }
}

/// Snapshot of a player's history and memberships at reward time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerContext {
    pub faction: Faction,
    pub games_played_by_type: BTreeMap<GameType, u32>,
    pub win_streak: u32,
    pub guild_present: bool,
    pub plot_tier: Option<u32>,
}

impl PlayerContext {
    pub fn total_games(&self) -> u32 {
        self.games_played_by_type.values().sum()
    }

    pub fn distinct_game_types(&self) -> usize {
        self.games_played_by_type
            .values()
            .filter(|&&count| count > 0)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    Speed,
    Accuracy,
    Streak,
    Variety,
    Guild,
    Plot,
}

/// Itemized bonus fractions and the clamped total multiplier
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiplierBreakdown {
    pub speed: f64,
    pub accuracy: f64,
    pub streak: f64,
    pub variety: f64,
    pub guild: f64,
    pub plot: f64,
    pub total: f64,
}

impl MultiplierBreakdown {
    pub fn set(&mut self, kind: BonusKind, fraction: f64) {
        let slot = match kind {
            BonusKind::Speed => &mut self.speed,
            BonusKind::Accuracy => &mut self.accuracy,
            BonusKind::Streak => &mut self.streak,
            BonusKind::Variety => &mut self.variety,
            BonusKind::Guild => &mut self.guild,
            BonusKind::Plot => &mut self.plot,
        };
        *slot = fraction;
    }

    pub fn bonus_sum(&self) -> f64 {
        self.speed + self.accuracy + self.streak + self.variety + self.guild + self.plot
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardResult {
    pub faction: Faction,
    pub currency: u64,
    pub experience: u64,
    pub resources: BTreeMap<String, u64>,
    pub breakdown: MultiplierBreakdown,
}

/// Deltas handed to the ledger for one completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardCredit {
    pub session_id: String,
    pub game_type: GameType,
    pub won: bool,
    pub currency: u64,
    pub experience: u64,
    pub resources: BTreeMap<String, u64>,
}

impl RewardCredit {
    pub fn new(outcome: &GameOutcome, rewards: &RewardResult) -> Self {
        Self {
            session_id: outcome.session_id.clone(),
            game_type: outcome.game_type,
            won: outcome.won,
            currency: rewards.currency,
            experience: rewards.experience,
            resources: rewards.resources.clone(),
        }
    }
}
