use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::game::GameType;
use crate::rewards::{Faction, PlayerContext, RewardCredit};

/// A player's memberships, play history and balances
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: String,
    pub faction: Faction,
    pub guild_id: Option<String>,
    pub plot_tier: Option<u32>,
    pub games_played_by_type: BTreeMap<GameType, u32>,
    pub wins: u32,
    pub current_win_streak: u32,
    pub best_win_streak: u32,
    pub currency: u64,
    pub experience: u64,
    pub resources: BTreeMap<String, u64>,
}

impl PlayerProfile {
    /// Fresh profile: default faction, no guild, no plot
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Self::default()
        }
    }

    pub fn context(&self) -> PlayerContext {
        PlayerContext {
            faction: self.faction,
            games_played_by_type: self.games_played_by_type.clone(),
            win_streak: self.current_win_streak,
            guild_present: self.guild_id.is_some(),
            plot_tier: self.plot_tier,
        }
    }

    pub fn games_played(&self) -> u32 {
        self.games_played_by_type.values().sum()
    }

    pub fn apply_credit(&mut self, credit: &RewardCredit) {
        self.currency += credit.currency;
        self.experience += credit.experience;
        for (kind, amount) in &credit.resources {
            *self.resources.entry(kind.clone()).or_default() += amount;
        }

        *self.games_played_by_type.entry(credit.game_type).or_default() += 1;

        if credit.won {
            self.wins += 1;
            self.current_win_streak += 1;
            self.best_win_streak = self.best_win_streak.max(self.current_win_streak);
        } else {
            self.current_win_streak = 0;
        }
    }
}
