use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::PlayerProfile;
use crate::rewards::{Faction, LedgerSink, PlayerContext, PlayerContextProvider, RewardCredit};
use crate::shared::StoreError;

/// In-memory player store for development and testing
#[derive(Debug, Default)]
pub struct InMemoryPlayerRepository {
    players: Arc<RwLock<HashMap<String, PlayerProfile>>>,
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_profile(&self, profile: PlayerProfile) {
        let mut players = self.players.write().await;
        players.insert(profile.player_id.clone(), profile);
    }

    /// Stored profile, or the default one for players never seen before
    pub async fn profile(&self, player_id: &str) -> PlayerProfile {
        let players = self.players.read().await;
        players
            .get(player_id)
            .cloned()
            .unwrap_or_else(|| PlayerProfile::new(player_id))
    }
}

#[async_trait]
impl PlayerContextProvider for InMemoryPlayerRepository {
    #[instrument(skip(self))]
    async fn player_context(&self, player_id: &str) -> Result<PlayerContext, StoreError> {
        Ok(self.profile(player_id).await.context())
    }
}

#[async_trait]
impl LedgerSink for InMemoryPlayerRepository {
    #[instrument(skip(self, credit), fields(session_id = %credit.session_id))]
    async fn credit(&self, player_id: &str, credit: &RewardCredit) -> Result<(), StoreError> {
        let mut players = self.players.write().await;
        let profile = players
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerProfile::new(player_id));
        profile.apply_credit(credit);

        debug!(
            player_id = %player_id,
            currency = profile.currency,
            win_streak = profile.current_win_streak,
            "Credited player in memory"
        );
        Ok(())
    }
}

/// PostgreSQL player store, table `players`
pub struct PostgresPlayerRepository {
    pool: PgPool,
}

impl PostgresPlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, executor))]
    async fn fetch_profile<'e, E>(
        &self,
        executor: E,
        player_id: &str,
        for_update: bool,
    ) -> Result<PlayerProfile, StoreError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = if for_update {
            "SELECT faction, guild_id, plot_tier, games_played_by_type, wins, current_win_streak, best_win_streak, currency, experience, resources FROM players WHERE player_id = $1 FOR UPDATE"
        } else {
            "SELECT faction, guild_id, plot_tier, games_played_by_type, wins, current_win_streak, best_win_streak, currency, experience, resources FROM players WHERE player_id = $1"
        };

        let row = sqlx::query(sql)
            .bind(player_id)
            .fetch_optional(executor)
            .await
            .map_err(|e| {
                warn!(error = %e, player_id = %player_id, "Failed to fetch player from database");
                StoreError::from(e)
            })?;

        let Some(row) = row else {
            debug!(player_id = %player_id, "Player not found, using default profile");
            return Ok(PlayerProfile::new(player_id));
        };

        let faction: String = row.try_get("faction")?;
        let games_played: String = row.try_get("games_played_by_type")?;
        let resources: String = row.try_get("resources")?;
        let plot_tier: Option<i32> = row.try_get("plot_tier")?;

        Ok(PlayerProfile {
            player_id: player_id.to_string(),
            faction: Faction::from_str(&faction)
                .map_err(|_| StoreError::Corrupt(format!("unknown faction '{}'", faction)))?,
            guild_id: row.try_get("guild_id")?,
            plot_tier: plot_tier.map(|tier| tier.max(0) as u32),
            games_played_by_type: serde_json::from_str(&games_played)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            wins: row.try_get::<i32, _>("wins")?.max(0) as u32,
            current_win_streak: row.try_get::<i32, _>("current_win_streak")?.max(0) as u32,
            best_win_streak: row.try_get::<i32, _>("best_win_streak")?.max(0) as u32,
            currency: row.try_get::<i64, _>("currency")?.max(0) as u64,
            experience: row.try_get::<i64, _>("experience")?.max(0) as u64,
            resources: serde_json::from_str(&resources)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        })
    }
}

#[async_trait]
impl PlayerContextProvider for PostgresPlayerRepository {
    #[instrument(skip(self))]
    async fn player_context(&self, player_id: &str) -> Result<PlayerContext, StoreError> {
        let profile = self.fetch_profile(&self.pool, player_id, false).await?;
        Ok(profile.context())
    }
}

#[async_trait]
impl LedgerSink for PostgresPlayerRepository {
    #[instrument(skip(self, credit), fields(session_id = %credit.session_id))]
    async fn credit(&self, player_id: &str, credit: &RewardCredit) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let mut profile = self.fetch_profile(&mut *tx, player_id, true).await?;
        profile.apply_credit(credit);

        let games_played = serde_json::to_string(&profile.games_played_by_type)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let resources = serde_json::to_string(&profile.resources)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        sqlx::query(
            "INSERT INTO players (player_id, faction, guild_id, plot_tier, games_played_by_type, wins, current_win_streak, best_win_streak, currency, experience, resources) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (player_id) DO UPDATE SET games_played_by_type = $5, wins = $6, current_win_streak = $7, best_win_streak = $8, currency = $9, experience = $10, resources = $11"
        )
        .bind(&profile.player_id)
        .bind(profile.faction.as_ref())
        .bind(&profile.guild_id)
        .bind(profile.plot_tier.map(|tier| tier as i32))
        .bind(games_played)
        .bind(profile.wins as i32)
        .bind(profile.current_win_streak as i32)
        .bind(profile.best_win_streak as i32)
        .bind(profile.currency as i64)
        .bind(profile.experience as i64)
        .bind(resources)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to credit player in database");
            StoreError::from(e)
        })?;

        tx.commit().await?;

        debug!(player_id = %player_id, currency = profile.currency, "Credited player in database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameType;

    fn credit(won: bool) -> RewardCredit {
        RewardCredit {
            session_id: "session-1".to_string(),
            game_type: GameType::TicTacToe,
            won,
            currency: 12,
            experience: 60,
            resources: [("pearl".to_string(), 3)].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn unknown_player_gets_default_context() {
        let repo = InMemoryPlayerRepository::new();
        let context = repo.player_context("nobody").await.unwrap();
        assert_eq!(context, PlayerContext::default());
    }

    #[tokio::test]
    async fn seeded_memberships_show_in_context() {
        let repo = InMemoryPlayerRepository::new();
        repo.upsert_profile(PlayerProfile {
            faction: Faction::Tide,
            guild_id: Some("guild-7".to_string()),
            plot_tier: Some(3),
            ..PlayerProfile::new("U2")
        })
        .await;

        let context = repo.player_context("U2").await.unwrap();
        assert_eq!(context.faction, Faction::Tide);
        assert!(context.guild_present);
        assert_eq!(context.plot_tier, Some(3));
    }

    #[tokio::test]
    async fn credit_updates_history_and_streak() {
        let repo = InMemoryPlayerRepository::new();
        repo.credit("U1", &credit(true)).await.unwrap();
        repo.credit("U1", &credit(true)).await.unwrap();

        let context = repo.player_context("U1").await.unwrap();
        assert_eq!(context.win_streak, 2);
        assert_eq!(context.games_played_by_type[&GameType::TicTacToe], 2);

        let profile = repo.profile("U1").await;
        assert_eq!(profile.currency, 24);
        assert_eq!(profile.resources["pearl"], 6);

        repo.credit("U1", &credit(false)).await.unwrap();
        let profile = repo.profile("U1").await;
        assert_eq!(profile.current_win_streak, 0);
        assert_eq!(profile.best_win_streak, 2);
    }
}
