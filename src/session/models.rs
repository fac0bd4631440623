use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use super::SessionError;
use crate::game::{GameCore, GameInstance, GameState, GameType, ReconstructedGame};

/// Database model for the game_sessions table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SessionModel {
    pub id: String,
    pub player_id: String,
    pub game_type: String,
    pub state: String,
    pub score: i64,
    pub level: i32,
    pub game_data: String, // game-specific JSON, never interpreted by the registry
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub final_score: Option<i64>,
    pub final_level: Option<i32>,
    pub duration_ms: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl SessionModel {
    /// Snapshot of an instance's envelope plus its opaque data blob.
    /// Final metrics are filled in once the instance is terminal.
    pub fn from_instance(instance: &dyn GameInstance) -> Result<Self, SessionError> {
        let core = instance.core();
        let game_data = instance.snapshot_data()?.to_string();
        let terminal = core.state().is_terminal();

        Ok(Self {
            id: core.id().to_string(),
            player_id: core.player_id().to_string(),
            game_type: core.game_type().to_string(),
            state: core.state().to_string(),
            score: core.score(),
            level: i32::try_from(core.level()).unwrap_or(i32::MAX),
            game_data,
            started_at: core.started_at(),
            ended_at: core.ended_at(),
            final_score: terminal.then(|| core.score()),
            final_level: terminal.then(|| i32::try_from(core.level()).unwrap_or(i32::MAX)),
            duration_ms: terminal.then(|| i64::try_from(core.duration_ms()).unwrap_or(i64::MAX)),
            updated_at: Utc::now(),
        })
    }

    pub fn game_state(&self) -> Option<GameState> {
        GameState::from_str(&self.state).ok()
    }

    pub fn is_live(&self) -> bool {
        self.game_state().is_some_and(|state| !state.is_terminal())
    }

    /// Rebuilds a reduced instance exposing only the uniform fields and the raw data blob
    pub fn reconstruct(&self) -> Result<ReconstructedGame, SessionError> {
        let corrupt = |reason: String| SessionError::Reconstruction {
            session_id: self.id.clone(),
            reason,
        };

        let game_type = GameType::from_str(&self.game_type)
            .map_err(|_| corrupt(format!("unknown game type '{}'", self.game_type)))?;
        let state = GameState::from_str(&self.state)
            .map_err(|_| corrupt(format!("unknown state '{}'", self.state)))?;
        if state.is_terminal() {
            return Err(corrupt(format!("session is already {}", state)));
        }
        let level = u32::try_from(self.level)
            .map_err(|_| corrupt(format!("negative level {}", self.level)))?;
        let data: serde_json::Value = serde_json::from_str(&self.game_data)
            .map_err(|e| corrupt(format!("unreadable game data: {}", e)))?;

        let core = GameCore::restore(
            self.id.clone(),
            self.player_id.clone(),
            game_type,
            state,
            self.score,
            level,
            self.started_at,
            self.ended_at,
        );
        Ok(ReconstructedGame::new(core, data))
    }
}
