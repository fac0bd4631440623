use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::SessionModel;
use crate::shared::StoreError;

const SESSION_COLUMNS: &str = "id, player_id, game_type, state, score, level, game_data, started_at, ended_at, final_score, final_level, duration_ms, updated_at";

/// Durable record of every session, live or finished
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: &SessionModel) -> Result<(), StoreError>;
    async fn update_session(&self, session: &SessionModel) -> Result<(), StoreError>;
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, StoreError>;
    /// Newest non-terminal session owned by the player
    async fn find_live_session(&self, player_id: &str)
        -> Result<Option<SessionModel>, StoreError>;
    /// The player's sessions, newest first
    async fn list_player_sessions(
        &self,
        player_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionModel>, StoreError>;
}

/// In-memory implementation of SessionRepository for development and testing
///
/// Data is lost when the application restarts.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, SessionModel>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory repository with pre-populated rows
    pub fn with_sessions(sessions: Vec<SessionModel>) -> Self {
        let sessions = sessions
            .into_iter()
            .map(|session| (session.id.clone(), session))
            .collect();
        Self {
            sessions: RwLock::new(sessions),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, session))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), StoreError> {
        debug!(session_id = %session.id, player_id = %session.player_id, "Creating session in memory");

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            warn!(session_id = %session.id, "Session already exists in memory");
            return Err(StoreError::Conflict(session.id.clone()));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn update_session(&self, session: &SessionModel) -> Result<(), StoreError> {
        debug!(session_id = %session.id, state = %session.state, "Updating session in memory");

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => {
                warn!(session_id = %session.id, "Session not found for update in memory");
                Err(StoreError::NotFound(session.id.clone()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_live_session(
        &self,
        player_id: &str,
    ) -> Result<Option<SessionModel>, StoreError> {
        let sessions = self.sessions.read().await;
        let live = sessions
            .values()
            .filter(|session| session.player_id == player_id && session.is_live())
            .max_by_key(|session| session.started_at)
            .cloned();

        debug!(player_id = %player_id, found = live.is_some(), "Looked up live session in memory");
        Ok(live)
    }

    #[instrument(skip(self))]
    async fn list_player_sessions(
        &self,
        player_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionModel>, StoreError> {
        let sessions = self.sessions.read().await;
        let mut history: Vec<SessionModel> = sessions
            .values()
            .filter(|session| session.player_id == player_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        history.truncate(limit);
        Ok(history)
    }
}

/// PostgreSQL implementation of session repository
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    #[instrument(skip(self, session))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), StoreError> {
        debug!(session_id = %session.id, player_id = %session.player_id, "Creating session in database");

        sqlx::query(&format!(
            "INSERT INTO game_sessions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            SESSION_COLUMNS
        ))
        .bind(&session.id)
        .bind(&session.player_id)
        .bind(&session.game_type)
        .bind(&session.state)
        .bind(session.score)
        .bind(session.level)
        .bind(&session.game_data)
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session.final_score)
        .bind(session.final_level)
        .bind(session.duration_ms)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create session in database");
            StoreError::from(e)
        })?;

        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn update_session(&self, session: &SessionModel) -> Result<(), StoreError> {
        debug!(session_id = %session.id, state = %session.state, "Updating session in database");

        let result = sqlx::query(
            "UPDATE game_sessions SET state = $2, score = $3, level = $4, game_data = $5, ended_at = $6, final_score = $7, final_level = $8, duration_ms = $9, updated_at = $10 WHERE id = $1"
        )
        .bind(&session.id)
        .bind(&session.state)
        .bind(session.score)
        .bind(session.level)
        .bind(&session.game_data)
        .bind(session.ended_at)
        .bind(session.final_score)
        .bind(session.final_level)
        .bind(session.duration_ms)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, session_id = %session.id, "Failed to update session in database");
            StoreError::from(e)
        })?;

        if result.rows_affected() == 0 {
            warn!(session_id = %session.id, "Session not found for update");
            return Err(StoreError::NotFound(session.id.clone()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, StoreError> {
        let session = sqlx::query_as::<_, SessionModel>(&format!(
            "SELECT {} FROM game_sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, session_id = %session_id, "Failed to fetch session from database");
            StoreError::from(e)
        })?;

        Ok(session)
    }

    #[instrument(skip(self))]
    async fn find_live_session(
        &self,
        player_id: &str,
    ) -> Result<Option<SessionModel>, StoreError> {
        let session = sqlx::query_as::<_, SessionModel>(&format!(
            "SELECT {} FROM game_sessions WHERE player_id = $1 AND state IN ('waiting', 'playing', 'paused') ORDER BY started_at DESC LIMIT 1",
            SESSION_COLUMNS
        ))
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to look up live session");
            StoreError::from(e)
        })?;

        debug!(player_id = %player_id, found = session.is_some(), "Looked up live session in database");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn list_player_sessions(
        &self,
        player_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionModel>, StoreError> {
        let sessions = sqlx::query_as::<_, SessionModel>(&format!(
            "SELECT {} FROM game_sessions WHERE player_id = $1 ORDER BY started_at DESC LIMIT $2",
            SESSION_COLUMNS
        ))
        .bind(player_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to list player sessions");
            StoreError::from(e)
        })?;

        Ok(sessions)
    }
}
