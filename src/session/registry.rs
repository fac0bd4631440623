use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::cleanup_task::{run_sweep_task, SweepConfig};
use super::models::SessionModel;
use super::repository::SessionRepository;
use super::types::SessionSummary;
use super::SessionError;
use crate::game::{EndReason, GameError, GameInput, GameInstance, GameState, RenderState};
use crate::rewards::RewardApplier;

/// One live session. The mutex serializes every action against this game.
struct LiveSession {
    player_id: String,
    started_at: DateTime<Utc>,
    game: Mutex<Box<dyn GameInstance>>,
}

#[derive(Default)]
struct LiveTable {
    by_id: HashMap<String, Arc<LiveSession>>,
    by_player: HashMap<String, String>,
}

impl LiveTable {
    fn insert(&mut self, session_id: String, session: Arc<LiveSession>) {
        self.by_player
            .insert(session.player_id.clone(), session_id.clone());
        self.by_id.insert(session_id, session);
    }

    fn remove(&mut self, session_id: &str) -> Option<Arc<LiveSession>> {
        let session = self.by_id.remove(session_id)?;
        if self
            .by_player
            .get(&session.player_id)
            .is_some_and(|id| id == session_id)
        {
            self.by_player.remove(&session.player_id);
        }
        Some(session)
    }

    fn for_player(&self, player_id: &str) -> Option<Arc<LiveSession>> {
        self.by_player
            .get(player_id)
            .and_then(|session_id| self.by_id.get(session_id))
            .cloned()
    }
}

/// Tracks which player is in which game right now.
///
/// The in-memory table is a lookup cache over the session store; anything it
/// loses on restart is recovered from live rows in the store.
pub struct SessionRegistry {
    live: RwLock<LiveTable>,
    repository: Arc<dyn SessionRepository>,
    rewards: RewardApplier,
    sweep: SweepConfig,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SessionRegistry {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        rewards: RewardApplier,
        sweep: SweepConfig,
    ) -> Self {
        Self {
            live: RwLock::new(LiveTable::default()),
            repository,
            rewards,
            sweep,
            sweeper: Mutex::new(None),
        }
    }

    pub fn sweep_config(&self) -> SweepConfig {
        self.sweep
    }

    /// Spawns the periodic sweep. Calling it again while running is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut sweeper = self.sweeper.lock().await;
        if sweeper.is_some() {
            return;
        }
        *sweeper = Some(tokio::spawn(run_sweep_task(
            Arc::downgrade(self),
            self.sweep,
        )));
    }

    pub async fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.abort();
            info!("Session sweep stopped");
        }
    }

    pub async fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Registers an initialized instance as the player's live session
    #[instrument(skip(self, instance), fields(session_id = %instance.id(), player_id = %instance.player_id()))]
    pub async fn create_session(
        &self,
        instance: Box<dyn GameInstance>,
    ) -> Result<RenderState, SessionError> {
        let state = instance.state();
        if !matches!(state, GameState::Waiting | GameState::Playing) {
            return Err(SessionError::InvalidStateTransition {
                from: state,
                to: GameState::Playing,
            });
        }
        if instance.player_id().is_empty() {
            return Err(SessionError::InvalidInput(
                "game has no owning player".to_string(),
            ));
        }

        let session_id = instance.id().to_string();
        let player_id = instance.player_id().to_string();

        if let Some(existing) = self.live.read().await.by_player.get(&player_id) {
            warn!(existing_session_id = %existing, "Player already has a live session");
            return Err(SessionError::Duplicate {
                player_id,
                session_id: existing.clone(),
            });
        }

        // the table is empty after a restart, so the store has the final say
        if let Some(stored) = self.repository.find_live_session(&player_id).await? {
            warn!(existing_session_id = %stored.id, "Player has a live session in the store");
            return Err(SessionError::Duplicate {
                player_id,
                session_id: stored.id,
            });
        }

        let model = SessionModel::from_instance(instance.as_ref())?;
        let render = instance.render_state();
        let entry = Arc::new(LiveSession {
            player_id: player_id.clone(),
            started_at: instance.core().started_at(),
            game: Mutex::new(instance),
        });

        {
            let mut live = self.live.write().await;
            if let Some(existing) = live.by_player.get(&player_id) {
                warn!(existing_session_id = %existing, "Lost race to create session");
                return Err(SessionError::Duplicate {
                    player_id,
                    session_id: existing.clone(),
                });
            }
            live.insert(session_id.clone(), entry);
        }

        if let Err(e) = self.repository.create_session(&model).await {
            error!(error = %e, "Failed to persist new session, rolling back");
            self.live.write().await.remove(&session_id);
            return Err(e.into());
        }

        info!(game_type = %model.game_type, state = %model.state, "Session created");
        Ok(render)
    }

    /// The player's live session, rebuilt from the store when it is not in memory.
    ///
    /// A rebuilt session only carries the uniform fields; it can be inspected,
    /// paused, resumed and abandoned but rejects game input.
    #[instrument(skip(self))]
    pub async fn get_active_session(
        &self,
        player_id: &str,
    ) -> Result<Option<RenderState>, SessionError> {
        let cached = self.live.read().await.for_player(player_id);
        if let Some(entry) = cached {
            return Ok(live_render(&entry).await);
        }

        let Some(row) = self.repository.find_live_session(player_id).await? else {
            debug!("Player has no live session");
            return Ok(None);
        };

        let restored = match row.reconstruct() {
            Ok(restored) => restored,
            Err(e) => {
                warn!(error = %e, "Treating player as having no session");
                self.mark_unrecoverable(row).await;
                return Ok(None);
            }
        };

        let game: Box<dyn GameInstance> = Box::new(restored);
        let entry = Arc::new(LiveSession {
            player_id: player_id.to_string(),
            started_at: row.started_at,
            game: Mutex::new(game),
        });

        let entry = {
            let mut live = self.live.write().await;
            match live.for_player(player_id) {
                Some(existing) => existing,
                None => {
                    live.insert(row.id.clone(), entry.clone());
                    info!(session_id = %row.id, "Session reconstructed from store");
                    entry
                }
            }
        };

        Ok(live_render(&entry).await)
    }

    #[instrument(skip(self, input))]
    pub async fn process_input(
        &self,
        session_id: &str,
        input: &GameInput,
    ) -> Result<RenderState, SessionError> {
        let entry = self.entry(session_id).await?;
        let mut game = entry.game.lock().await;
        ensure_live(&**game, session_id)?;

        match game.process_input(input) {
            Ok(render) => {
                self.persist(&**game).await?;
                debug!(score = render.score, finished = render.finished, "Input applied");
                Ok(render)
            }
            Err(GameError::Fault(reason)) => {
                error!(reason = %reason, "Game fault, retiring session");
                if let Err(e) = self.persist(&**game).await {
                    warn!(error = %e, "Failed to record faulted session");
                }
                drop(game);
                self.retire(session_id).await;
                Err(SessionError::GameFault(reason))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Current render payload; available until the session is retired
    pub async fn render_state(&self, session_id: &str) -> Result<RenderState, SessionError> {
        let entry = self.entry(session_id).await?;
        let game = entry.game.lock().await;
        Ok(game.render_state())
    }

    /// Adds the invited participant to a waiting game
    #[instrument(skip(self))]
    pub async fn join_session(
        &self,
        session_id: &str,
        participant: &str,
    ) -> Result<RenderState, SessionError> {
        let entry = self.entry(session_id).await?;
        let mut game = entry.game.lock().await;
        ensure_live(&**game, session_id)?;

        let render = game.join(participant)?;
        self.persist(&**game).await?;
        info!(state = %render.state, "Participant joined session");
        Ok(render)
    }

    #[instrument(skip(self))]
    pub async fn pause_session(&self, session_id: &str) -> Result<RenderState, SessionError> {
        let entry = self.entry(session_id).await?;
        let mut game = entry.game.lock().await;
        ensure_live(&**game, session_id)?;

        game.core_mut().pause()?;
        self.persist(&**game).await?;
        info!("Session paused");
        Ok(game.render_state())
    }

    #[instrument(skip(self))]
    pub async fn resume_session(&self, session_id: &str) -> Result<RenderState, SessionError> {
        let entry = self.entry(session_id).await?;
        let mut game = entry.game.lock().await;
        ensure_live(&**game, session_id)?;

        game.core_mut().resume()?;
        self.persist(&**game).await?;
        info!("Session resumed");
        Ok(game.render_state())
    }

    /// Ends the session and retires it from the live table.
    ///
    /// Completing applies rewards first; a reward failure is reported after the
    /// final snapshot has been written and the session removed.
    #[instrument(skip(self))]
    pub async fn end_session(
        &self,
        session_id: &str,
        reason: EndReason,
    ) -> Result<SessionSummary, SessionError> {
        let entry = self.entry(session_id).await?;
        let mut game = entry.game.lock().await;
        ensure_live(&**game, session_id)?;

        let outcome = game.end_game(reason)?;
        let rewards = match reason {
            EndReason::Completed => Some(self.rewards.apply(&outcome).await),
            EndReason::Abandoned => None,
        };

        let persisted = self.persist(&**game).await;
        if let Err(e) = &persisted {
            error!(error = %e, "Failed to record final session snapshot");
        }
        let render = game.render_state();
        drop(game);
        self.retire(session_id).await;

        info!(
            reason = %reason,
            score = outcome.score,
            duration_ms = outcome.duration_ms,
            "Session ended"
        );

        let rewards = match rewards {
            Some(Ok(result)) => Some(result),
            Some(Err(source)) => {
                return Err(SessionError::RewardApplication {
                    outcome: Box::new(outcome),
                    source,
                })
            }
            None => None,
        };
        persisted?;

        Ok(SessionSummary {
            outcome,
            rewards,
            render,
        })
    }

    /// Forces the session to `abandoned` from any non-terminal state; never pays rewards
    pub async fn abandon_session(&self, session_id: &str) -> Result<SessionSummary, SessionError> {
        self.end_session(session_id, EndReason::Abandoned).await
    }

    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now()).await
    }

    /// Abandons every session whose age at `now` exceeds the session timeout
    #[instrument(skip(self))]
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let timeout_ms = i64::try_from(self.sweep.session_timeout.as_millis()).unwrap_or(i64::MAX);

        let expired: Vec<String> = {
            let live = self.live.read().await;
            live.by_id
                .iter()
                .filter(|(_, session)| {
                    now.signed_duration_since(session.started_at)
                        .num_milliseconds()
                        > timeout_ms
                })
                .map(|(session_id, _)| session_id.clone())
                .collect()
        };

        if expired.is_empty() {
            return 0;
        }
        debug!(count = expired.len(), "Abandoning expired sessions");

        let results = join_all(expired.iter().map(|id| self.abandon_session(id))).await;

        let mut abandoned = 0;
        for (session_id, result) in expired.iter().zip(results) {
            match result {
                Ok(_) => {
                    abandoned += 1;
                    info!(session_id = %session_id, "Abandoned expired session");
                }
                Err(SessionError::NotFound(_)) => {
                    debug!(session_id = %session_id, "Session ended before the sweep reached it");
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Failed to abandon expired session");
                }
            }
        }
        abandoned
    }

    pub async fn active_count(&self) -> usize {
        self.live.read().await.by_id.len()
    }

    #[instrument(skip(self))]
    pub async fn player_history(
        &self,
        player_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionModel>, SessionError> {
        Ok(self
            .repository
            .list_player_sessions(player_id, limit)
            .await?)
    }

    async fn entry(&self, session_id: &str) -> Result<Arc<LiveSession>, SessionError> {
        self.live
            .read()
            .await
            .by_id
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    async fn retire(&self, session_id: &str) {
        if self.live.write().await.remove(session_id).is_some() {
            debug!(session_id = %session_id, "Session removed from live table");
        }
    }

    async fn persist(&self, game: &dyn GameInstance) -> Result<(), SessionError> {
        let model = SessionModel::from_instance(game)?;
        self.repository.update_session(&model).await?;
        Ok(())
    }

    async fn mark_unrecoverable(&self, mut row: SessionModel) {
        row.state = GameState::Error.to_string();
        row.updated_at = Utc::now();
        if let Err(e) = self.repository.update_session(&row).await {
            warn!(session_id = %row.id, error = %e, "Failed to mark stored session as error");
        }
    }
}

/// A session that reached a terminal state is as good as gone to callers
fn ensure_live(game: &dyn GameInstance, session_id: &str) -> Result<(), SessionError> {
    if game.state().is_terminal() {
        return Err(SessionError::NotFound(session_id.to_string()));
    }
    Ok(())
}

async fn live_render(entry: &LiveSession) -> Option<RenderState> {
    let game = entry.game.lock().await;
    (!game.state().is_terminal()).then(|| game.render_state())
}
