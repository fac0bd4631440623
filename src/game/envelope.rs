use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EndReason, GameError, GameOutcome, GameState, GameType, OutcomeDetails};

/// Uniform session fields shared by every game type.
///
/// The registry only ever reads and transitions this envelope; everything
/// game-specific lives next to it in the concrete instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCore {
    id: String,
    player_id: String,
    game_type: GameType,
    state: GameState,
    score: i64,
    level: u32,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    participants: Vec<String>,
    required_participants: usize,
    initialized: bool,
    outcome: Option<GameOutcome>,
}

impl GameCore {
    /// Creates an uninitialized envelope with a fresh session id
    pub fn new(game_type: GameType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            player_id: String::new(),
            game_type,
            state: GameState::Waiting,
            score: 0,
            level: 1,
            started_at: Utc::now(),
            ended_at: None,
            participants: Vec::new(),
            required_participants: 1,
            initialized: false,
            outcome: None,
        }
    }

    /// Rebuilds an envelope from persisted fields
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: String,
        player_id: String,
        game_type: GameType,
        state: GameState,
        score: i64,
        level: u32,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            participants: vec![player_id.clone()],
            id,
            player_id,
            game_type,
            state,
            score,
            level,
            started_at,
            ended_at,
            required_participants: 1,
            initialized: true,
            outcome: None,
        }
    }

    /// Binds the owner and enters the initial state: `playing` for
    /// single-player games, `waiting` until enough participants have joined otherwise.
    pub fn begin(&mut self, player_id: &str, required_participants: usize) -> Result<(), GameError> {
        if self.initialized {
            return Err(GameError::AlreadyInitialized);
        }
        if player_id.trim().is_empty() {
            return Err(GameError::InvalidOptions(
                "player id cannot be empty".to_string(),
            ));
        }

        self.player_id = player_id.to_string();
        self.participants = vec![player_id.to_string()];
        self.required_participants = required_participants.max(1);
        self.started_at = Utc::now();
        self.initialized = true;
        self.state = if self.required_participants > 1 {
            GameState::Waiting
        } else {
            GameState::Playing
        };
        Ok(())
    }

    /// Adds a participant to a waiting game, starting it once the table is full
    pub fn join(&mut self, participant: &str) -> Result<(), GameError> {
        if self.state != GameState::Waiting {
            return Err(GameError::InvalidTransition {
                from: self.state,
                to: GameState::Playing,
            });
        }
        if self.participants.iter().any(|p| p == participant) {
            return Err(GameError::InvalidInput(format!(
                "{} has already joined",
                participant
            )));
        }

        self.participants.push(participant.to_string());
        if self.participants.len() >= self.required_participants {
            self.transition(GameState::Playing)?;
            self.started_at = Utc::now();
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), GameError> {
        self.transition(GameState::Paused)
    }

    pub fn resume(&mut self) -> Result<(), GameError> {
        self.transition(GameState::Playing)
    }

    pub fn complete(&mut self) -> Result<(), GameError> {
        self.transition(GameState::Completed)?;
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    pub fn abandon(&mut self) -> Result<(), GameError> {
        self.transition(GameState::Abandoned)?;
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    /// Stops the instance after an internal fault; score and level are kept
    pub fn fail(&mut self) -> Result<(), GameError> {
        self.transition(GameState::Error)?;
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: GameState) -> Result<(), GameError> {
        if !self.state.can_transition_to(next) {
            return Err(GameError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn add_score(&mut self, delta: i64) -> Result<(), GameError> {
        self.ensure_active()?;
        self.score += delta;
        Ok(())
    }

    pub fn set_level(&mut self, level: u32) -> Result<(), GameError> {
        self.ensure_active()?;
        self.level = level.max(1);
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(GameError::InvalidInput(format!(
                "game is {}, not playing",
                self.state
            )))
        }
    }

    /// Milliseconds between start and end (or now, while still running)
    pub fn duration_ms(&self) -> u64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0) as u64
    }

    /// Moves the start time, e.g. when restoring or replaying a session
    pub fn set_started_at(&mut self, started_at: DateTime<Utc>) {
        self.started_at = started_at;
    }

    /// Builds the terminal outcome once and caches it
    pub(crate) fn finish_with(&mut self, reason: EndReason, details: OutcomeDetails) -> GameOutcome {
        let outcome = GameOutcome {
            session_id: self.id.clone(),
            player_id: self.player_id.clone(),
            game_type: self.game_type,
            reason,
            score: self.score,
            level: self.level,
            duration_ms: self.duration_ms(),
            accuracy: details.accuracy,
            completed: details.completed,
            won: details.won,
            extras: details.extras,
        };
        self.outcome = Some(outcome.clone());
        outcome
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_core() -> GameCore {
        let mut core = GameCore::new(GameType::Trivia);
        core.begin("player-1", 1).unwrap();
        core
    }

    #[test]
    fn single_player_begins_playing() {
        let core = playing_core();
        assert_eq!(core.state(), GameState::Playing);
        assert_eq!(core.level(), 1);
        assert_eq!(core.score(), 0);
        assert_eq!(core.player_id(), "player-1");
        assert!(!core.id().is_empty());
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut core = playing_core();
        assert_eq!(
            core.begin("player-2", 1),
            Err(GameError::AlreadyInitialized)
        );
        assert_eq!(core.player_id(), "player-1");
    }

    #[test]
    fn multi_player_waits_for_participants() {
        let mut core = GameCore::new(GameType::TicTacToe);
        core.begin("host", 2).unwrap();
        assert_eq!(core.state(), GameState::Waiting);

        assert!(matches!(
            core.join("host"),
            Err(GameError::InvalidInput(_))
        ));
        core.join("guest").unwrap();
        assert_eq!(core.state(), GameState::Playing);
        assert_eq!(core.participants(), ["host", "guest"]);

        assert!(matches!(
            core.join("late"),
            Err(GameError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn illegal_transition_leaves_state_unchanged() {
        let mut core = playing_core();
        let err = core.resume().unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidTransition {
                from: GameState::Playing,
                to: GameState::Playing
            }
        );
        assert_eq!(core.state(), GameState::Playing);

        core.pause().unwrap();
        assert!(core.complete().is_err());
        assert_eq!(core.state(), GameState::Paused);
        assert!(core.ended_at().is_none());
    }

    #[test]
    fn score_only_changes_while_active() {
        let mut core = playing_core();
        core.add_score(15).unwrap();
        core.pause().unwrap();
        core.add_score(-5).unwrap();
        assert_eq!(core.score(), 10);

        core.abandon().unwrap();
        assert!(core.add_score(100).is_err());
        assert!(core.set_level(3).is_err());
        assert_eq!(core.score(), 10);
        assert_eq!(core.level(), 1);
    }

    #[test]
    fn fault_preserves_progress() {
        let mut core = playing_core();
        core.add_score(42).unwrap();
        core.set_level(2).unwrap();
        core.fail().unwrap();

        assert_eq!(core.state(), GameState::Error);
        assert_eq!(core.score(), 42);
        assert_eq!(core.level(), 2);
        assert!(core.ended_at().is_some());
        assert!(core.fail().is_err());
    }

    #[test]
    fn duration_measures_from_start() {
        let mut core = playing_core();
        core.set_started_at(Utc::now() - chrono::Duration::seconds(90));
        core.complete().unwrap();
        let duration = core.duration_ms();
        assert!((90_000..95_000).contains(&duration));
    }
}
