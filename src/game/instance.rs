use super::{
    EndReason, GameCore, GameError, GameInput, GameOptions, GameOutcome, GameState, GameType,
    GameView, OutcomeDetails, RenderState,
};

/// Capability contract every game type satisfies.
///
/// Implementors provide the game-specific rules; the provided methods apply
/// the uniform lifecycle checks so that each game only has to care about its
/// own board, questions or pieces.
pub trait GameInstance: Send + Sync {
    fn core(&self) -> &GameCore;

    fn core_mut(&mut self) -> &mut GameCore;

    /// Allocates fresh internal state; may only succeed once per instance
    fn initialize(&mut self, player_id: &str, options: &GameOptions) -> Result<(), GameError>;

    /// Applies one action to the game-specific state. Only called while playing.
    fn apply_input(&mut self, input: &GameInput) -> Result<(), GameError>;

    fn view(&self) -> GameView;

    /// True once the game's own termination condition has been met
    fn is_finished(&self) -> bool;

    fn summarize(&self) -> OutcomeDetails;

    /// Serialized game-specific state for the session row
    fn snapshot_data(&self) -> Result<serde_json::Value, GameError>;

    fn id(&self) -> &str {
        self.core().id()
    }

    fn player_id(&self) -> &str {
        self.core().player_id()
    }

    fn game_type(&self) -> GameType {
        self.core().game_type()
    }

    fn state(&self) -> GameState {
        self.core().state()
    }

    fn process_input(&mut self, input: &GameInput) -> Result<RenderState, GameError> {
        let state = self.state();
        if state != GameState::Playing {
            return Err(GameError::InvalidInput(format!(
                "game is {}, not playing",
                state
            )));
        }
        if self.is_finished() {
            return Err(GameError::InvalidInput("game is already over".to_string()));
        }

        match self.apply_input(input) {
            Ok(()) => Ok(self.render_state()),
            Err(GameError::Fault(reason)) => {
                self.core_mut().fail()?;
                Err(GameError::Fault(reason))
            }
            Err(e) => Err(e),
        }
    }

    fn render_state(&self) -> RenderState {
        let core = self.core();
        RenderState {
            session_id: core.id().to_string(),
            player_id: core.player_id().to_string(),
            game_type: core.game_type(),
            state: core.state(),
            score: core.score(),
            level: core.level(),
            started_at: core.started_at(),
            ended_at: core.ended_at(),
            finished: self.is_finished(),
            view: self.view(),
        }
    }

    fn join(&mut self, participant: &str) -> Result<RenderState, GameError> {
        self.core_mut().join(participant)?;
        Ok(self.render_state())
    }

    /// Moves to the terminal state for `reason` and reports the outcome.
    /// Later calls return the first outcome without touching the instance.
    ///
    /// Completion is only legal once `is_finished` holds; an unfinished game
    /// can only be abandoned.
    fn end_game(&mut self, reason: EndReason) -> Result<GameOutcome, GameError> {
        if let Some(outcome) = self.core().outcome() {
            return Ok(outcome.clone());
        }

        match reason {
            EndReason::Completed if !self.is_finished() => {
                return Err(GameError::InvalidTransition {
                    from: self.state(),
                    to: GameState::Completed,
                });
            }
            EndReason::Completed => self.core_mut().complete()?,
            EndReason::Abandoned => self.core_mut().abandon()?,
        }

        let details = self.summarize();
        Ok(self.core_mut().finish_with(reason, details))
    }
}
