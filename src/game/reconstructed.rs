use super::{
    GameCore, GameError, GameInput, GameInstance, GameOptions, GameView, OutcomeDetails,
    RenderState,
};

/// Reduced instance rebuilt from a stored session row.
///
/// Only the uniform envelope and the raw data blob survive a restart, so the
/// game-specific rules are not available: it can be inspected, paused,
/// resumed or abandoned, but every move and join is rejected, and it never
/// counts as finished so it cannot be completed.
pub struct ReconstructedGame {
    core: GameCore,
    data: serde_json::Value,
}

impl ReconstructedGame {
    pub fn new(core: GameCore, data: serde_json::Value) -> Self {
        Self { core, data }
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }
}

impl GameInstance for ReconstructedGame {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn initialize(&mut self, _player_id: &str, _options: &GameOptions) -> Result<(), GameError> {
        Err(GameError::AlreadyInitialized)
    }

    fn apply_input(&mut self, _input: &GameInput) -> Result<(), GameError> {
        Err(GameError::InvalidInput(
            "this game was restored after a restart and cannot continue; abandon it to start a new one"
                .to_string(),
        ))
    }

    fn join(&mut self, _participant: &str) -> Result<RenderState, GameError> {
        Err(GameError::InvalidInput(
            "this game was restored after a restart and cannot take new players".to_string(),
        ))
    }

    fn view(&self) -> GameView {
        GameView::Restored {
            data: self.data.clone(),
        }
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn summarize(&self) -> OutcomeDetails {
        let mut extras = serde_json::Map::new();
        extras.insert("restored".into(), true.into());
        OutcomeDetails {
            extras,
            ..OutcomeDetails::default()
        }
    }

    fn snapshot_data(&self) -> Result<serde_json::Value, GameError> {
        Ok(self.data.clone())
    }
}
