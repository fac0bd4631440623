// Public API
pub use envelope::GameCore;
pub use errors::GameError;
pub use instance::GameInstance;
pub use puzzle_block::{PuzzleBlock, Tetromino};
pub use reconstructed::ReconstructedGame;
pub use tic_tac_toe::{Mark, TicTacToe};
pub use trivia::Trivia;
pub use types::{
    BlockMove, EndReason, GameInput, GameOptions, GameOutcome, GameState, GameType, GameView,
    OutcomeDetails, RenderState,
};

// Internal modules
mod envelope;
mod errors;
mod instance;
mod puzzle_block;
mod reconstructed;
mod tic_tac_toe;
mod trivia;
mod types;

/// Builds and initializes a fresh instance of `game_type` owned by `player_id`
pub fn new_instance(
    game_type: GameType,
    player_id: &str,
    options: &GameOptions,
) -> Result<Box<dyn GameInstance>, GameError> {
    let mut instance: Box<dyn GameInstance> = match game_type {
        GameType::PuzzleBlock => Box::new(PuzzleBlock::new()),
        GameType::TicTacToe => Box::new(TicTacToe::new()),
        GameType::Trivia => Box::new(Trivia::new()),
    };
    instance.initialize(player_id, options)?;
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn factory_builds_each_game_type() {
        for game_type in GameType::iter() {
            let instance = new_instance(game_type, "alice", &GameOptions::default()).unwrap();
            assert_eq!(instance.game_type(), game_type);
            assert_eq!(instance.player_id(), "alice");
            assert_eq!(instance.state(), GameState::Playing);
            assert!(instance.snapshot_data().is_ok());
        }
    }

    #[test]
    fn factory_reports_bad_options() {
        let options = GameOptions {
            question_count: Some(0),
            ..GameOptions::default()
        };
        assert!(matches!(
            new_instance(GameType::Trivia, "alice", &options),
            Err(GameError::InvalidOptions(_))
        ));
        assert!(new_instance(GameType::TicTacToe, "  ", &GameOptions::default()).is_err());
    }
}
