use thiserror::Error;

use super::GameState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot move game from {from} to {to}")]
    InvalidTransition { from: GameState, to: GameState },

    #[error("Game has already been initialized")]
    AlreadyInitialized,

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Unrecoverable internal fault; the instance moves to `error`
    #[error("Game fault: {0}")]
    Fault(String),
}
