use thiserror::Error;

use crate::game::{GameError, GameOutcome, GameState};
use crate::rewards::RewardError;
use crate::shared::StoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Player {player_id} already has live session {session_id}")]
    Duplicate {
        player_id: String,
        session_id: String,
    },

    #[error("Session {0} not found")]
    NotFound(String),

    #[error("Cannot move session from {from} to {to}")]
    InvalidStateTransition { from: GameState, to: GameState },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The session ended and was recorded, but its rewards were not applied
    #[error("Session {} ended but reward application failed: {source}", .outcome.session_id)]
    RewardApplication {
        outcome: Box<GameOutcome>,
        source: RewardError,
    },

    #[error("Stored session {session_id} could not be reconstructed: {reason}")]
    Reconstruction { session_id: String, reason: String },

    #[error("Game fault: {0}")]
    GameFault(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<GameError> for SessionError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::InvalidTransition { from, to } => {
                SessionError::InvalidStateTransition { from, to }
            }
            GameError::Fault(reason) => SessionError::GameFault(reason),
            GameError::InvalidInput(msg) => SessionError::InvalidInput(msg),
            other @ (GameError::AlreadyInitialized | GameError::InvalidOptions(_)) => {
                SessionError::InvalidInput(other.to_string())
            }
        }
    }
}
