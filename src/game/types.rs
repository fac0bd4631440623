use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::tic_tac_toe::Mark;

/// Lifecycle state of a game instance
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameState {
    Waiting,
    Playing,
    Paused,
    Completed,
    Abandoned,
    Error,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameState::Completed | GameState::Abandoned | GameState::Error
        )
    }

    /// Playing or paused: the only states in which score, level and data may change
    pub fn is_active(self) -> bool {
        matches!(self, GameState::Playing | GameState::Paused)
    }

    pub fn can_transition_to(self, next: GameState) -> bool {
        use GameState::*;
        matches!(
            (self, next),
            (Waiting, Playing)
                | (Playing, Paused)
                | (Paused, Playing)
                | (Playing, Completed)
                | (Waiting | Playing | Paused, Abandoned)
                | (Waiting | Playing | Paused, Error)
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameType {
    PuzzleBlock,
    TicTacToe,
    Trivia,
}

/// Why a session is being ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndReason {
    Completed,
    Abandoned,
}

/// Options accepted by `GameInstance::initialize`; each game reads the fields it knows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameOptions {
    /// Second participant for two-player tic-tac-toe
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub question_count: Option<usize>,
    /// Fixes question order / piece sequence
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockMove {
    Left,
    Right,
    Rotate,
    SoftDrop,
    HardDrop,
}

/// One discrete player action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GameInput {
    Place {
        cell: usize,
        /// Acting participant; defaults to the session owner
        #[serde(default)]
        player_id: Option<String>,
    },
    Answer {
        choice: usize,
    },
    Move {
        direction: BlockMove,
    },
}

/// Game-specific part of a render payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameView {
    TicTacToe {
        board: Vec<Option<Mark>>,
        next_turn: Option<String>,
        winner: Option<Mark>,
        participants: Vec<String>,
    },
    Trivia {
        question_number: usize,
        total_questions: usize,
        prompt: Option<String>,
        choices: Vec<String>,
        correct_answers: u32,
        last_answer_correct: Option<bool>,
    },
    PuzzleBlock {
        rows: Vec<String>,
        next_piece: Option<char>,
        lines_cleared: u32,
    },
    /// Rebuilt from a stored snapshot; only the raw blob is available
    Restored { data: serde_json::Value },
}

/// Display payload returned after every action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    pub session_id: String,
    pub player_id: String,
    pub game_type: GameType,
    pub state: GameState,
    pub score: i64,
    pub level: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub finished: bool,
    pub view: GameView,
}

/// Game-specific metrics reported by `GameInstance::summarize`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeDetails {
    pub accuracy: Option<f64>,
    pub completed: bool,
    pub won: bool,
    pub extras: serde_json::Map<String, serde_json::Value>,
}

/// Final metrics of a play-through, handed to rewards and achievements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub session_id: String,
    pub player_id: String,
    pub game_type: GameType,
    pub reason: EndReason,
    pub score: i64,
    pub level: u32,
    pub duration_ms: u64,
    pub accuracy: Option<f64>,
    pub completed: bool,
    pub won: bool,
    #[serde(default)]
    pub extras: serde_json::Map<String, serde_json::Value>,
}
