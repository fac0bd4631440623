use serde::{Deserialize, Serialize};

use super::{
    GameCore, GameError, GameInput, GameInstance, GameOptions, GameType, GameView, OutcomeDetails,
};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

// Centre, corners, then edges
const CPU_PREFERENCE: [usize; 9] = [4, 0, 2, 6, 8, 1, 3, 5, 7];

const WIN_POINTS: i64 = 100;
const DRAW_POINTS: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Board {
    cells: [Option<Mark>; 9],
    moves: u32,
    winner: Option<Mark>,
    /// Human O player; the CPU plays O when absent
    opponent: Option<String>,
}

impl Board {
    fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|line| {
            let first = self.cells[line[0]]?;
            line.iter()
                .all(|&cell| self.cells[cell] == Some(first))
                .then_some(first)
        })
    }

    fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    fn is_over(&self) -> bool {
        self.winner.is_some() || self.is_full()
    }

    fn to_move(&self) -> Mark {
        if self.moves % 2 == 0 {
            Mark::X
        } else {
            Mark::O
        }
    }

    /// Cell that would complete a line for `mark`, if any
    fn completing_cell(&self, mark: Mark) -> Option<usize> {
        LINES.iter().find_map(|line| {
            let owned = line
                .iter()
                .filter(|&&cell| self.cells[cell] == Some(mark))
                .count();
            let empty = line.iter().find(|&&cell| self.cells[cell].is_none());
            match (owned, empty) {
                (2, Some(&cell)) => Some(cell),
                _ => None,
            }
        })
    }

    fn cpu_choice(&self) -> Option<usize> {
        self.completing_cell(Mark::O)
            .or_else(|| self.completing_cell(Mark::X))
            .or_else(|| {
                CPU_PREFERENCE
                    .iter()
                    .copied()
                    .find(|&cell| self.cells[cell].is_none())
            })
    }

    fn place(&mut self, cell: usize, mark: Mark) {
        self.cells[cell] = Some(mark);
        self.moves += 1;
        self.winner = self.winner();
    }
}

/// Tic-tac-toe against the CPU, or against a second participant when an
/// opponent is given in the options. The session owner always plays X.
pub struct TicTacToe {
    core: GameCore,
    board: Board,
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToe {
    pub fn new() -> Self {
        Self {
            core: GameCore::new(GameType::TicTacToe),
            board: Board::default(),
        }
    }

    fn participant_for(&self, mark: Mark) -> Option<&str> {
        match mark {
            Mark::X => Some(self.core.player_id()),
            Mark::O => self.board.opponent.as_deref(),
        }
    }

    fn settle(&mut self) -> Result<(), GameError> {
        match self.board.winner {
            Some(Mark::X) => self.core.add_score(WIN_POINTS),
            Some(Mark::O) => Ok(()),
            None if self.board.is_full() => self.core.add_score(DRAW_POINTS),
            None => Ok(()),
        }
    }
}

impl GameInstance for TicTacToe {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn initialize(&mut self, player_id: &str, options: &GameOptions) -> Result<(), GameError> {
        if let Some(opponent) = &options.opponent {
            if opponent == player_id {
                return Err(GameError::InvalidOptions(
                    "cannot play against yourself".to_string(),
                ));
            }
        }

        let participants = if options.opponent.is_some() { 2 } else { 1 };
        self.core.begin(player_id, participants)?;
        self.board = Board {
            opponent: options.opponent.clone(),
            ..Board::default()
        };
        Ok(())
    }

    fn join(&mut self, participant: &str) -> Result<super::RenderState, GameError> {
        if self.board.opponent.as_deref() != Some(participant) {
            return Err(GameError::InvalidInput(format!(
                "{} was not invited to this game",
                participant
            )));
        }
        self.core.join(participant)?;
        Ok(self.render_state())
    }

    fn apply_input(&mut self, input: &GameInput) -> Result<(), GameError> {
        let (cell, actor) = match input {
            GameInput::Place { cell, player_id } => (*cell, player_id.as_deref()),
            other => {
                return Err(GameError::InvalidInput(format!(
                    "tic-tac-toe does not accept {:?}",
                    other
                )))
            }
        };

        if cell >= self.board.cells.len() {
            return Err(GameError::InvalidInput(format!(
                "cell {} is off the board",
                cell
            )));
        }
        if self.board.cells[cell].is_some() {
            return Err(GameError::InvalidInput(format!(
                "cell {} is already taken",
                cell
            )));
        }

        let mark = self.board.to_move();
        let expected = self
            .participant_for(mark)
            .ok_or_else(|| GameError::Fault("CPU turn pending on a human move".to_string()))?;
        let actor = actor.unwrap_or(self.core.player_id());
        if actor != expected {
            return Err(GameError::InvalidInput(format!(
                "it is {}'s turn",
                expected
            )));
        }

        self.board.place(cell, mark);

        if self.board.opponent.is_none() && !self.board.is_over() {
            let reply = self
                .board
                .cpu_choice()
                .ok_or_else(|| GameError::Fault("no free cell for the CPU".to_string()))?;
            self.board.place(reply, mark.other());
        }

        if self.board.is_over() {
            self.settle()?;
        }
        Ok(())
    }

    fn view(&self) -> GameView {
        let next_turn = if self.board.is_over() {
            None
        } else {
            Some(
                self.participant_for(self.board.to_move())
                    .unwrap_or("cpu")
                    .to_string(),
            )
        };

        GameView::TicTacToe {
            board: self.board.cells.to_vec(),
            next_turn,
            winner: self.board.winner,
            participants: self.core.participants().to_vec(),
        }
    }

    fn is_finished(&self) -> bool {
        self.board.is_over()
    }

    fn summarize(&self) -> OutcomeDetails {
        let mut extras = serde_json::Map::new();
        extras.insert("moves".into(), self.board.moves.into());
        extras.insert(
            "draw".into(),
            (self.board.winner.is_none() && self.board.is_full()).into(),
        );
        extras.insert("versus_cpu".into(), self.board.opponent.is_none().into());

        OutcomeDetails {
            accuracy: None,
            completed: self.board.is_over(),
            won: self.board.winner == Some(Mark::X),
            extras,
        }
    }

    fn snapshot_data(&self) -> Result<serde_json::Value, GameError> {
        serde_json::to_value(&self.board).map_err(|e| GameError::Fault(e.to_string()))
    }
}
