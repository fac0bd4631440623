use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{
    BlockMove, GameCore, GameError, GameInput, GameInstance, GameOptions, GameType, GameView,
    OutcomeDetails,
};

const WIDTH: usize = 10;
const HEIGHT: usize = 20;
const SPAWN_COL: i32 = 4;
const LINE_POINTS: [i64; 5] = [0, 40, 100, 300, 1200];
const LINES_PER_LEVEL: u32 = 10;
const HARD_DROP_POINTS_PER_ROW: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tetromino {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl Tetromino {
    const ALL: [Tetromino; 7] = [
        Tetromino::I,
        Tetromino::O,
        Tetromino::T,
        Tetromino::S,
        Tetromino::Z,
        Tetromino::J,
        Tetromino::L,
    ];

    /// (column, row) offsets around the pivot, rows grow downwards
    fn offsets(self) -> [(i32, i32); 4] {
        match self {
            Tetromino::I => [(-1, 0), (0, 0), (1, 0), (2, 0)],
            Tetromino::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
            Tetromino::T => [(-1, 0), (0, 0), (1, 0), (0, 1)],
            Tetromino::S => [(0, 0), (1, 0), (-1, 1), (0, 1)],
            Tetromino::Z => [(-1, 0), (0, 0), (0, 1), (1, 1)],
            Tetromino::J => [(-1, 0), (0, 0), (1, 0), (1, 1)],
            Tetromino::L => [(-1, 0), (0, 0), (1, 0), (-1, 1)],
        }
    }

    fn letter(self) -> char {
        match self {
            Tetromino::I => 'I',
            Tetromino::O => 'O',
            Tetromino::T => 'T',
            Tetromino::S => 'S',
            Tetromino::Z => 'Z',
            Tetromino::J => 'J',
            Tetromino::L => 'L',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Piece {
    kind: Tetromino,
    rotation: u8,
    col: i32,
    row: i32,
}

impl Piece {
    fn spawn(kind: Tetromino) -> Self {
        Self {
            kind,
            rotation: 0,
            col: SPAWN_COL,
            row: 0,
        }
    }

    fn cells(&self) -> [(i32, i32); 4] {
        let mut cells = self.kind.offsets();
        if self.kind != Tetromino::O {
            for _ in 0..self.rotation % 4 {
                for cell in cells.iter_mut() {
                    *cell = (-cell.1, cell.0);
                }
            }
        }
        cells.map(|(col, row)| (self.col + col, self.row + row))
    }

    fn shifted(&self, cols: i32, rows: i32) -> Self {
        Self {
            col: self.col + cols,
            row: self.row + rows,
            ..*self
        }
    }

    fn rotated(&self) -> Self {
        Self {
            rotation: (self.rotation + 1) % 4,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Well {
    grid: Vec<Vec<Option<Tetromino>>>,
    active: Option<Piece>,
    bag: Vec<Tetromino>,
    lines_cleared: u32,
    pieces_locked: u32,
    topped_out: bool,
}

impl Well {
    fn empty() -> Self {
        Self {
            grid: vec![vec![None; WIDTH]; HEIGHT],
            active: None,
            bag: Vec::new(),
            lines_cleared: 0,
            pieces_locked: 0,
            topped_out: false,
        }
    }

    fn fits(&self, piece: &Piece) -> bool {
        piece.cells().iter().all(|&(col, row)| {
            col >= 0
                && row >= 0
                && (col as usize) < WIDTH
                && (row as usize) < HEIGHT
                && self.grid[row as usize][col as usize].is_none()
        })
    }

    fn lock(&mut self, piece: &Piece) {
        for (col, row) in piece.cells() {
            if let Some(cell) = self
                .grid
                .get_mut(row as usize)
                .and_then(|r| r.get_mut(col as usize))
            {
                *cell = Some(piece.kind);
            }
        }
        self.pieces_locked += 1;
    }

    /// Removes full rows and returns how many were cleared
    fn clear_lines(&mut self) -> u32 {
        self.grid.retain(|row| row.iter().any(Option::is_none));
        let cleared = HEIGHT - self.grid.len();
        for _ in 0..cleared {
            self.grid.insert(0, vec![None; WIDTH]);
        }
        cleared as u32
    }

    fn rows(&self) -> Vec<String> {
        let active_cells = self.active.map(|piece| piece.cells());
        self.grid
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(col, cell)| {
                        let is_active = active_cells.is_some_and(|active| {
                            active.contains(&(col as i32, row as i32))
                        });
                        match (is_active, cell, self.active) {
                            (true, _, Some(piece)) => piece.kind.letter().to_ascii_lowercase(),
                            (_, Some(kind), _) => kind.letter(),
                            _ => '.',
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Falling-block puzzle: pieces drop one row after every input until the
/// stack reaches the top of the well.
pub struct PuzzleBlock {
    core: GameCore,
    well: Well,
    rng: StdRng,
}

impl Default for PuzzleBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl PuzzleBlock {
    pub fn new() -> Self {
        Self {
            core: GameCore::new(GameType::PuzzleBlock),
            well: Well::empty(),
            rng: StdRng::seed_from_u64(0),
        }
    }

    fn next_piece(&mut self) -> Result<Tetromino, GameError> {
        if self.well.bag.is_empty() {
            self.refill_bag();
        }
        let kind = self
            .well
            .bag
            .pop()
            .ok_or_else(|| GameError::Fault("piece bag is empty".to_string()))?;
        if self.well.bag.is_empty() {
            self.refill_bag();
        }
        Ok(kind)
    }

    fn refill_bag(&mut self) {
        let mut bag = Tetromino::ALL.to_vec();
        bag.shuffle(&mut self.rng);
        self.well.bag = bag;
    }

    fn spawn(&mut self) -> Result<(), GameError> {
        let piece = Piece::spawn(self.next_piece()?);
        if self.well.fits(&piece) {
            self.well.active = Some(piece);
        } else {
            self.well.active = None;
            self.well.topped_out = true;
        }
        Ok(())
    }

    fn settle(&mut self, piece: Piece) -> Result<(), GameError> {
        self.well.lock(&piece);
        self.well.active = None;

        let cleared = self.well.clear_lines();
        if cleared > 0 {
            let points = LINE_POINTS
                .get(cleared as usize)
                .copied()
                .ok_or_else(|| GameError::Fault(format!("cleared {} lines at once", cleared)))?;
            self.core.add_score(points * i64::from(self.core.level()))?;
            self.well.lines_cleared += cleared;
            self.core
                .set_level(1 + self.well.lines_cleared / LINES_PER_LEVEL)?;
        }

        self.spawn()
    }
}

impl GameInstance for PuzzleBlock {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn initialize(&mut self, player_id: &str, options: &GameOptions) -> Result<(), GameError> {
        self.core.begin(player_id, 1)?;
        self.rng = StdRng::seed_from_u64(options.seed.unwrap_or_else(rand::random));
        self.well = Well::empty();
        self.spawn()
    }

    fn apply_input(&mut self, input: &GameInput) -> Result<(), GameError> {
        let direction = match input {
            GameInput::Move { direction } => *direction,
            other => {
                return Err(GameError::InvalidInput(format!(
                    "puzzle block does not accept {:?}",
                    other
                )))
            }
        };

        let mut piece = self
            .well
            .active
            .ok_or_else(|| GameError::Fault("no active piece".to_string()))?;

        let candidate = match direction {
            BlockMove::Left => piece.shifted(-1, 0),
            BlockMove::Right => piece.shifted(1, 0),
            BlockMove::Rotate => piece.rotated(),
            BlockMove::SoftDrop => piece.shifted(0, 1),
            BlockMove::HardDrop => {
                let mut rows = 0;
                while self.well.fits(&piece.shifted(0, 1)) {
                    piece = piece.shifted(0, 1);
                    rows += 1;
                }
                self.core.add_score(rows * HARD_DROP_POINTS_PER_ROW)?;
                return self.settle(piece);
            }
        };

        // Blocked moves are ignored, gravity still applies
        if self.well.fits(&candidate) {
            if direction == BlockMove::SoftDrop {
                self.core.add_score(1)?;
            }
            piece = candidate;
        }

        let fallen = piece.shifted(0, 1);
        if self.well.fits(&fallen) {
            self.well.active = Some(fallen);
            Ok(())
        } else {
            self.settle(piece)
        }
    }

    fn view(&self) -> GameView {
        GameView::PuzzleBlock {
            rows: self.well.rows(),
            next_piece: self.well.bag.last().map(|kind| kind.letter()),
            lines_cleared: self.well.lines_cleared,
        }
    }

    fn is_finished(&self) -> bool {
        self.well.topped_out
    }

    fn summarize(&self) -> OutcomeDetails {
        let mut extras = serde_json::Map::new();
        extras.insert("lines_cleared".into(), self.well.lines_cleared.into());
        extras.insert("pieces_locked".into(), self.well.pieces_locked.into());

        OutcomeDetails {
            accuracy: None,
            completed: self.well.topped_out,
            won: self.well.lines_cleared > 0,
            extras,
        }
    }

    fn snapshot_data(&self) -> Result<serde_json::Value, GameError> {
        serde_json::to_value(&self.well).map_err(|e| GameError::Fault(e.to_string()))
    }
}
