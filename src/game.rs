//! Game engine: board grid, active piece, collision, lock, line clear, score.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

/// Default board width in cells.
pub const BOARD_X: u16 = 10;
/// Default board height in cells.
pub const BOARD_Y: u16 = 20;
/// Points awarded for each cleared row.
pub const LINE_SCORE: u32 = 100;

/// Board cell state. `value()` gives the 0/1/2 code the presentation layer keys colours on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Falling,
    Locked,
}

impl Cell {
    pub fn value(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Falling => 1,
            Self::Locked => 2,
        }
    }
}

/// Filled/unfilled pattern of a piece's bounding box, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    /// Build from 0/1 rows. Rows are expected to share one width.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|&v| v != 0).collect())
                .collect(),
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[cfg(test)]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Offsets `(dx, dy)` of every filled sub-cell relative to the top-left anchor.
    pub fn filled_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &filled)| filled)
                .map(move |(x, _)| (x as i32, y as i32))
        })
    }

    /// 90° clockwise rotation into a fresh W×H matrix: (row y, col x) -> (row x, col H-1-y).
    pub fn rotated_cw(&self) -> Self {
        let (h, w) = (self.height(), self.width());
        let mut rows = vec![vec![false; h]; w];
        for (y, row) in self.rows.iter().enumerate() {
            for (x, &filled) in row.iter().enumerate() {
                if filled {
                    rows[x][h - 1 - y] = true;
                }
            }
        }
        Self { rows }
    }
}

/// Catalog entries. The classic set is line, square and T; the standard set adds S, Z, J, L.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl ShapeKind {
    pub const CLASSIC: [Self; 3] = [Self::I, Self::O, Self::T];
    pub const STANDARD: [Self; 7] = [Self::I, Self::O, Self::T, Self::S, Self::Z, Self::J, Self::L];

    pub fn shape(self) -> Shape {
        match self {
            Self::I => Shape::from_rows(&[&[1, 1, 1, 1]]),
            Self::O => Shape::from_rows(&[&[1, 1], &[1, 1]]),
            Self::T => Shape::from_rows(&[&[1, 1, 1], &[0, 1, 0]]),
            Self::S => Shape::from_rows(&[&[0, 1, 1], &[1, 1, 0]]),
            Self::Z => Shape::from_rows(&[&[1, 1, 0], &[0, 1, 1]]),
            Self::J => Shape::from_rows(&[&[1, 0, 0], &[1, 1, 1]]),
            Self::L => Shape::from_rows(&[&[0, 0, 1], &[1, 1, 1]]),
        }
    }
}

/// Shapes a game draws from.
pub fn catalog(set: crate::PieceSet) -> &'static [ShapeKind] {
    match set {
        crate::PieceSet::Classic => &ShapeKind::CLASSIC,
        crate::PieceSet::Standard => &ShapeKind::STANDARD,
    }
}

/// The falling piece: top-left anchor on the board plus its current shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub x: i32,
    pub y: i32,
    pub shape: Shape,
}

impl Piece {
    pub fn new(kind: ShapeKind, x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            shape: kind.shape(),
        }
    }
}

/// What `Game::place` writes into the piece's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceMode {
    Active,
    Remove,
    Stick,
}

/// A requested translation and/or rotation of the active piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Movement {
    pub dx: i32,
    pub dy: i32,
    pub rotate: bool,
}

impl Movement {
    pub const fn down() -> Self {
        Self { dx: 0, dy: 1, rotate: false }
    }

    pub const fn left() -> Self {
        Self { dx: -1, dy: 0, rotate: false }
    }

    pub const fn right() -> Self {
        Self { dx: 1, dy: 0, rotate: false }
    }

    pub const fn rotate() -> Self {
        Self { dx: 0, dy: 0, rotate: true }
    }
}

/// Result of `Game::move_piece`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Sideways or rotation attempt blocked; nothing changed.
    Blocked,
    /// Piece could not fall further and was locked; `lines` rows were cleared.
    Locked { lines: u32 },
    /// Game over or no active piece.
    Ignored,
}

/// Grid of cells. y=0 is the top row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    rows: VecDeque<Vec<Cell>>,
}

impl Board {
    pub fn new(width: u16, height: u16) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            width,
            height,
            rows: (0..height).map(|_| vec![Cell::Empty; width]).collect(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    /// Out-of-range writes are dropped.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if x < 0 || y < 0 {
            return;
        }
        if let Some(slot) = self
            .rows
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            *slot = cell;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn count(&self, cell: Cell) -> usize {
        self.rows.iter().flatten().filter(|&&c| c == cell).count()
    }

    /// Remove every fully locked row and push an empty row on top for each one.
    /// All full rows are found before any is removed, so adjacent full rows are all counted.
    pub fn clear_full_rows(&mut self) -> u32 {
        let before = self.rows.len();
        self.rows.retain(|row| !row.iter().all(|&c| c == Cell::Locked));
        let cleared = before - self.rows.len();
        for _ in 0..cleared {
            self.rows.push_front(vec![Cell::Empty; self.width]);
        }
        cleared as u32
    }
}

/// Board size, catalog and RNG seed for a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub width: u16,
    pub height: u16,
    pub pieces: crate::PieceSet,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: BOARD_X,
            height: BOARD_Y,
            pieces: crate::PieceSet::Classic,
            seed: None,
        }
    }
}

/// One game: board, active piece, score and the terminal game-over flag.
#[derive(Debug)]
pub struct Game {
    pub board: Board,
    pub piece: Option<Piece>,
    pub score: u32,
    pub lines_cleared: u32,
    pub game_over: bool,
    catalog: &'static [ShapeKind],
    rng: StdRng,
}

impl Game {
    /// Empty board of the configured size with the first piece spawned.
    pub fn new(config: &EngineConfig) -> Self {
        Self::from_board(Board::new(config.width, config.height), None, config)
    }

    /// Game over an existing board. A given piece is stamped as falling without validation;
    /// otherwise a piece is spawned the normal way. Only `pieces` and `seed` are read from `config`.
    pub fn from_board(board: Board, piece: Option<Piece>, config: &EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut game = Self {
            board,
            piece,
            score: 0,
            lines_cleared: 0,
            game_over: false,
            catalog: catalog(config.pieces),
            rng,
        };
        if game.piece.is_some() {
            game.place(PlaceMode::Active);
        } else {
            game.generate_piece();
        }
        game
    }

    /// Spawn a random piece centred at the top. Sets `game_over` instead if it collides.
    pub fn generate_piece(&mut self) {
        let kind = self
            .catalog
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(ShapeKind::I);
        let shape_width = kind.shape().width() as i32;
        let x = self.board.width() as i32 / 2 - shape_width / 2;
        self.piece = Some(Piece::new(kind, x, 0));
        if self.check(0, 0, None) {
            self.place(PlaceMode::Active);
        } else {
            self.game_over = true;
            self.piece = None;
        }
    }

    /// True if the active piece, offset by (dx, dy) and optionally with `shape` substituted,
    /// stays inside the side walls and above the floor without touching a locked cell.
    /// Cells above the top edge are allowed and never collision-checked.
    pub fn check(&self, dx: i32, dy: i32, shape: Option<&Shape>) -> bool {
        let Some(piece) = &self.piece else {
            return false;
        };
        let shape = shape.unwrap_or(&piece.shape);
        let width = self.board.width() as i32;
        let height = self.board.height() as i32;
        shape.filled_cells().all(|(sx, sy)| {
            let nx = piece.x + sx + dx;
            let ny = piece.y + sy + dy;
            if nx < 0 || nx >= width || ny >= height {
                return false;
            }
            ny < 0 || self.board.get(nx, ny) != Some(Cell::Locked)
        })
    }

    /// Write the active piece's filled cells as falling, empty or locked.
    pub fn place(&mut self, mode: PlaceMode) {
        let Some(piece) = &self.piece else {
            return;
        };
        let cell = match mode {
            PlaceMode::Active => Cell::Falling,
            PlaceMode::Remove => Cell::Empty,
            PlaceMode::Stick => Cell::Locked,
        };
        for (sx, sy) in piece.shape.filled_cells() {
            self.board.set(piece.x + sx, piece.y + sy, cell);
        }
    }

    /// Clockwise rotation of the active shape; the piece itself is untouched.
    pub fn rotated_shape(&self) -> Option<Shape> {
        self.piece.as_ref().map(|p| p.shape.rotated_cw())
    }

    /// Clear full rows, crediting `LINE_SCORE` each. Returns the number cleared.
    pub fn clear_lines(&mut self) -> u32 {
        let cleared = self.board.clear_full_rows();
        self.score += cleared * LINE_SCORE;
        self.lines_cleared += cleared;
        cleared
    }

    /// Apply a move. A blocked downward move locks the piece, clears lines and spawns the next one;
    /// any other blocked move is a no-op.
    pub fn move_piece(&mut self, movement: Movement) -> MoveOutcome {
        if self.game_over {
            return MoveOutcome::Ignored;
        }
        let candidate = if movement.rotate {
            self.rotated_shape()
        } else {
            self.piece.as_ref().map(|p| p.shape.clone())
        };
        let Some(candidate) = candidate else {
            return MoveOutcome::Ignored;
        };

        if !self.check(movement.dx, movement.dy, Some(&candidate)) {
            if movement.dy != 0 {
                self.place(PlaceMode::Stick);
                let lines = self.clear_lines();
                self.generate_piece();
                return MoveOutcome::Locked { lines };
            }
            return MoveOutcome::Blocked;
        }

        self.place(PlaceMode::Remove);
        if let Some(piece) = self.piece.as_mut() {
            piece.x += movement.dx;
            piece.y += movement.dy;
            piece.shape = candidate;
        }
        self.place(PlaceMode::Active);
        MoveOutcome::Moved
    }
}
