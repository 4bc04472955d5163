//! Core domain types for checkers.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Number of rows and columns on the board.
pub const BOARD_SIZE: u8 = 8;

/// One of the two colors in play.
///
/// White starts on rows 0-2 and advances toward row 7.
/// Red starts on rows 5-7 and advances toward row 0.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
)]
pub enum Side {
    /// Player 1's color.
    White,
    /// Player 2's color.
    Red,
}

impl Side {
    /// Returns the opposing side.
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Red,
            Side::Red => Side::White,
        }
    }

    /// Row on which this side's pawns are crowned.
    pub fn promotion_row(self) -> u8 {
        match self {
            Side::White => BOARD_SIZE - 1,
            Side::Red => 0,
        }
    }
}

/// Contents of a single board cell.
///
/// Variant names double as the wire strings used in board snapshots.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
)]
pub enum CellKind {
    /// No piece.
    #[default]
    Empty,
    /// Uncrowned white piece.
    WhitePawn,
    /// Crowned white piece.
    WhiteKing,
    /// Uncrowned red piece.
    RedPawn,
    /// Crowned red piece.
    RedKing,
}

impl CellKind {
    /// Returns the owning side, or `None` for an empty cell.
    pub fn side(self) -> Option<Side> {
        match self {
            CellKind::Empty => None,
            CellKind::WhitePawn | CellKind::WhiteKing => Some(Side::White),
            CellKind::RedPawn | CellKind::RedKing => Some(Side::Red),
        }
    }

    /// True for either king.
    pub fn is_king(self) -> bool {
        matches!(self, CellKind::WhiteKing | CellKind::RedKing)
    }

    /// True for either pawn.
    pub fn is_pawn(self) -> bool {
        matches!(self, CellKind::WhitePawn | CellKind::RedPawn)
    }

    /// True if the cell holds no piece.
    pub fn is_empty(self) -> bool {
        self == CellKind::Empty
    }

    /// The crowned form of this piece. Kings and empty cells are unchanged.
    pub fn crowned(self) -> Self {
        match self {
            CellKind::WhitePawn => CellKind::WhiteKing,
            CellKind::RedPawn => CellKind::RedKing,
            other => other,
        }
    }

    /// Single-character glyph used by the text board.
    pub fn glyph(self) -> char {
        match self {
            CellKind::Empty => '.',
            CellKind::WhitePawn => 'w',
            CellKind::WhiteKing => 'W',
            CellKind::RedPawn => 'r',
            CellKind::RedKing => 'R',
        }
    }
}

/// A cell on the 8x8 grid, addressed by row and column.
///
/// A `Position` may be constructed off-board; [`Position::is_on_board`] and
/// [`Position::is_playable`] say whether it can hold a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Row index, 0 at White's home edge.
    pub row: u8,
    /// Column index.
    pub col: u8,
}

impl Position {
    /// Creates a position.
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// True if both coordinates lie within the board.
    pub fn is_on_board(self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// True for the dark squares pieces may stand on.
    pub fn is_playable(self) -> bool {
        self.is_on_board() && (self.row + self.col) % 2 == 1
    }

    /// Returns the position shifted by the given deltas, if it stays on the board.
    #[instrument(level = "trace")]
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        let pos = Self::new(row, col);
        pos.is_on_board().then_some(pos)
    }

    /// Midpoint between two positions two diagonal steps apart.
    pub fn midpoint(self, other: Self) -> Option<Self> {
        let d_row = other.row as i16 - self.row as i16;
        let d_col = other.col as i16 - self.col as i16;
        if d_row.abs() != 2 || d_col.abs() != 2 {
            return None;
        }
        self.offset((d_row / 2) as i8, (d_col / 2) as i8)
    }

    /// All 32 playable positions in square-number order.
    pub fn playable() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| {
            (0..BOARD_SIZE)
                .map(move |col| Position::new(row, col))
                .filter(|pos| pos.is_playable())
        })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Game status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display)]
pub enum GameStatus {
    /// Game is ongoing.
    #[default]
    NotFinished,
    /// Game ended in a win.
    Won,
    /// Game ended in a loss.
    Lost,
    /// Game ended in a draw.
    Drawn,
}
