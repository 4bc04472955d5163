//! Board grid and per-game state.

use super::codec::{CodecError, SquareNumber, to_position};
use super::rules::promotes;
use super::types::{BOARD_SIZE, CellKind, GameStatus, Position, Side};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Errors raised while loading or mutating a board.
#[derive(Debug, Clone, PartialEq, Eq, Display, From)]
pub enum BoardError {
    /// Grid did not have 8 rows of 8 cells.
    #[display("Board must be 8x8, got {} rows (row lengths {:?})", rows, lengths)]
    #[from(ignore)]
    WrongDimensions {
        /// Number of rows received.
        rows: usize,
        /// Length of each row received.
        lengths: Vec<usize>,
    },

    /// A piece sits on a light square.
    #[display("{} placed on non-playable square {}", _0, _1)]
    #[from(ignore)]
    PieceOnUnplayableSquare(CellKind, Position),

    /// A move referenced an empty origin square.
    #[display("No piece on origin square {}", _0)]
    #[from(ignore)]
    EmptyOrigin(SquareNumber),

    /// A square number or position was invalid.
    #[display("{}", _0)]
    Codec(CodecError),
}

impl std::error::Error for BoardError {}

/// The 8x8 grid of cell contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    /// Cells indexed `[row][col]`.
    cells: [[CellKind; BOARD_SIZE as usize]; BOARD_SIZE as usize],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the standard opening layout: White on rows 0-2, Red on rows 5-7.
    #[instrument]
    pub fn standard() -> Self {
        let mut board = Self::new();
        for pos in Position::playable() {
            let kind = match pos.row {
                0..=2 => CellKind::WhitePawn,
                5..=7 => CellKind::RedPawn,
                _ => CellKind::Empty,
            };
            board.cells[pos.row as usize][pos.col as usize] = kind;
        }
        board
    }

    /// Loads a grid from rows of cells, enforcing the 8x8 shape and the
    /// dark-square placement invariant.
    #[instrument(skip(rows), fields(rows = rows.len()))]
    pub fn from_rows(rows: &[Vec<CellKind>]) -> Result<Self, BoardError> {
        let size = BOARD_SIZE as usize;
        if rows.len() != size || rows.iter().any(|row| row.len() != size) {
            return Err(BoardError::WrongDimensions {
                rows: rows.len(),
                lengths: rows.iter().map(Vec::len).collect(),
            });
        }
        let mut board = Self::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, kind) in row.iter().enumerate() {
                board.set(Position::new(r as u8, c as u8), *kind)?;
            }
        }
        Ok(board)
    }

    /// Returns the cell at `pos`; off-board positions read as empty.
    pub fn get(&self, pos: Position) -> CellKind {
        if pos.is_on_board() {
            self.cells[pos.row as usize][pos.col as usize]
        } else {
            CellKind::Empty
        }
    }

    /// Places `kind` at `pos`. Pieces may only go on playable squares.
    pub fn set(&mut self, pos: Position, kind: CellKind) -> Result<(), BoardError> {
        if !pos.is_on_board() {
            return Err(CodecError::InvalidPosition(pos).into());
        }
        if !kind.is_empty() && !pos.is_playable() {
            return Err(BoardError::PieceOnUnplayableSquare(kind, pos));
        }
        self.cells[pos.row as usize][pos.col as usize] = kind;
        Ok(())
    }

    /// Empties the cell at `pos`, returning what was there.
    pub fn take(&mut self, pos: Position) -> CellKind {
        let kind = self.get(pos);
        if pos.is_on_board() {
            self.cells[pos.row as usize][pos.col as usize] = CellKind::Empty;
        }
        kind
    }

    /// Rows of cells, top row first.
    pub fn rows(&self) -> impl Iterator<Item = &[CellKind; BOARD_SIZE as usize]> {
        self.cells.iter()
    }

    /// Positions of every piece belonging to `side`.
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = Position> + '_ {
        Position::playable().filter(move |pos| self.get(*pos).side() == Some(side))
    }

    /// Formats the board as text, row 0 at the top.
    pub fn display(&self) -> String {
        let mut result = String::from("  01234567\n");
        for (r, row) in self.cells.iter().enumerate() {
            result.push_str(&format!("{} ", r));
            result.extend(row.iter().map(|kind| kind.glyph()));
            result.push('\n');
        }
        result
    }
}

/// A move the server has confirmed, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedMove {
    /// Origin square.
    pub start: SquareNumber,
    /// Final landing square.
    pub end: SquareNumber,
    /// Squares whose pieces were removed.
    pub captures: Vec<SquareNumber>,
    /// True if the mover is crowned on landing.
    pub promotion: bool,
}

/// Complete state of one open game.
///
/// Mutated only by applying server-confirmed moves or snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    board: Board,
    player1: String,
    player2: String,
    turn_is_player1: bool,
    status: GameStatus,
    ai: bool,
}

impl BoardState {
    /// Creates a new game in the opening layout with player 1 to move.
    #[instrument]
    pub fn new(player1: String, player2: String) -> Self {
        Self::with_board(Board::standard(), player1, player2, true)
    }

    /// Creates a game around an existing grid.
    pub fn with_board(
        board: Board,
        player1: String,
        player2: String,
        turn_is_player1: bool,
    ) -> Self {
        Self {
            board,
            player1,
            player2,
            turn_is_player1,
            status: GameStatus::NotFinished,
            ai: false,
        }
    }

    /// Sets the status reported by the server.
    pub fn set_status(&mut self, status: GameStatus) {
        self.status = status;
    }

    /// Marks whether player 2 is an AI opponent.
    pub fn set_ai(&mut self, ai: bool) {
        self.ai = ai;
    }

    /// Returns the grid.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Player 1's username (White).
    pub fn player1(&self) -> &str {
        &self.player1
    }

    /// Player 2's username (Red).
    pub fn player2(&self) -> &str {
        &self.player2
    }

    /// True while player 1 has the turn.
    pub fn turn_is_player1(&self) -> bool {
        self.turn_is_player1
    }

    /// Game status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// True if player 2 is an AI.
    pub fn ai(&self) -> bool {
        self.ai
    }

    /// Side that has the turn.
    pub fn side_to_move(&self) -> Side {
        if self.turn_is_player1 { Side::White } else { Side::Red }
    }

    /// Username that has the turn.
    pub fn player_to_move(&self) -> &str {
        if self.turn_is_player1 { &self.player1 } else { &self.player2 }
    }

    /// Side played by `username`, if they are in this game.
    pub fn side_of(&self, username: &str) -> Option<Side> {
        if username == self.player1 {
            Some(Side::White)
        } else if username == self.player2 {
            Some(Side::Red)
        } else {
            None
        }
    }

    /// True if `username` plays here and it is their move in an unfinished game.
    pub fn is_turn_of(&self, username: &str) -> bool {
        self.status == GameStatus::NotFinished
            && self.side_of(username) == Some(self.side_to_move())
    }

    /// Applies a confirmed move and passes the turn to the other player.
    ///
    /// The server is authoritative: the move is applied without legality
    /// checks beyond requiring a piece on the origin square.
    #[instrument(skip(self), fields(start = %mv.start, end = %mv.end))]
    pub fn apply_move(&mut self, mv: &ConfirmedMove, mover: &str) -> Result<(), BoardError> {
        let start = to_position(mv.start.into())?;
        let end = to_position(mv.end.into())?;
        let mut piece = self.board.take(start);
        if piece.is_empty() {
            return Err(BoardError::EmptyOrigin(mv.start));
        }
        for captured in &mv.captures {
            let pos = to_position((*captured).into())?;
            let removed = self.board.take(pos);
            debug!(square = %captured, ?removed, "Removed captured piece");
        }
        if mv.promotion || promotes(piece, end.row) {
            if !mv.promotion {
                warn!(square = %mv.end, "Pawn reached the last row without a promotion flag");
            }
            piece = piece.crowned();
        }
        self.board.set(end, piece)?;
        self.turn_is_player1 = mover != self.player1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_counts() {
        let board = Board::standard();
        assert_eq!(board.pieces(Side::White).count(), 12);
        assert_eq!(board.pieces(Side::Red).count(), 12);
        assert_eq!(board.get(Position::new(0, 1)), CellKind::WhitePawn);
        assert_eq!(board.get(Position::new(7, 0)), CellKind::RedPawn);
    }

    #[test]
    fn test_piece_on_light_square_rejected() {
        let mut rows = vec![vec![CellKind::Empty; 8]; 8];
        rows[0][0] = CellKind::RedKing;
        assert_eq!(
            Board::from_rows(&rows),
            Err(BoardError::PieceOnUnplayableSquare(
                CellKind::RedKing,
                Position::new(0, 0)
            ))
        );
    }

    #[test]
    fn test_wrong_dimensions_rejected() {
        let rows = vec![vec![CellKind::Empty; 8]; 7];
        assert!(matches!(
            Board::from_rows(&rows),
            Err(BoardError::WrongDimensions { rows: 7, .. })
        ));
    }

    #[test]
    fn test_apply_capture_and_promotion() {
        let mut board = Board::new();
        board.set(Position::new(5, 2), CellKind::WhitePawn).unwrap();
        board.set(Position::new(6, 3), CellKind::RedPawn).unwrap();
        let mut state = BoardState::with_board(board, "alice".into(), "bob".into(), true);

        let mv = ConfirmedMove {
            start: SquareNumber::new(22).unwrap(),
            end: SquareNumber::new(31).unwrap(),
            captures: vec![SquareNumber::new(26).unwrap()],
            promotion: true,
        };
        state.apply_move(&mv, "alice").unwrap();

        assert_eq!(state.board().get(Position::new(5, 2)), CellKind::Empty);
        assert_eq!(state.board().get(Position::new(6, 3)), CellKind::Empty);
        assert_eq!(state.board().get(Position::new(7, 4)), CellKind::WhiteKing);
        assert!(!state.turn_is_player1());
        assert_eq!(state.player_to_move(), "bob");
    }
}
