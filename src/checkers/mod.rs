//! Checkers move engine: board model, square-number codec, legality rules
//! and the gesture state machine.

mod board;
pub mod codec;
mod gesture;
pub mod rules;
mod types;

pub use board::{Board, BoardError, BoardState, ConfirmedMove};
pub use codec::{
    CodecError, ParsedMove, SquareNumber, encode_path, parse_move, to_position, to_square_number,
};
pub use gesture::{GestureAccumulator, GestureOutcome, GesturePhase, Highlights, ReadyMove};
pub use rules::{
    MoveKind, classify, is_capture_available, movable_pieces, must_continue_capture, promotes,
};
pub use types::{BOARD_SIZE, CellKind, GameStatus, Position, Side};
