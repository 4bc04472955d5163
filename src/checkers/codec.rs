//! Square-number encoding used on the wire.
//!
//! Only the 32 playable squares are numbered, row-major from 1. Each row
//! holds four playable cells: odd columns on even rows, even columns on odd
//! rows. Moves are written as square numbers joined by `-` for a simple
//! step and `x` for a capture sequence, e.g. `"12-16"` or `"12x19x26"`.

use super::rules::MoveKind;
use super::types::{BOARD_SIZE, Position};
use derive_getters::Getters;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Highest valid square number.
pub const MAX_SQUARE: u8 = 32;

const SQUARES_PER_ROW: u8 = BOARD_SIZE / 2;

/// Codec failures. These indicate a caller bug, never a user mistake.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum CodecError {
    /// Position is off the board or on a light square.
    #[display("Position {} is not a playable square", _0)]
    InvalidPosition(Position),

    /// Square number outside 1..=32.
    #[display("Square number {} is outside 1..={}", _0, MAX_SQUARE)]
    InvalidSquareNumber(u32),

    /// Move text could not be parsed.
    #[display("Malformed move: {:?}", _0)]
    MalformedMove(String),
}

impl std::error::Error for CodecError {}

/// A playable square's wire number, always in 1..=32.
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
    derive_more::Display,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct SquareNumber(u8);

impl SquareNumber {
    /// Validates a raw square number.
    pub fn new(num: u32) -> Result<Self, CodecError> {
        if (1..=MAX_SQUARE as u32).contains(&num) {
            Ok(Self(num as u8))
        } else {
            Err(CodecError::InvalidSquareNumber(num))
        }
    }

    /// The raw number.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for SquareNumber {
    type Error = CodecError;

    fn try_from(num: u32) -> Result<Self, Self::Error> {
        Self::new(num)
    }
}

impl From<SquareNumber> for u32 {
    fn from(num: SquareNumber) -> Self {
        num.0 as u32
    }
}

impl TryFrom<Position> for SquareNumber {
    type Error = CodecError;

    fn try_from(pos: Position) -> Result<Self, Self::Error> {
        to_square_number(pos)
    }
}

/// Encodes a playable position as its square number.
#[instrument(level = "trace")]
pub fn to_square_number(pos: Position) -> Result<SquareNumber, CodecError> {
    if !pos.is_playable() {
        return Err(CodecError::InvalidPosition(pos));
    }
    Ok(SquareNumber(pos.row * SQUARES_PER_ROW + pos.col / 2 + 1))
}

/// Decodes a square number back to its position.
#[instrument(level = "trace")]
pub fn to_position(num: u32) -> Result<Position, CodecError> {
    let num = SquareNumber::new(num)?;
    let index = num.get() - 1;
    let row = index / SQUARES_PER_ROW;
    let parity = if row % 2 == 0 { 1 } else { 0 };
    let col = (index % SQUARES_PER_ROW) * 2 + parity;
    Ok(Position::new(row, col))
}

/// Writes a path in wire form.
///
/// Simple moves join with `-`, captures with `x`. `Illegal` paths are
/// written with `-`; callers only encode validated paths.
#[instrument(level = "debug", skip(path), fields(len = path.len()))]
pub fn encode_path(path: &[Position], kind: MoveKind) -> Result<String, CodecError> {
    let separator = match kind {
        MoveKind::Capture => "x",
        MoveKind::Simple | MoveKind::Illegal => "-",
    };
    let squares = path
        .iter()
        .map(|pos| to_square_number(*pos).map(|n| n.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(squares.join(separator))
}

/// A move string split back into squares.
///
/// Only built by [`parse_move`], so it always holds at least two squares.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ParsedMove {
    /// Visited squares in order, origin first.
    squares: Vec<SquareNumber>,
    /// True if the move was written with `x`.
    capture: bool,
}

impl ParsedMove {
    /// Origin square.
    pub fn start(&self) -> SquareNumber {
        self.squares[0]
    }

    /// Final landing square.
    pub fn end(&self) -> SquareNumber {
        self.squares[self.squares.len() - 1]
    }

    /// Squares jumped over by each hop. Empty for simple moves.
    pub fn jumped(&self) -> Result<Vec<SquareNumber>, CodecError> {
        if !self.capture {
            return Ok(Vec::new());
        }
        self.squares
            .windows(2)
            .map(|hop| {
                let from = to_position(hop[0].into())?;
                let to = to_position(hop[1].into())?;
                let mid = from
                    .midpoint(to)
                    .ok_or_else(|| CodecError::MalformedMove(format!("{}x{}", hop[0], hop[1])))?;
                to_square_number(mid)
            })
            .collect()
    }
}

/// Parses `"12-16"` or `"12x19x26"`.
#[instrument(level = "debug")]
pub fn parse_move(text: &str) -> Result<ParsedMove, CodecError> {
    let malformed = || CodecError::MalformedMove(text.to_string());
    let text = text.trim();
    let capture = match (text.contains('x'), text.contains('-')) {
        (true, false) => true,
        (false, true) => false,
        _ => return Err(malformed()),
    };
    let separator = if capture { 'x' } else { '-' };
    let squares = text
        .split(separator)
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| malformed())
                .and_then(SquareNumber::new)
        })
        .collect::<Result<Vec<_>, _>>()?;
    if squares.len() < 2 || (!capture && squares.len() != 2) {
        return Err(malformed());
    }
    Ok(ParsedMove { squares, capture })
}
