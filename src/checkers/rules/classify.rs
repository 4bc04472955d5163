//! Path classification.

use super::super::{Board, Position};
use super::capture::{directions, is_capture_available, replay_captures};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Result of classifying a candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum MoveKind {
    /// One diagonal step onto an empty cell.
    Simple,
    /// One or more capture hops.
    Capture,
    /// Anything else.
    Illegal,
}

/// Classifies `path` against `board`.
///
/// The first position is the mover's origin. A two-position path one step
/// apart is [`MoveKind::Simple`] when the direction suits the piece, the
/// target is empty, and the piece has no capture available (captures are
/// compulsory). Paths made of two-step hops are [`MoveKind::Capture`] when
/// every hop jumps an opponent onto an empty cell, judged on the board as it
/// stands after the earlier hops. Multiple capture lines are a player choice;
/// only the given line is checked.
#[instrument(level = "debug", skip(board, path), fields(len = path.len()))]
pub fn classify(board: &Board, path: &[Position]) -> MoveKind {
    let (Some(&origin), Some(&next)) = (path.first(), path.get(1)) else {
        return MoveKind::Illegal;
    };
    let piece = board.get(origin);
    if piece.is_empty() || path.iter().any(|pos| !pos.is_playable()) {
        return MoveKind::Illegal;
    }

    let d_row = next.row as i16 - origin.row as i16;
    let d_col = next.col as i16 - origin.col as i16;

    let kind = match (d_row.abs(), d_col.abs()) {
        (1, 1) if path.len() == 2 => {
            let step = (d_row as i8, d_col as i8);
            let allowed = directions(piece).contains(&step);
            if allowed && board.get(next).is_empty() && !is_capture_available(board, origin) {
                MoveKind::Simple
            } else {
                MoveKind::Illegal
            }
        }
        (2, 2) => match replay_captures(board, path) {
            Some(_) => MoveKind::Capture,
            None => MoveKind::Illegal,
        },
        _ => MoveKind::Illegal,
    };
    debug!(%origin, ?kind, "Classified path");
    kind
}
