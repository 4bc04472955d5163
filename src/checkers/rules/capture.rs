//! Capture detection and capture-chain replay.

use super::super::{Board, CellKind, Position, Side};
use tracing::{instrument, trace};

const WHITE_PAWN_DIRS: [(i8, i8); 2] = [(1, -1), (1, 1)];
const RED_PAWN_DIRS: [(i8, i8); 2] = [(-1, -1), (-1, 1)];
const KING_DIRS: [(i8, i8); 4] = [(1, -1), (1, 1), (-1, -1), (-1, 1)];

/// Diagonal directions `piece` may move and capture in.
///
/// Pawns only go forward; kings go all four ways.
pub fn directions(piece: CellKind) -> &'static [(i8, i8)] {
    match piece {
        CellKind::WhitePawn => &WHITE_PAWN_DIRS,
        CellKind::RedPawn => &RED_PAWN_DIRS,
        CellKind::WhiteKing | CellKind::RedKing => &KING_DIRS,
        CellKind::Empty => &[],
    }
}

/// Every capture `piece` could make from `from`, as `(captured, landing)` pairs.
#[instrument(level = "trace", skip(board))]
pub fn capture_hops(board: &Board, from: Position, piece: CellKind) -> Vec<(Position, Position)> {
    let Some(side) = piece.side() else {
        return Vec::new();
    };
    directions(piece)
        .iter()
        .filter_map(|&(d_row, d_col)| {
            let over = from.offset(d_row, d_col)?;
            let landing = from.offset(d_row * 2, d_col * 2)?;
            let jumpable = board.get(over).side() == Some(side.opponent());
            (jumpable && board.get(landing).is_empty()).then_some((over, landing))
        })
        .collect()
}

/// True if the piece on `pos` has at least one capture available.
#[instrument(level = "trace", skip(board))]
pub fn is_capture_available(board: &Board, pos: Position) -> bool {
    !capture_hops(board, pos, board.get(pos)).is_empty()
}

/// Replays `path` as a sequence of capture hops by the piece on its origin.
///
/// Returns the board after every jumped piece is removed and the mover has
/// left its origin, or `None` if any hop is not a legal capture. The mover
/// keeps its type for the whole chain.
pub(crate) fn replay_captures(board: &Board, path: &[Position]) -> Option<Board> {
    let (&origin, hops) = path.split_first()?;
    if hops.is_empty() {
        return None;
    }
    let piece = board.get(origin);
    let mut scratch = *board;
    scratch.take(origin);
    let mut from = origin;
    for &to in hops {
        let (over, _) = capture_hops(&scratch, from, piece)
            .into_iter()
            .find(|&(_, landing)| landing == to)?;
        trace!(%from, %to, %over, "Capture hop");
        scratch.take(over);
        from = to;
    }
    Some(scratch)
}

/// True iff the capture chain in `path_so_far` must go on.
///
/// The path must already be a legal capture sequence; any other path
/// (simple step, illegal hop, lone origin) never needs continuing.
#[instrument(level = "debug", skip(board, path_so_far), fields(len = path_so_far.len()))]
pub fn must_continue_capture(board: &Board, path_so_far: &[Position]) -> bool {
    let (Some(&origin), Some(&current)) = (path_so_far.first(), path_so_far.last()) else {
        return false;
    };
    let piece = board.get(origin);
    match replay_captures(board, path_so_far) {
        Some(after) => !capture_hops(&after, current, piece).is_empty(),
        None => false,
    }
}

/// True if any piece of `side` can capture.
pub fn side_can_capture(board: &Board, side: Side) -> bool {
    board.pieces(side).any(|pos| is_capture_available(board, pos))
}
