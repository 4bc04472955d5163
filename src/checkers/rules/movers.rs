//! Which pieces can move at all.

use super::super::{Board, Position, Side};
use super::capture::{directions, is_capture_available, side_can_capture};
use tracing::instrument;

/// Positions of `side`'s pieces that have a legal move.
///
/// If any piece of the side can capture, only capturing pieces are returned,
/// matching the server engine's side-wide forcing rule.
#[instrument(level = "debug", skip(board))]
pub fn movable_pieces(board: &Board, side: Side) -> Vec<Position> {
    if side_can_capture(board, side) {
        return board
            .pieces(side)
            .filter(|pos| is_capture_available(board, *pos))
            .collect();
    }
    board
        .pieces(side)
        .filter(|pos| {
            directions(board.get(*pos)).iter().any(|&(d_row, d_col)| {
                pos.offset(d_row, d_col)
                    .is_some_and(|target| board.get(target).is_empty())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::CellKind;

    #[test]
    fn test_opening_movers() {
        let board = Board::standard();
        let white = movable_pieces(&board, Side::White);
        assert_eq!(white.len(), 4);
        assert!(white.iter().all(|pos| pos.row == 2));
        let red = movable_pieces(&board, Side::Red);
        assert_eq!(red.len(), 4);
        assert!(red.iter().all(|pos| pos.row == 5));
    }

    #[test]
    fn test_jumpers_take_priority() {
        let mut board = Board::new();
        board.set(Position::new(2, 3), CellKind::WhitePawn).unwrap();
        board.set(Position::new(3, 4), CellKind::RedPawn).unwrap();
        board.set(Position::new(0, 7), CellKind::WhitePawn).unwrap();
        board.set(Position::new(1, 2), CellKind::WhitePawn).unwrap();
        assert_eq!(
            movable_pieces(&board, Side::White),
            vec![Position::new(2, 3)]
        );
    }
}
