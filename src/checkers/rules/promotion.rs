//! Crowning rule.

use super::super::{BOARD_SIZE, CellKind};
use tracing::instrument;

/// True iff `piece` is a pawn landing on the farthest row for its color.
///
/// Kings and empty cells never promote.
#[instrument(level = "trace")]
pub fn promotes(piece: CellKind, landing_row: u8) -> bool {
    match piece {
        CellKind::WhitePawn => landing_row == BOARD_SIZE - 1,
        CellKind::RedPawn => landing_row == 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pawns_promote_on_far_row_only() {
        assert!(promotes(CellKind::WhitePawn, 7));
        assert!(!promotes(CellKind::WhitePawn, 0));
        assert!(promotes(CellKind::RedPawn, 0));
        assert!(!promotes(CellKind::RedPawn, 6));
    }

    #[test]
    fn test_kings_never_promote() {
        for row in 0..8 {
            assert!(!promotes(CellKind::WhiteKing, row));
            assert!(!promotes(CellKind::RedKing, row));
            assert!(!promotes(CellKind::Empty, row));
        }
    }
}
