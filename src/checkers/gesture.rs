//! Turns cell touches into candidate moves.
//!
//! The accumulator is a small state machine. In `Idle` a touch on one of
//! the local player's pieces starts a path. In `Selecting` each further
//! touch extends the path and is re-classified; illegal paths are dropped
//! silently, capture chains stay open until no further hop exists, and
//! complete moves are returned as [`ReadyMove`]s in wire form.

use super::board::BoardState;
use super::codec::{CodecError, encode_path};
use super::rules::{MoveKind, capture_hops, classify, movable_pieces, must_continue_capture};
use super::types::Position;
use tracing::{debug, info, instrument};

/// Current phase of the accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GesturePhase {
    /// No origin selected.
    #[default]
    Idle,
    /// Origin chosen, path growing.
    Selecting {
        /// Touched cells so far, origin first.
        path: Vec<Position>,
    },
}

/// A complete, locally legal move ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyMove {
    /// The visited cells, origin first.
    pub path: Vec<Position>,
    /// Simple step or capture chain.
    pub kind: MoveKind,
    /// Wire encoding, e.g. `"10x19"`.
    pub encoded: String,
}

/// What a single touch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Touch ignored; still idle.
    Ignored,
    /// Origin selected.
    Started,
    /// Capture hop accepted; another hop is required.
    AwaitingHop,
    /// Path was illegal and has been discarded.
    Reset,
    /// Move complete. The accumulator is idle again.
    Ready(ReadyMove),
}

/// Presentation-only highlight cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Highlights {
    /// Selected origin.
    pub origin: Option<Position>,
    /// Cells reachable by the next hop.
    pub targets: Vec<Position>,
    /// Pieces jumped so far.
    pub captured: Vec<Position>,
}

impl Highlights {
    /// True when nothing is highlighted.
    pub fn is_empty(&self) -> bool {
        self.origin.is_none() && self.targets.is_empty() && self.captured.is_empty()
    }
}

/// Accumulates touches into a move path.
#[derive(Debug, Clone, Default)]
pub struct GestureAccumulator {
    phase: GesturePhase,
    highlights: Highlights,
}

impl GestureAccumulator {
    /// Creates an idle accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> &GesturePhase {
        &self.phase
    }

    /// Path collected so far; empty while idle.
    pub fn path(&self) -> &[Position] {
        match &self.phase {
            GesturePhase::Idle => &[],
            GesturePhase::Selecting { path } => path,
        }
    }

    /// Current highlight set.
    pub fn highlights(&self) -> &Highlights {
        &self.highlights
    }

    /// Drops any partial path.
    #[instrument(skip(self))]
    pub fn cancel(&mut self) {
        self.phase = GesturePhase::Idle;
        self.highlights = Highlights::default();
    }

    /// Handles a touch on `pos` by `local_player`.
    ///
    /// Only codec failures are returned as errors; they cannot happen for
    /// paths the validator accepted.
    #[instrument(skip(self, state), fields(phase = ?self.phase))]
    pub fn on_cell_touched(
        &mut self,
        state: &BoardState,
        local_player: &str,
        pos: Position,
    ) -> Result<GestureOutcome, CodecError> {
        let mut path = match std::mem::take(&mut self.phase) {
            GesturePhase::Idle => return Ok(self.start(state, local_player, pos)),
            GesturePhase::Selecting { path } => path,
        };
        path.push(pos);

        let board = state.board();
        match classify(board, &path) {
            MoveKind::Illegal => {
                debug!(?path, "Illegal path discarded");
                self.cancel();
                Ok(GestureOutcome::Reset)
            }
            MoveKind::Capture if must_continue_capture(board, &path) => {
                self.highlight_chain(state, &path);
                self.phase = GesturePhase::Selecting { path };
                Ok(GestureOutcome::AwaitingHop)
            }
            kind => {
                let encoded = encode_path(&path, kind)?;
                info!(%encoded, ?kind, "Move ready");
                self.cancel();
                Ok(GestureOutcome::Ready(ReadyMove { path, kind, encoded }))
            }
        }
    }

    fn start(&mut self, state: &BoardState, local_player: &str, pos: Position) -> GestureOutcome {
        let piece = state.board().get(pos);
        let owns_piece = piece.side().is_some() && piece.side() == state.side_of(local_player);
        if !owns_piece || !state.is_turn_of(local_player) {
            debug!(%pos, ?piece, "Touch ignored");
            return GestureOutcome::Ignored;
        }
        let path = vec![pos];
        self.highlight_chain(state, &path);
        self.phase = GesturePhase::Selecting { path };
        GestureOutcome::Started
    }

    fn highlight_chain(&mut self, state: &BoardState, path: &[Position]) {
        let board = state.board();
        let (Some(&origin), Some(&current)) = (path.first(), path.last()) else {
            return;
        };
        let piece = board.get(origin);
        let captured: Vec<Position> = path
            .windows(2)
            .filter_map(|hop| hop[0].midpoint(hop[1]))
            .collect();
        let mut scratch = *board;
        for over in &captured {
            scratch.take(*over);
        }
        let mut targets: Vec<Position> = capture_hops(&scratch, current, piece)
            .into_iter()
            .map(|(_, landing)| landing)
            .collect();
        // A piece held back by a capture elsewhere on its side shows no steps.
        let movable = piece
            .side()
            .is_some_and(|side| movable_pieces(board, side).contains(&origin));
        if path.len() == 1 && targets.is_empty() && movable {
            targets = super::rules::capture::directions(piece)
                .iter()
                .filter_map(|&(d_row, d_col)| origin.offset(d_row, d_col))
                .filter(|target| board.get(*target).is_empty())
                .collect();
        }
        self.highlights = Highlights {
            origin: Some(origin),
            targets,
            captured,
        };
    }
}
