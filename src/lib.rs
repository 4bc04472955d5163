//! Checkers client library
//!
//! Local move validation and a resilient server session for real-time
//! checkers.
//!
//! # Architecture
//!
//! - **Checkers**: square-number codec, board state, move rules and the
//!   gesture accumulator that turns cell touches into moves
//! - **Session**: sans-IO connection/auth/subscription state machine with
//!   WebSocket and HTTP adapters
//! - **View**: one open game, routing server traffic into the board
//!
//! # Example
//!
//! ```no_run
//! use checkers_client::{Position, classify, MoveKind, Board, CellKind};
//!
//! let mut board = Board::new();
//! board.set(Position::new(2, 3), CellKind::WhitePawn).unwrap();
//! board.set(Position::new(3, 4), CellKind::RedPawn).unwrap();
//! let path = [Position::new(2, 3), Position::new(4, 5)];
//! assert_eq!(classify(&board, &path), MoveKind::Capture);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod checkers;
mod config;
mod input;
pub mod session;
mod view;

// Crate-level exports - Move engine
pub use checkers::{
    BOARD_SIZE, Board, BoardError, BoardState, CellKind, CodecError, ConfirmedMove, GameStatus,
    GestureAccumulator, GestureOutcome, GesturePhase, Highlights, MoveKind, ParsedMove, Position,
    ReadyMove, Side, SquareNumber, classify, encode_path, is_capture_available, movable_pieces,
    must_continue_capture, parse_move, promotes, to_position, to_square_number,
};

// Crate-level exports - Session
pub use session::{
    ConnectionId, Connector, CredentialStore, Credentials, FileCredentialStore,
    HttpTokenRefresher, MemoryCredentialStore, ReconnectPolicy, SessionError, SessionEvent,
    SessionNotice, SessionState, SessionTransport, Subscription, TokenRefresher, WsConnector,
};

// Crate-level exports - Configuration and terminal input
pub use config::{ClientConfig, ConfigError};
pub use input::{UserCommand, parse_command};

// Crate-level exports - Game view
pub use view::{GameView, ViewEvent};
