//! JSON envelopes exchanged with the game server.
//!
//! Outbound requests are routed by their `path`. Inbound messages carry an
//! optional `kind` tag; untagged messages are recognised by which fields
//! they contain.

use crate::checkers::{
    Board, BoardError, BoardState, CellKind, CodecError, ConfirmedMove, GameStatus, SquareNumber,
    parse_move,
};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, trace};

/// Error text the server sends when an access token has expired.
pub const TOKEN_EXPIRED: &str = "Token expired";

/// Requests sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path")]
pub enum Outbound {
    /// Start receiving updates for a game.
    #[serde(rename = "/subscribe")]
    Subscribe {
        /// Game to follow.
        game_id: u64,
    },
    /// Authenticate the connection.
    #[serde(rename = "/auth")]
    Auth {
        /// Access token, `null` when none is stored.
        jwt: Option<String>,
    },
    /// Submit a move in wire form.
    #[serde(rename = "/move")]
    Move {
        /// Encoded move, e.g. `"11-15"`.
        #[serde(rename = "move")]
        encoded: String,
    },
    /// Post a chat line to the game room.
    #[serde(rename = "/chat")]
    Chat {
        /// Chat text.
        message: String,
    },
}

impl Outbound {
    /// Serializes the request.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Full game state pushed on subscribe and on resync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    /// Player 1 (White).
    pub username1: String,
    /// Player 2 (Red).
    pub username2: String,
    /// True if player 2 is the server AI.
    #[serde(default)]
    pub ai: bool,
    /// 8 rows of 8 cells.
    pub current_state: Vec<Vec<CellKind>>,
    /// Username whose turn it is.
    pub current_player: String,
    /// True if it is the receiving user's turn.
    #[serde(default)]
    pub user_turn: bool,
    /// Game status.
    #[serde(default)]
    pub status: GameStatus,
}

impl BoardSnapshot {
    /// Builds a [`BoardState`], validating the grid.
    #[instrument(skip(self), fields(player1 = %self.username1, player2 = %self.username2))]
    pub fn to_board_state(&self) -> Result<BoardState, BoardError> {
        let board = Board::from_rows(&self.current_state)?;
        let turn_is_player1 = self.current_player == self.username1;
        let mut state = BoardState::with_board(
            board,
            self.username1.clone(),
            self.username2.clone(),
            turn_is_player1,
        );
        state.set_status(self.status);
        state.set_ai(self.ai);
        Ok(state)
    }
}

/// Server-side breakdown of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDetails {
    /// Origin square.
    pub start: SquareNumber,
    /// Final landing square.
    pub end: SquareNumber,
    /// Squares whose pieces were removed.
    #[serde(default)]
    pub captures: Vec<SquareNumber>,
    /// True if the piece was crowned.
    #[serde(default)]
    pub promotion: bool,
}

impl From<MoveDetails> for ConfirmedMove {
    fn from(details: MoveDetails) -> Self {
        ConfirmedMove {
            start: details.start,
            end: details.end,
            captures: details.captures,
            promotion: details.promotion,
        }
    }
}

/// Outcome of a move submitted by either player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// Username of the mover.
    pub player: String,
    /// The move as submitted.
    #[serde(rename = "move")]
    pub encoded: String,
    /// False if the server refused the move.
    pub legal: bool,
    /// Present for most legal moves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<MoveDetails>,
    /// Game status after the move.
    #[serde(default)]
    pub status: GameStatus,
}

impl MoveResult {
    /// The move to apply locally.
    ///
    /// Uses `details` when present and otherwise parses the move string.
    /// Parsed moves carry no promotion flag; the board crowns pawns that
    /// reach the last row regardless.
    #[instrument(skip(self), fields(encoded = %self.encoded))]
    pub fn confirmed_move(&self) -> Result<ConfirmedMove, CodecError> {
        if let Some(details) = &self.details {
            return Ok(details.clone().into());
        }
        debug!("Move result without details, parsing move string");
        let parsed = parse_move(&self.encoded)?;
        Ok(ConfirmedMove {
            start: parsed.start(),
            end: parsed.end(),
            captures: parsed.jumped()?,
            promotion: false,
        })
    }
}

/// A chat line in the game room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender, absent for server notices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    /// Chat text.
    pub message: String,
}

/// Reply to an `/auth` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    /// True if the token was accepted.
    pub authenticated: bool,
    /// Authenticated username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResult {
    /// True if the failure was an expired access token.
    pub fn is_expired(&self) -> bool {
        !self.authenticated
            && self
                .error
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(TOKEN_EXPIRED))
    }
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Inbound {
    /// Full game state.
    Board(BoardSnapshot),
    /// Result of a move.
    Move(MoveResult),
    /// Chat line.
    Chat(ChatMessage),
    /// Authentication reply.
    Auth(AuthResult),
}

/// Inbound decoding failures.
#[derive(Debug, Display, From)]
pub enum ProtocolError {
    /// Text was not valid JSON or did not match the expected shape.
    #[display("Invalid JSON: {}", _0)]
    Json(serde_json::Error),

    /// JSON object matched no known message.
    #[display("Unrecognised message shape")]
    #[from(ignore)]
    UnknownShape,
}

impl std::error::Error for ProtocolError {}

impl Inbound {
    /// Decodes one inbound message.
    ///
    /// Tagged messages are decoded by `kind`. Untagged messages are matched
    /// by field presence, checked in order: `move`, `message`, `username1`,
    /// `authenticated`.
    #[instrument(level = "debug", skip(text), fields(len = text.len()))]
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        if value.get("kind").is_some() {
            trace!("Decoding tagged message");
            return Ok(serde_json::from_value(value)?);
        }
        let inbound = if value.get("move").is_some() {
            Inbound::Move(serde_json::from_value(value)?)
        } else if value.get("message").is_some() {
            Inbound::Chat(serde_json::from_value(value)?)
        } else if value.get("username1").is_some() {
            Inbound::Board(serde_json::from_value(value)?)
        } else if value.get("authenticated").is_some() {
            Inbound::Auth(serde_json::from_value(value)?)
        } else {
            return Err(ProtocolError::UnknownShape);
        };
        Ok(inbound)
    }
}
