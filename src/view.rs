//! One open game: board, gesture input and session, wired together.

use crate::checkers::{
    BoardState, GameStatus, GestureAccumulator, GestureOutcome, Highlights, Position,
};
use crate::session::{
    ChatMessage, Connector, CredentialStore, MoveResult, SessionError, SessionEvent, SessionNotice,
    SessionState, SessionTransport, TokenRefresher,
};
use tracing::{debug, error, info, instrument, warn};

/// Updates for the UI. The view reports everything through these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// The session changed state.
    Session(SessionState),
    /// Signed in as `username`.
    SignedIn {
        /// Local player.
        username: Option<String>,
    },
    /// A snapshot replaced the board.
    BoardLoaded,
    /// A confirmed move was applied.
    MoveApplied {
        /// Mover.
        player: String,
        /// Move as sent.
        encoded: String,
    },
    /// The server refused a move; the board is unchanged.
    MoveRejected {
        /// Mover.
        player: String,
        /// Move as sent.
        encoded: String,
    },
    /// The game ended.
    GameOver(GameStatus),
    /// An origin piece was selected.
    SelectionStarted(Position),
    /// A capture hop was accepted and another is required.
    AwaitingHop,
    /// The partial selection was discarded.
    SelectionCleared,
    /// A move was submitted.
    MoveSubmitted {
        /// Encoded move.
        encoded: String,
    },
    /// A chat line arrived.
    Chat(ChatMessage),
    /// Credentials were cleared; log in again.
    LoggedOut {
        /// Why.
        reason: SessionError,
    },
    /// Reconnecting gave up.
    ConnectionAbandoned,
}

/// Owns the state of one open game and routes session traffic into it.
#[derive(Debug)]
pub struct GameView<C, R, S> {
    session: SessionTransport<C, R, S>,
    board: Option<BoardState>,
    gesture: GestureAccumulator,
    chat: Vec<ChatMessage>,
    game_id: Option<u64>,
}

impl<C, R, S> GameView<C, R, S>
where
    C: Connector,
    R: TokenRefresher,
    S: CredentialStore,
{
    /// Wraps a session. No game is open yet.
    pub fn new(session: SessionTransport<C, R, S>) -> Self {
        Self {
            session,
            board: None,
            gesture: GestureAccumulator::new(),
            chat: Vec::new(),
            game_id: None,
        }
    }

    /// The session.
    pub fn session(&self) -> &SessionTransport<C, R, S> {
        &self.session
    }

    /// The loaded board, if a snapshot has arrived.
    pub fn board(&self) -> Option<&BoardState> {
        self.board.as_ref()
    }

    /// Highlight cells for the current selection.
    pub fn highlights(&self) -> &Highlights {
        self.gesture.highlights()
    }

    /// The gesture accumulator.
    pub fn gesture(&self) -> &GestureAccumulator {
        &self.gesture
    }

    /// Chat received so far.
    pub fn chat_log(&self) -> &[ChatMessage] {
        &self.chat
    }

    /// The open game.
    pub fn game_id(&self) -> Option<u64> {
        self.game_id
    }

    /// Connects and follows `game_id`.
    #[instrument(skip(self))]
    pub fn open(&mut self, game_id: u64) -> Vec<ViewEvent> {
        info!("Opening game");
        self.game_id = Some(game_id);
        let mut notices = self.session.connect();
        notices.extend(self.session.subscribe_game(game_id));
        self.apply(notices)
    }

    /// Disconnects and drops all game state.
    #[instrument(skip(self), fields(game_id = ?self.game_id))]
    pub fn close(&mut self) -> Vec<ViewEvent> {
        info!("Closing game");
        let notices = self.session.disconnect();
        self.board = None;
        self.gesture.cancel();
        self.chat.clear();
        self.game_id = None;
        self.apply(notices)
    }

    /// Handles a touch on `pos`.
    #[instrument(skip(self))]
    pub fn touch(&mut self, pos: Position) -> Vec<ViewEvent> {
        if !matches!(self.session.state(), SessionState::Subscribed { .. }) {
            debug!(state = %self.session.state(), "Touch ignored, not subscribed");
            return Vec::new();
        }
        let (Some(board), Some(player)) = (self.board.as_ref(), self.session.username()) else {
            debug!("Touch ignored, no board or player yet");
            return Vec::new();
        };
        let outcome = match self.gesture.on_cell_touched(board, player, pos) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Validated path failed to encode");
                self.gesture.cancel();
                return vec![ViewEvent::SelectionCleared];
            }
        };
        match outcome {
            GestureOutcome::Ignored => Vec::new(),
            GestureOutcome::Started => vec![ViewEvent::SelectionStarted(pos)],
            GestureOutcome::AwaitingHop => vec![ViewEvent::AwaitingHop],
            GestureOutcome::Reset => vec![ViewEvent::SelectionCleared],
            GestureOutcome::Ready(ready) => {
                self.session.send_move(&ready.encoded);
                vec![ViewEvent::MoveSubmitted {
                    encoded: ready.encoded,
                }]
            }
        }
    }

    /// Drops the current selection.
    pub fn cancel_selection(&mut self) -> Vec<ViewEvent> {
        if self.gesture.path().is_empty() {
            return Vec::new();
        }
        self.gesture.cancel();
        vec![ViewEvent::SelectionCleared]
    }

    /// Posts a chat line.
    pub fn send_chat(&mut self, message: &str) {
        self.session.send_chat(message);
    }

    /// Feeds a transport or refresh result through the session.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<ViewEvent> {
        let notices = self.session.handle(event);
        self.apply(notices)
    }

    fn apply(&mut self, notices: Vec<SessionNotice>) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        for notice in notices {
            match notice {
                SessionNotice::StateChanged(state) => {
                    if matches!(state, SessionState::Subscribed { .. }) {
                        self.gesture.cancel();
                    }
                    events.push(ViewEvent::Session(state));
                }
                SessionNotice::Authenticated { username } => {
                    events.push(ViewEvent::SignedIn { username });
                }
                SessionNotice::Board(snapshot) => match snapshot.to_board_state() {
                    Ok(state) => {
                        debug!(to_move = %state.player_to_move(), "Board loaded");
                        let status = state.status();
                        self.board = Some(state);
                        self.gesture.cancel();
                        events.push(ViewEvent::BoardLoaded);
                        if status != GameStatus::NotFinished {
                            events.push(ViewEvent::GameOver(status));
                        }
                    }
                    Err(e) => warn!(error = %e, "Discarding invalid snapshot"),
                },
                SessionNotice::Move(result) => self.apply_move_result(result, &mut events),
                SessionNotice::Chat(chat) => {
                    self.chat.push(chat.clone());
                    events.push(ViewEvent::Chat(chat));
                }
                SessionNotice::LoggedOut(reason) => {
                    self.gesture.cancel();
                    events.push(ViewEvent::LoggedOut { reason });
                }
                SessionNotice::ReconnectAbandoned { attempts } => {
                    warn!(attempts, "Connection abandoned");
                    events.push(ViewEvent::ConnectionAbandoned);
                }
            }
        }
        events
    }

    #[instrument(
        skip(self, result, events),
        fields(player = %result.player, encoded = %result.encoded, legal = result.legal)
    )]
    fn apply_move_result(&mut self, result: MoveResult, events: &mut Vec<ViewEvent>) {
        if !result.legal {
            info!("Move rejected");
            self.gesture.cancel();
            events.push(ViewEvent::MoveRejected {
                player: result.player,
                encoded: result.encoded,
            });
            return;
        }
        let Some(board) = self.board.as_mut() else {
            warn!("Move result before any snapshot");
            return;
        };
        let applied = result
            .confirmed_move()
            .map_err(|e| e.to_string())
            .and_then(|mv| board.apply_move(&mv, &result.player).map_err(|e| e.to_string()));
        if let Err(e) = applied {
            warn!(error = %e, "Could not apply confirmed move");
            return;
        }
        board.set_status(result.status);
        self.gesture.cancel();
        events.push(ViewEvent::MoveApplied {
            player: result.player,
            encoded: result.encoded,
        });
        if result.status != GameStatus::NotFinished {
            events.push(ViewEvent::GameOver(result.status));
        }
    }
}
