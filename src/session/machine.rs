//! Connection, authentication and subscription state machine.
//!
//! [`SessionTransport`] performs no I/O of its own. Commands go out through
//! a [`Connector`] and a [`TokenRefresher`]; their results come back as
//! [`SessionEvent`]s passed to [`SessionTransport::handle`]. Every call
//! returns the [`SessionNotice`]s the caller should act on.

use super::backoff::ReconnectPolicy;
use super::connector::{ConnectionId, Connector, SessionEvent};
use super::credentials::{CredentialStore, Credentials};
use super::error::SessionError;
use super::protocol::{AuthResult, BoardSnapshot, ChatMessage, Inbound, MoveResult, Outbound};
use super::refresh::TokenRefresher;
use derive_more::Display;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Named session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    /// No connection and none wanted.
    #[display("disconnected")]
    Disconnected,
    /// First connection attempt in flight.
    #[display("connecting")]
    Connecting,
    /// Open but not yet authenticated.
    #[display("connected")]
    Connected,
    /// Open; access token expired and a refresh is in flight.
    #[display("refreshing")]
    Refreshing,
    /// Open and authenticated.
    #[display("authenticated")]
    Authenticated,
    /// Authenticated and following a game.
    #[display("subscribed to game {}", game_id)]
    Subscribed {
        /// Followed game.
        game_id: u64,
    },
    /// Connection lost; retry `attempt` in flight.
    #[display("reconnecting (attempt {})", attempt)]
    Reconnecting {
        /// 1-based retry count.
        attempt: u32,
    },
    /// Credentials cleared; the user must log in again.
    #[display("logged out")]
    LoggedOut,
}

impl SessionState {
    /// True while a connection is open.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            SessionState::Connected
                | SessionState::Refreshing
                | SessionState::Authenticated
                | SessionState::Subscribed { .. }
        )
    }

    /// True while a connection is opening.
    pub fn is_opening(self) -> bool {
        matches!(
            self,
            SessionState::Connecting | SessionState::Reconnecting { .. }
        )
    }

    /// True once the server accepted the access token.
    pub fn is_authenticated(self) -> bool {
        matches!(
            self,
            SessionState::Authenticated | SessionState::Subscribed { .. }
        )
    }
}

/// The game the session should follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subscription {
    /// No game wanted.
    #[default]
    None,
    /// Wanted; `/subscribe` not yet sent on the current connection.
    Pending(u64),
    /// `/subscribe` sent on the current connection.
    Active(u64),
}

impl Subscription {
    /// The wanted game, pending or active.
    pub fn game_id(self) -> Option<u64> {
        match self {
            Subscription::None => None,
            Subscription::Pending(id) | Subscription::Active(id) => Some(id),
        }
    }
}

/// Things the owner of a session must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// The session moved to a new state.
    StateChanged(SessionState),
    /// The server accepted the access token.
    Authenticated {
        /// Username the server reported, or the stored one.
        username: Option<String>,
    },
    /// Full game state arrived.
    Board(BoardSnapshot),
    /// A move result arrived.
    Move(MoveResult),
    /// A chat line arrived.
    Chat(ChatMessage),
    /// Credentials were cleared.
    LoggedOut(SessionError),
    /// Reconnect attempts ran out.
    ReconnectAbandoned {
        /// Attempts made.
        attempts: u32,
    },
}

/// Client session over one logical server connection.
#[derive(Debug)]
pub struct SessionTransport<C, R, S> {
    connector: C,
    refresher: R,
    store: S,
    policy: ReconnectPolicy,
    state: SessionState,
    current: Option<ConnectionId>,
    next_id: u64,
    subscription: Subscription,
    attempts: u32,
    username: Option<String>,
}

impl<C, R, S> SessionTransport<C, R, S>
where
    C: Connector,
    R: TokenRefresher,
    S: CredentialStore,
{
    /// Creates a disconnected session.
    pub fn new(connector: C, refresher: R, store: S, policy: ReconnectPolicy) -> Self {
        let username = store.username();
        Self {
            connector,
            refresher,
            store,
            policy,
            state: SessionState::Disconnected,
            current: None,
            next_id: 0,
            subscription: Subscription::None,
            attempts: 0,
            username,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Wanted game and whether it has been sent.
    pub fn subscription(&self) -> Subscription {
        self.subscription
    }

    /// Connection events are currently accepted from.
    pub fn current_connection(&self) -> Option<ConnectionId> {
        self.current
    }

    /// Local player's username, once known.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The transport.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// The refresher.
    pub fn refresher(&self) -> &R {
        &self.refresher
    }

    /// The credential store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens a connection unless one is open or opening.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn connect(&mut self) -> Vec<SessionNotice> {
        let mut notices = Vec::new();
        if self.state.is_open() || self.state.is_opening() {
            debug!("Connection already open or opening");
            return notices;
        }
        self.attempts = 0;
        let id = self.open_connection(Duration::ZERO);
        info!(%id, "Connecting");
        self.transition(SessionState::Connecting, &mut notices);
        notices
    }

    /// Follows `game_id`, now if authenticated or else once auth succeeds.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn subscribe_game(&mut self, game_id: u64) -> Vec<SessionNotice> {
        let mut notices = Vec::new();
        self.subscription = Subscription::Pending(game_id);
        if self.state.is_authenticated() {
            self.send_subscribe(game_id, &mut notices);
        } else {
            debug!(game_id, "Subscription deferred until authenticated");
        }
        notices
    }

    /// Submits an encoded move. Dropped when no connection is open.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn send_move(&mut self, encoded: &str) {
        self.send_outbound(&Outbound::Move {
            encoded: encoded.to_string(),
        });
    }

    /// Posts a chat line. Dropped when no connection is open.
    #[instrument(skip(self, message), fields(state = %self.state, len = message.len()))]
    pub fn send_chat(&mut self, message: &str) {
        self.send_outbound(&Outbound::Chat {
            message: message.to_string(),
        });
    }

    /// Closes the connection and forgets the subscription.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn disconnect(&mut self) -> Vec<SessionNotice> {
        let mut notices = Vec::new();
        self.subscription = Subscription::None;
        self.attempts = 0;
        if let Some(id) = self.current.take() {
            info!(%id, "Disconnecting");
            self.connector.close(id);
        }
        if self.state != SessionState::LoggedOut {
            self.transition(SessionState::Disconnected, &mut notices);
        }
        notices
    }

    /// Feeds one transport or refresh result into the machine.
    #[instrument(skip(self, event), fields(state = %self.state))]
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionNotice> {
        let mut notices = Vec::new();
        match event {
            SessionEvent::Opened(id) => {
                if self.is_stale(id) {
                    debug!(%id, "Closing stale connection");
                    self.connector.close(id);
                } else {
                    self.on_opened(&mut notices);
                }
            }
            SessionEvent::Received(id, text) => {
                if self.is_stale(id) {
                    debug!(%id, "Ignoring message on stale connection");
                } else {
                    self.on_message(&text, &mut notices);
                }
            }
            SessionEvent::Closed(id) => {
                if self.is_stale(id) {
                    debug!(%id, "Ignoring close of stale connection");
                } else {
                    self.on_closed(id, &mut notices);
                }
            }
            SessionEvent::Refreshed(id, result) => self.on_refreshed(id, result, &mut notices),
        }
        notices
    }

    fn is_stale(&self, id: ConnectionId) -> bool {
        self.current != Some(id)
    }

    fn open_connection(&mut self, delay: Duration) -> ConnectionId {
        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        self.current = Some(id);
        self.connector.open(id, delay);
        id
    }

    fn transition(&mut self, next: SessionState, notices: &mut Vec<SessionNotice>) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "Session state change");
            self.state = next;
            notices.push(SessionNotice::StateChanged(next));
        }
    }

    fn send_outbound(&mut self, message: &Outbound) -> bool {
        let Some(id) = self.current.filter(|_| self.state.is_open()) else {
            warn!(?message, "Dropping request, no open connection");
            return false;
        };
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to encode request");
                return false;
            }
        };
        match self.connector.send(id, text) {
            Ok(()) => true,
            Err(e) => {
                warn!(%id, error = %e, "Send failed");
                false
            }
        }
    }

    fn send_subscribe(&mut self, game_id: u64, notices: &mut Vec<SessionNotice>) {
        if self.send_outbound(&Outbound::Subscribe { game_id }) {
            info!(game_id, "Subscribed");
            self.subscription = Subscription::Active(game_id);
            self.transition(SessionState::Subscribed { game_id }, notices);
        }
    }

    fn send_auth(&mut self, credentials: &Credentials) {
        self.send_outbound(&Outbound::Auth {
            jwt: Some(credentials.token().clone()),
        });
    }

    fn on_opened(&mut self, notices: &mut Vec<SessionNotice>) {
        info!(id = ?self.current, "Connection open");
        self.transition(SessionState::Connected, notices);
        match self.store.load() {
            Some(credentials) => {
                self.username = Some(credentials.username().clone());
                self.send_auth(&credentials);
            }
            None => self.log_out(SessionError::MissingCredentials, notices),
        }
    }

    fn on_message(&mut self, text: &str, notices: &mut Vec<SessionNotice>) {
        match Inbound::decode(text) {
            Ok(Inbound::Auth(result)) => self.on_auth(result, notices),
            Ok(Inbound::Board(snapshot)) => notices.push(SessionNotice::Board(snapshot)),
            Ok(Inbound::Move(result)) => notices.push(SessionNotice::Move(result)),
            Ok(Inbound::Chat(chat)) => notices.push(SessionNotice::Chat(chat)),
            Err(e) => debug!(error = %e, %text, "Dropping unrecognised message"),
        }
    }

    fn on_auth(&mut self, result: AuthResult, notices: &mut Vec<SessionNotice>) {
        if result.authenticated {
            if let Some(username) = result.username {
                self.username = Some(username);
            }
            info!(username = ?self.username, "Authenticated");
            self.attempts = 0;
            self.transition(SessionState::Authenticated, notices);
            notices.push(SessionNotice::Authenticated {
                username: self.username.clone(),
            });
            if let Some(game_id) = self.subscription.game_id() {
                self.send_subscribe(game_id, notices);
            }
        } else if result.is_expired() {
            warn!(reason = %SessionError::AuthExpired, "Refreshing credentials");
            match self.store.refresh_token() {
                Some(token) => match self.current {
                    Some(id) => {
                        self.transition(SessionState::Refreshing, notices);
                        self.refresher.refresh(id, token);
                    }
                    None => debug!("Expired token reported without a connection"),
                },
                None => self.log_out(SessionError::MissingCredentials, notices),
            }
        } else {
            let reason = result.error.unwrap_or_else(|| "rejected".to_string());
            self.log_out(SessionError::AuthFailed(reason), notices);
        }
    }

    fn on_refreshed(
        &mut self,
        id: ConnectionId,
        result: Result<Credentials, SessionError>,
        notices: &mut Vec<SessionNotice>,
    ) {
        let stale = self.is_stale(id);
        let credentials = match result {
            Ok(credentials) => credentials,
            Err(e) if stale => {
                debug!(%id, error = %e, "Ignoring refresh failure for stale connection");
                return;
            }
            Err(e) => {
                let reason = match e {
                    SessionError::RefreshFailed(_) => e,
                    other => SessionError::RefreshFailed(other.to_string()),
                };
                self.log_out(reason, notices);
                return;
            }
        };
        if self.state == SessionState::LoggedOut {
            debug!(%id, "Dropping refreshed credentials after logout");
            return;
        }
        if let Err(e) = self.store.store(credentials.clone()) {
            error!(error = %e, "Failed to persist refreshed credentials");
        }
        self.username = Some(credentials.username().clone());
        if !stale && self.state == SessionState::Refreshing {
            self.transition(SessionState::Connected, notices);
            self.send_auth(&credentials);
        } else {
            debug!(%id, "Refresh outlived its connection; next open uses new token");
        }
    }

    fn on_closed(&mut self, id: ConnectionId, notices: &mut Vec<SessionNotice>) {
        info!(%id, error = %SessionError::ConnectionLost, "Connection closed");
        self.connector.close(id);
        self.current = None;
        if self.state == SessionState::LoggedOut {
            return;
        }
        match self.subscription.game_id() {
            Some(game_id) => {
                self.subscription = Subscription::Pending(game_id);
                self.schedule_reconnect(notices);
            }
            None => self.transition(SessionState::Disconnected, notices),
        }
    }

    fn schedule_reconnect(&mut self, notices: &mut Vec<SessionNotice>) {
        match self.policy.delay_for(self.attempts) {
            Some(delay) => {
                self.attempts += 1;
                let id = self.open_connection(delay);
                info!(%id, attempt = self.attempts, ?delay, "Reconnecting");
                self.transition(
                    SessionState::Reconnecting {
                        attempt: self.attempts,
                    },
                    notices,
                );
            }
            None => {
                warn!(attempts = self.attempts, "Giving up on reconnect");
                self.transition(SessionState::Disconnected, notices);
                notices.push(SessionNotice::ReconnectAbandoned {
                    attempts: self.attempts,
                });
            }
        }
    }

    fn log_out(&mut self, reason: SessionError, notices: &mut Vec<SessionNotice>) {
        warn!(%reason, "Logging out");
        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear credentials");
        }
        if let Some(id) = self.current.take() {
            self.connector.close(id);
        }
        self.subscription = Subscription::None;
        self.username = None;
        self.attempts = 0;
        self.transition(SessionState::LoggedOut, notices);
        notices.push(SessionNotice::LoggedOut(reason));
    }
}
