//! Test doubles for driving the session without a runtime.

#![allow(dead_code)]

use checkers_client::{
    CellKind, ConnectionId, Connector, Credentials, MemoryCredentialStore, ReconnectPolicy,
    SessionError, SessionEvent, SessionTransport, TokenRefresher,
};
use std::time::Duration;

/// Records every transport command.
#[derive(Debug, Default)]
pub struct RecordingConnector {
    pub opened: Vec<(ConnectionId, Duration)>,
    pub sent: Vec<(ConnectionId, String)>,
    pub closed: Vec<ConnectionId>,
}

impl RecordingConnector {
    /// Sent frames parsed as JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .map(|(_, text)| serde_json::from_str(text).expect("sent frame is JSON"))
            .collect()
    }

    /// `path` of every sent frame.
    pub fn sent_paths(&self) -> Vec<String> {
        self.sent_json()
            .iter()
            .map(|v| v["path"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Id of the most recent open.
    pub fn last_opened(&self) -> ConnectionId {
        self.opened.last().expect("a connection was opened").0
    }
}

impl Connector for RecordingConnector {
    fn open(&mut self, id: ConnectionId, delay: Duration) {
        self.opened.push((id, delay));
    }

    fn send(&mut self, id: ConnectionId, text: String) -> Result<(), SessionError> {
        if self.closed.contains(&id) {
            return Err(SessionError::NotConnected);
        }
        self.sent.push((id, text));
        Ok(())
    }

    fn close(&mut self, id: ConnectionId) {
        self.closed.push(id);
    }
}

/// Records refresh requests; results are fed in by the test.
#[derive(Debug, Default)]
pub struct ScriptedRefresher {
    pub requests: Vec<(ConnectionId, String)>,
}

impl TokenRefresher for ScriptedRefresher {
    fn refresh(&mut self, id: ConnectionId, refresh_token: String) {
        self.requests.push((id, refresh_token));
    }
}

pub type TestSession =
    SessionTransport<RecordingConnector, ScriptedRefresher, MemoryCredentialStore>;

pub fn alice_credentials() -> Credentials {
    Credentials::new("alice".into(), "access-1".into(), "refresh-1".into())
}

pub fn fast_policy(max_attempts: Option<u32>) -> ReconnectPolicy {
    ReconnectPolicy {
        initial_delay_ms: 10,
        max_delay_ms: 40,
        max_attempts,
    }
}

/// Session with stored credentials for alice.
pub fn session() -> TestSession {
    SessionTransport::new(
        RecordingConnector::default(),
        ScriptedRefresher::default(),
        MemoryCredentialStore::with(alice_credentials()),
        fast_policy(Some(3)),
    )
}

pub fn auth_ok(username: &str) -> String {
    serde_json::json!({ "kind": "auth", "authenticated": true, "username": username }).to_string()
}

pub fn auth_expired() -> String {
    serde_json::json!({ "authenticated": false, "error": "Token expired" }).to_string()
}

/// Opens and authenticates, returning the connection id.
pub fn open_and_auth(session: &mut TestSession) -> ConnectionId {
    session.connect();
    let id = session.connector().last_opened();
    session.handle(SessionEvent::Opened(id));
    session.handle(SessionEvent::Received(id, auth_ok("alice")));
    id
}

/// Opening layout as wire rows.
pub fn standard_rows() -> Vec<Vec<CellKind>> {
    checkers_client::Board::standard()
        .rows()
        .map(|row| row.to_vec())
        .collect()
}

/// Snapshot JSON for alice (White) vs bob (Red).
pub fn snapshot_json(rows: &[Vec<CellKind>], current_player: &str) -> String {
    serde_json::json!({
        "kind": "board",
        "username1": "alice",
        "username2": "bob",
        "ai": false,
        "currentState": rows,
        "currentPlayer": current_player,
        "userTurn": current_player == "alice",
        "status": "NotFinished",
    })
    .to_string()
}
