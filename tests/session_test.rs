//! Tests for the session state machine.

mod common;

use checkers_client::{
    CredentialStore, Credentials, MemoryCredentialStore, SessionError, SessionEvent,
    SessionNotice, SessionState, SessionTransport, Subscription,
};
use common::{
    RecordingConnector, ScriptedRefresher, alice_credentials, auth_expired, auth_ok, fast_policy,
    open_and_auth, session,
};
use std::time::Duration;

#[test]
fn test_open_sends_auth_with_stored_token() {
    let mut session = session();
    let notices = session.connect();
    assert_eq!(notices, vec![SessionNotice::StateChanged(SessionState::Connecting)]);

    let id = session.connector().last_opened();
    session.handle(SessionEvent::Opened(id));
    assert_eq!(session.state(), SessionState::Connected);

    let sent = session.connector().sent_json();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["path"], "/auth");
    assert_eq!(sent[0]["jwt"], "access-1");
}

#[test]
fn test_connect_is_noop_while_open_or_opening() {
    let mut session = session();
    session.connect();
    assert!(session.connect().is_empty());
    assert_eq!(session.connector().opened.len(), 1);

    let id = session.connector().last_opened();
    session.handle(SessionEvent::Opened(id));
    assert!(session.connect().is_empty());
    assert_eq!(session.connector().opened.len(), 1);
}

#[test]
fn test_subscribe_before_auth_is_deferred() {
    let mut session = session();
    session.connect();
    session.subscribe_game(42);
    assert_eq!(session.subscription(), Subscription::Pending(42));

    let id = session.connector().last_opened();
    session.handle(SessionEvent::Opened(id));
    let notices = session.handle(SessionEvent::Received(id, auth_ok("alice")));

    assert!(notices.contains(&SessionNotice::StateChanged(SessionState::Subscribed {
        game_id: 42
    })));
    assert_eq!(session.subscription(), Subscription::Active(42));
    assert_eq!(session.connector().sent_paths(), vec!["/auth", "/subscribe"]);
    assert_eq!(session.connector().sent_json()[1]["game_id"], 42);
    assert_eq!(session.username(), Some("alice"));
}

#[test]
fn test_subscribe_when_authenticated_sends_now() {
    let mut session = session();
    open_and_auth(&mut session);
    assert_eq!(session.state(), SessionState::Authenticated);

    session.subscribe_game(7);
    assert_eq!(session.state(), SessionState::Subscribed { game_id: 7 });
    assert_eq!(session.connector().sent_paths(), vec!["/auth", "/subscribe"]);
}

#[test]
fn test_reconnect_resubscribes_same_game() {
    let mut session = session();
    session.connect();
    session.subscribe_game(42);
    let first = open_and_auth_existing(&mut session);

    let notices = session.handle(SessionEvent::Closed(first));
    assert_eq!(
        notices,
        vec![SessionNotice::StateChanged(SessionState::Reconnecting { attempt: 1 })]
    );
    assert_eq!(session.subscription(), Subscription::Pending(42));

    let (second, delay) = *session.connector().opened.last().expect("reopened");
    assert_ne!(second, first);
    assert_eq!(delay, Duration::ZERO);

    session.handle(SessionEvent::Opened(second));
    session.handle(SessionEvent::Received(second, auth_ok("alice")));

    assert_eq!(session.state(), SessionState::Subscribed { game_id: 42 });
    let on_second: Vec<String> = session
        .connector()
        .sent
        .iter()
        .filter(|(id, _)| *id == second)
        .map(|(_, text)| text.clone())
        .collect();
    assert_eq!(on_second.len(), 2);
    assert!(on_second[0].contains("/auth"));
    assert!(on_second[1].contains("/subscribe"));
}

fn open_and_auth_existing(session: &mut common::TestSession) -> checkers_client::ConnectionId {
    let id = session.connector().last_opened();
    session.handle(SessionEvent::Opened(id));
    session.handle(SessionEvent::Received(id, auth_ok("alice")));
    id
}

#[test]
fn test_close_without_subscription_disconnects() {
    let mut session = session();
    let id = open_and_auth(&mut session);
    session.handle(SessionEvent::Closed(id));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.connector().opened.len(), 1);
}

#[test]
fn test_backoff_exhaustion_abandons() {
    let mut session = session();
    session.subscribe_game(3);
    session.connect();

    // Initial attempt plus three retries all fail to open.
    let mut delays = Vec::new();
    for _ in 0..3 {
        let id = session.connector().last_opened();
        session.handle(SessionEvent::Closed(id));
        delays.push(session.connector().opened.last().expect("retry").1);
    }
    assert_eq!(
        delays,
        vec![Duration::ZERO, Duration::from_millis(10), Duration::from_millis(20)]
    );

    let id = session.connector().last_opened();
    let notices = session.handle(SessionEvent::Closed(id));
    assert!(notices.contains(&SessionNotice::ReconnectAbandoned { attempts: 3 }));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.subscription(), Subscription::Pending(3));
}

#[test]
fn test_successful_auth_resets_attempts() {
    let mut session = session();
    session.subscribe_game(3);
    session.connect();
    let id = session.connector().last_opened();
    session.handle(SessionEvent::Closed(id));
    let retry = session.connector().last_opened();
    session.handle(SessionEvent::Closed(retry));
    assert_eq!(session.state(), SessionState::Reconnecting { attempt: 2 });

    let id = open_and_auth_existing(&mut session);
    session.handle(SessionEvent::Closed(id));
    assert_eq!(session.state(), SessionState::Reconnecting { attempt: 1 });
}

#[test]
fn test_stale_events_ignored() {
    let mut session = session();
    session.subscribe_game(9);
    let first = open_and_auth(&mut session);
    session.handle(SessionEvent::Closed(first));
    let second = session.connector().last_opened();

    // Late traffic from the dead connection changes nothing.
    let chat = r#"{"message":"late"}"#.to_string();
    assert!(session.handle(SessionEvent::Received(first, chat)).is_empty());
    assert!(session.handle(SessionEvent::Closed(first)).is_empty());
    assert_eq!(session.state(), SessionState::Reconnecting { attempt: 1 });
    assert_eq!(session.current_connection(), Some(second));

    // A stale open is closed straight away.
    session.handle(SessionEvent::Opened(first));
    assert_eq!(session.connector().closed, vec![first, first]);
    assert_eq!(session.state(), SessionState::Reconnecting { attempt: 1 });
}

#[test]
fn test_dropped_connection_is_released() {
    let mut session = session();
    session.subscribe_game(4);
    let first = open_and_auth(&mut session);
    session.handle(SessionEvent::Closed(first));
    let retry = session.connector().last_opened();
    session.handle(SessionEvent::Closed(retry));

    assert_eq!(session.connector().closed, vec![first, retry]);
    assert_eq!(session.state(), SessionState::Reconnecting { attempt: 2 });
}

#[test]
fn test_refresh_failure_from_dropped_connection_ignored() {
    let mut session = session();
    session.subscribe_game(5);
    session.connect();
    let first = session.connector().last_opened();
    session.handle(SessionEvent::Opened(first));
    session.handle(SessionEvent::Received(first, auth_expired()));
    assert_eq!(session.state(), SessionState::Refreshing);

    // The connection drops while the refresh is in flight and a new one
    // authenticates with the stored token.
    session.handle(SessionEvent::Closed(first));
    let second = session.connector().last_opened();
    session.handle(SessionEvent::Opened(second));
    session.handle(SessionEvent::Received(second, auth_ok("alice")));
    assert_eq!(session.state(), SessionState::Subscribed { game_id: 5 });

    let notices = session.handle(SessionEvent::Refreshed(
        first,
        Err(SessionError::Transport("connection reset".into())),
    ));

    assert!(notices.is_empty());
    assert_eq!(session.state(), SessionState::Subscribed { game_id: 5 });
    assert_eq!(session.subscription(), Subscription::Active(5));
    assert_eq!(session.store().load(), Some(alice_credentials()));
    assert!(!session.connector().closed.contains(&second));
}

#[test]
fn test_refresh_success_from_dropped_connection_only_persists() {
    let mut session = session();
    session.subscribe_game(5);
    session.connect();
    let first = session.connector().last_opened();
    session.handle(SessionEvent::Opened(first));
    session.handle(SessionEvent::Received(first, auth_expired()));
    session.handle(SessionEvent::Closed(first));
    let second = session.connector().last_opened();
    session.handle(SessionEvent::Opened(second));
    let sent_before = session.connector().sent.len();

    let fresh = Credentials::new("alice".into(), "access-2".into(), "refresh-2".into());
    let notices = session.handle(SessionEvent::Refreshed(first, Ok(fresh.clone())));

    assert!(notices.is_empty());
    assert_eq!(session.store().load(), Some(fresh));
    assert_eq!(session.connector().sent.len(), sent_before);
    assert_eq!(session.state(), SessionState::Connected);
}

#[test]
fn test_missing_credentials_logs_out() {
    let mut session = SessionTransport::new(
        RecordingConnector::default(),
        ScriptedRefresher::default(),
        MemoryCredentialStore::new(),
        fast_policy(None),
    );
    session.subscribe_game(1);
    session.connect();
    let id = session.connector().last_opened();
    let notices = session.handle(SessionEvent::Opened(id));

    assert!(notices.contains(&SessionNotice::LoggedOut(SessionError::MissingCredentials)));
    assert_eq!(session.state(), SessionState::LoggedOut);
    assert_eq!(session.subscription(), Subscription::None);
    assert!(session.connector().sent.is_empty());
    assert_eq!(session.connector().closed, vec![id]);

    // The close that follows does not trigger a reconnect.
    session.handle(SessionEvent::Closed(id));
    assert_eq!(session.connector().opened.len(), 1);
}

#[test]
fn test_expired_token_refreshes_and_retries_auth() {
    let mut session = session();
    session.subscribe_game(5);
    session.connect();
    let id = session.connector().last_opened();
    session.handle(SessionEvent::Opened(id));
    session.handle(SessionEvent::Received(id, auth_expired()));

    assert_eq!(session.state(), SessionState::Refreshing);
    assert_eq!(
        session.refresher().requests,
        vec![(id, "refresh-1".to_string())]
    );

    let fresh = Credentials::new("alice".into(), "access-2".into(), "refresh-2".into());
    session.handle(SessionEvent::Refreshed(id, Ok(fresh.clone())));
    assert_eq!(session.store().load(), Some(fresh));

    let sent = session.connector().sent_json();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1]["path"], "/auth");
    assert_eq!(sent[1]["jwt"], "access-2");

    session.handle(SessionEvent::Received(id, auth_ok("alice")));
    assert_eq!(session.state(), SessionState::Subscribed { game_id: 5 });
}

#[test]
fn test_refresh_failure_clears_credentials() {
    let mut session = session();
    session.connect();
    let id = session.connector().last_opened();
    session.handle(SessionEvent::Opened(id));
    session.handle(SessionEvent::Received(id, auth_expired()));

    let notices = session.handle(SessionEvent::Refreshed(
        id,
        Err(SessionError::RefreshFailed("HTTP 401 Unauthorized".into())),
    ));

    assert!(notices.iter().any(|n| matches!(
        n,
        SessionNotice::LoggedOut(SessionError::RefreshFailed(_))
    )));
    assert_eq!(session.store().load(), None);
    assert_eq!(session.state(), SessionState::LoggedOut);
}

#[test]
fn test_rejected_token_logs_out() {
    let mut session = session();
    session.connect();
    let id = session.connector().last_opened();
    session.handle(SessionEvent::Opened(id));
    let reply = r#"{"authenticated":false,"error":"Invalid signature"}"#.to_string();
    let notices = session.handle(SessionEvent::Received(id, reply));

    assert!(notices.contains(&SessionNotice::LoggedOut(SessionError::AuthFailed(
        "Invalid signature".into()
    ))));
    assert!(session.refresher().requests.is_empty());
    assert_eq!(session.store().access_token(), None);
}

#[test]
fn test_sends_dropped_without_connection() {
    let mut session = session();
    session.send_move("9-14");
    session.send_chat("hello");
    assert!(session.connector().sent.is_empty());

    session.connect();
    session.send_move("9-14");
    assert!(session.connector().sent.is_empty());
}

#[test]
fn test_disconnect_stops_reconnect() {
    let mut session = session();
    session.subscribe_game(11);
    let id = open_and_auth(&mut session);

    let notices = session.disconnect();
    assert_eq!(notices, vec![SessionNotice::StateChanged(SessionState::Disconnected)]);
    assert_eq!(session.subscription(), Subscription::None);
    assert_eq!(session.connector().closed, vec![id]);

    session.handle(SessionEvent::Closed(id));
    assert_eq!(session.connector().opened.len(), 1);
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn test_inbound_dispatch_and_unknown_shapes() {
    let mut session = session();
    let id = open_and_auth(&mut session);

    let notices = session.handle(SessionEvent::Received(
        id,
        r#"{"player":"bob","message":"hi"}"#.into(),
    ));
    assert!(matches!(notices.as_slice(), [SessionNotice::Chat(chat)] if chat.message == "hi"));

    assert!(session
        .handle(SessionEvent::Received(id, r#"{"unexpected":true}"#.into()))
        .is_empty());
    assert!(session
        .handle(SessionEvent::Received(id, "Game not loaded!".into()))
        .is_empty());
}

#[test]
fn test_stored_username_known_before_auth() {
    let session = SessionTransport::new(
        RecordingConnector::default(),
        ScriptedRefresher::default(),
        MemoryCredentialStore::with(alice_credentials()),
        fast_policy(None),
    );
    assert_eq!(session.username(), Some("alice"));
}
