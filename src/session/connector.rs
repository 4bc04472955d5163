//! Transport boundary and the events it reports back.

use super::credentials::Credentials;
use super::error::SessionError;
use derive_more::Display;
use std::time::Duration;

/// Identifies one transport connection.
///
/// Each open attempt gets a fresh id; events tagged with an id that is no
/// longer current are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("conn#{}", _0)]
pub struct ConnectionId(pub u64);

/// Results fed back into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Connection `id` is open.
    Opened(ConnectionId),
    /// A text frame arrived on `id`.
    Received(ConnectionId, String),
    /// Connection `id` closed or failed to open.
    Closed(ConnectionId),
    /// A token refresh requested on `id` finished.
    Refreshed(ConnectionId, Result<Credentials, SessionError>),
}

/// Opens, writes to, and closes connections without blocking.
///
/// Implementations report progress as [`SessionEvent`]s on their own
/// channel.
pub trait Connector {
    /// Starts opening `id` after `delay`. Reports `Opened` or `Closed`.
    fn open(&mut self, id: ConnectionId, delay: Duration);

    /// Queues a text frame on an open connection.
    fn send(&mut self, id: ConnectionId, text: String) -> Result<(), SessionError>;

    /// Closes `id`. Later events for it are stale.
    fn close(&mut self, id: ConnectionId);
}
