//! Session error types.

use derive_more::Display;

/// Reasons a session degrades, logs out, or drops a request.
///
/// These never cross the UI boundary as `Err`; they surface as
/// [`SessionNotice`](super::SessionNotice)s and derived state.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SessionError {
    /// The server rejected the access token as expired.
    #[display("Access token expired")]
    AuthExpired,

    /// The server rejected the access token for another reason.
    #[display("Authentication failed: {}", _0)]
    AuthFailed(String),

    /// The refresh endpoint did not issue new credentials.
    #[display("Token refresh failed: {}", _0)]
    RefreshFailed(String),

    /// No credentials are stored.
    #[display("No stored credentials")]
    MissingCredentials,

    /// The connection closed underneath a request.
    #[display("Connection lost")]
    ConnectionLost,

    /// There is no open connection to send on.
    #[display("No open connection")]
    NotConnected,

    /// Lower-level transport failure.
    #[display("Transport error: {}", _0)]
    Transport(String),
}

impl std::error::Error for SessionError {}
