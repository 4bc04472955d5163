//! Server session: connection lifecycle, authentication, subscription and
//! message dispatch.

mod backoff;
mod connector;
mod credentials;
mod error;
mod machine;
pub mod protocol;
mod refresh;
mod ws;

pub use backoff::ReconnectPolicy;
pub use connector::{ConnectionId, Connector, SessionEvent};
pub use credentials::{
    CredentialError, CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore,
};
pub use error::SessionError;
pub use machine::{SessionNotice, SessionState, SessionTransport, Subscription};
pub use protocol::{
    AuthResult, BoardSnapshot, ChatMessage, Inbound, MoveDetails, MoveResult, Outbound,
};
pub use refresh::{HttpTokenRefresher, TokenRefresher};
pub use ws::WsConnector;
