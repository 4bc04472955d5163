//! Token refresh boundary.

use super::connector::{ConnectionId, SessionEvent};
use super::credentials::Credentials;
use super::error::SessionError;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Exchanges a refresh token for new credentials.
///
/// Completion is reported as [`SessionEvent::Refreshed`], tagged with the
/// connection that asked.
pub trait TokenRefresher {
    /// Starts a refresh on behalf of connection `id`.
    fn refresh(&mut self, id: ConnectionId, refresh_token: String);
}

/// Refreshes tokens against the account service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    url: String,
    client: reqwest::Client,
    events: UnboundedSender<SessionEvent>,
}

impl HttpTokenRefresher {
    /// Creates a refresher posting to `url`.
    pub fn new(url: String, events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
            events,
        }
    }
}

impl TokenRefresher for HttpTokenRefresher {
    #[instrument(skip_all, fields(url = %self.url, %id))]
    fn refresh(&mut self, id: ConnectionId, refresh_token: String) {
        let client = self.client.clone();
        let url = self.url.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = request_refresh(&client, &url, &refresh_token).await;
            if events.send(SessionEvent::Refreshed(id, result)).is_err() {
                debug!("Session gone before refresh finished");
            }
        });
    }
}

#[instrument(skip(client, refresh_token))]
async fn request_refresh(
    client: &reqwest::Client,
    url: &str,
    refresh_token: &str,
) -> Result<Credentials, SessionError> {
    debug!("Requesting token refresh");
    let response = client
        .post(url)
        .json(&serde_json::json!({ "token": refresh_token }))
        .send()
        .await
        .map_err(|e| SessionError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        warn!(%status, "Refresh rejected");
        return Err(SessionError::RefreshFailed(format!("HTTP {}", status)));
    }

    let credentials: Credentials = response
        .json()
        .await
        .map_err(|e| SessionError::RefreshFailed(format!("Invalid response: {}", e)))?;
    info!(username = %credentials.username(), "Token refreshed");
    Ok(credentials)
}
