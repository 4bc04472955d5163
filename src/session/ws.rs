//! WebSocket [`Connector`] on tokio-tungstenite.

use super::connector::{ConnectionId, Connector, SessionEvent};
use super::error::SessionError;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

/// Opens one WebSocket task per connection id.
///
/// Each task reports `Opened`, every text frame and finally `Closed` on the
/// shared event channel. Outgoing frames go through a per-connection queue.
#[derive(Debug)]
pub struct WsConnector {
    url: String,
    events: UnboundedSender<SessionEvent>,
    outgoing: HashMap<ConnectionId, UnboundedSender<String>>,
}

impl WsConnector {
    /// Creates a connector for `url` reporting on `events`.
    pub fn new(url: String, events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            url,
            events,
            outgoing: HashMap::new(),
        }
    }
}

impl Connector for WsConnector {
    #[instrument(skip(self), fields(url = %self.url))]
    fn open(&mut self, id: ConnectionId, delay: Duration) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outgoing.insert(id, tx);
        tokio::spawn(run_connection(
            self.url.clone(),
            id,
            delay,
            rx,
            self.events.clone(),
        ));
    }

    fn send(&mut self, id: ConnectionId, text: String) -> Result<(), SessionError> {
        let queue = self.outgoing.get(&id).ok_or(SessionError::NotConnected)?;
        queue.send(text).map_err(|_| SessionError::ConnectionLost)
    }

    fn close(&mut self, id: ConnectionId) {
        if self.outgoing.remove(&id).is_some() {
            debug!(%id, "Connection queue dropped");
        }
    }
}

#[instrument(skip(outgoing, events))]
async fn run_connection(
    url: String,
    id: ConnectionId,
    delay: Duration,
    mut outgoing: UnboundedReceiver<String>,
    events: UnboundedSender<SessionEvent>,
) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(error = %e, "WebSocket connect failed");
            let _ = events.send(SessionEvent::Closed(id));
            return;
        }
    };
    info!("WebSocket open");
    if events.send(SessionEvent::Opened(id)).is_err() {
        return;
    }

    let (mut sink, mut frames) = stream.split();
    loop {
        tokio::select! {
            queued = outgoing.recv() => match queued {
                Some(text) => {
                    if let Err(e) = sink.send(Message::text(text)).await {
                        warn!(error = %e, "WebSocket write failed");
                        break;
                    }
                }
                None => {
                    debug!("Closing on request");
                    let _ = sink.close().await;
                    break;
                }
            },
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(SessionEvent::Received(id, text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Server closed connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket read failed");
                    break;
                }
                None => break,
            },
        }
    }
    let _ = events.send(SessionEvent::Closed(id));
}
