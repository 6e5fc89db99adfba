//! Live notification stream.

use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Message},
};
use tradepost_core::{MarketError, MarketEvent, RelayMessage, Result, Role};
use uuid::Uuid;

use crate::client::USER_ID_HEADER;

/// Stream of marketplace events concerning one user.
pub struct NotificationStream {
    user_id: Uuid,
    role: Option<Role>,
    pending: usize,
    receiver: tokio::sync::mpsc::Receiver<MarketEvent>,
    _handle: tokio::task::JoinHandle<()>,
}

impl NotificationStream {
    /// Connect to the notification socket as `user_id`.
    pub async fn connect(ws_url: &str, user_id: Uuid) -> Result<Self> {
        let mut request = ws_url
            .into_client_request()
            .map_err(|e| MarketError::validation("url", e.to_string()))?;
        let header = HeaderValue::from_str(&user_id.to_string())
            .map_err(|e| MarketError::Internal(e.to_string()))?;
        request.headers_mut().insert(USER_ID_HEADER, header);

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| MarketError::transient(format!("connection failed: {}", e)))?;
        let (_, mut read) = ws_stream.split();

        // the node greets every subscriber before any event
        let (role, pending) = loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<RelayMessage>(&text)? {
                    RelayMessage::Connected { role, pending, .. } => break (Some(role), pending),
                    RelayMessage::Event { .. } => break (None, 0),
                },
                Some(Ok(Message::Close(_))) | None => {
                    return Err(MarketError::transient("stream closed before greeting"))
                }
                Some(Err(e)) => return Err(MarketError::transient(e.to_string())),
                Some(Ok(_)) => continue,
            }
        };

        let (tx, rx) = tokio::sync::mpsc::channel(100);

        let handle = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<RelayMessage>(&text) {
                        Ok(RelayMessage::Event { event }) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Ok(RelayMessage::Connected { .. }) => {}
                        Err(e) => tracing::warn!(error = %e, "Unreadable relay message"),
                    },
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }
        });

        Ok(Self {
            user_id,
            role,
            pending,
            receiver: rx,
            _handle: handle,
        })
    }

    /// The user this stream delivers events for.
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// The user's role as reported by the node.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Inbox size when the stream was opened.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Get the next event.
    pub async fn next(&mut self) -> Option<MarketEvent> {
        self.receiver.recv().await
    }

    /// Consume into a `Stream` of events.
    pub fn into_stream(self) -> ReceiverStream<MarketEvent> {
        ReceiverStream::new(self.receiver)
    }
}
