//! WebSocket endpoints.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tracing::{debug, warn};
use tradepost_core::{Identity, RelayMessage, Role};

use crate::identity::Caller;
use crate::state::AppState;

/// Live marketplace events for the caller.
pub async fn notification_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Response {
    ws.on_upgrade(move |socket| handle_notification_stream(socket, identity, state))
}

async fn send(socket: &mut WebSocket, msg: &RelayMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to encode relay message");
            return true;
        }
    };
    socket.send(Message::Text(json)).await.is_ok()
}

async fn handle_notification_stream(mut socket: WebSocket, identity: Identity, state: AppState) {
    let mut subscription = state.engine.subscribe(&identity).await;

    let pending = match identity.role {
        Role::Employee => state
            .engine
            .list_pending_notifications(&identity)
            .await
            .map(|n| n.len())
            .unwrap_or_default(),
        Role::Customer => 0,
    };
    let connected = RelayMessage::Connected {
        user_id: identity.user_id,
        role: identity.role,
        pending,
    };
    debug!(user_id = %identity.user_id, subscription = %subscription.id, "Notification stream opened");

    if send(&mut socket, &connected).await {
        loop {
            tokio::select! {
                event = subscription.recv() => {
                    let Some(event) = event else { break };
                    if !send(&mut socket, &RelayMessage::Event { event }).await {
                        break;
                    }
                }
                msg = socket.recv() => {
                    match msg {
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(Message::Ping(data))) => {
                            let _ = socket.send(Message::Pong(data)).await;
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    state.engine.relay().unsubscribe(subscription.id).await;
    debug!(user_id = %identity.user_id, "Notification stream closed");
}
