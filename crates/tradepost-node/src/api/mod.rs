//! HTTP and WebSocket handlers.

pub mod health;
pub mod items;
pub mod notifications;
pub mod orders;
pub mod transactions;
pub mod users;
pub mod ws;

use serde::{Deserialize, Serialize};

/// Body of responses that only confirm an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
