//! # Tradepost SDK
//!
//! Client SDK for interacting with Tradepost nodes.

pub mod client;
pub mod stream;

pub use client::{AcceptedOrder, HealthStatus, MyOrder, OrderItem, TradepostClient};
pub use stream::NotificationStream;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::client::TradepostClient;
    pub use crate::stream::NotificationStream;
    pub use tradepost_core::prelude::*;
}
