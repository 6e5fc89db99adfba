//! Application state.

use std::sync::Arc;

use tradepost_store::{InMemoryMarketStore, MarketStore, NotificationRelay};

use crate::engine::OrderEngine;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The order lifecycle engine.
    pub engine: Arc<OrderEngine>,
}

impl AppState {
    /// Create application state over `store`.
    pub fn new(store: Arc<dyn MarketStore>, relay: NotificationRelay) -> Self {
        Self {
            engine: Arc::new(OrderEngine::new(store, relay)),
        }
    }

    /// State over a fresh in-memory store.
    pub fn in_memory(event_capacity: usize) -> Self {
        Self::new(
            Arc::new(InMemoryMarketStore::new()),
            NotificationRelay::new(event_capacity),
        )
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryMarketStore::new()), NotificationRelay::default())
    }
}
