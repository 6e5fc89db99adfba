//! # Tradepost Store
//!
//! Transactional storage for the marketplace: users, the item catalog,
//! orders and the append-only transaction ledger, plus the notification
//! relay that fans committed events out to live subscribers.

pub mod relay;
pub mod snapshot;
pub mod store;

pub use relay::{NotificationRelay, RelayFilter, RelaySubscription};
pub use snapshot::MarketSnapshot;
pub use store::{
    InMemoryMarketStore, ItemFilter, LedgerFilter, MarketStore, OrderDetails, OrderFilter,
    Placement, TransitionOutcome,
};
