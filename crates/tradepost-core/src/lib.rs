//! # Tradepost Core
//!
//! Domain types for the Tradepost marketplace.
//!
//! This crate provides the fundamental building blocks:
//! - [`Item`] - Catalog entry with stock on hand
//! - [`Order`] - Customer purchase moving through [`OrderStatus`]
//! - [`Notification`] - Inbox view of a pending order
//! - [`Transaction`] - Ledger record of a decision
//! - [`MarketError`] - Error taxonomy shared by every layer

pub mod error;
pub mod event;
pub mod item;
pub mod notification;
pub mod order;
pub mod transaction;
pub mod types;
pub mod user;

// Re-exports for convenience
pub use error::{MarketError, Result};
pub use event::{EventKind, MarketEvent, RelayMessage};
pub use item::{Item, ItemDraft};
pub use notification::Notification;
pub use order::{Order, OrderRequest};
pub use transaction::Transaction;
pub use types::*;
pub use user::{Identity, User, UserDraft};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{MarketError, Result};
    pub use crate::event::{EventKind, MarketEvent, RelayMessage};
    pub use crate::item::{Item, ItemDraft};
    pub use crate::notification::Notification;
    pub use crate::order::{Order, OrderRequest};
    pub use crate::transaction::Transaction;
    pub use crate::types::{Decision, OrderAction, OrderStatus, Role};
    pub use crate::user::{Identity, User, UserDraft};
}
