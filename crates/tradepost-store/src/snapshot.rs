//! Point-in-time snapshots of the marketplace.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tradepost_core::{Item, MarketError, Order, Result, Transaction, User};
use uuid::Uuid;

/// A point-in-time snapshot of every table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Number of committed units of work at snapshot time.
    pub version: u64,

    /// Timestamp when the snapshot was taken.
    pub taken_at: Option<DateTime<Utc>>,

    pub users: Vec<User>,

    pub items: Vec<Item>,

    pub orders: Vec<Order>,

    /// Ledger entries in append order.
    pub transactions: Vec<Transaction>,
}

impl MarketSnapshot {
    /// Check that the ledger agrees with the orders: every order that left
    /// `pending` through a decision has exactly one transaction, and no
    /// pending order has any.
    pub fn verify(&self) -> Result<()> {
        let mut per_order: HashMap<Uuid, usize> = HashMap::new();
        for tx in &self.transactions {
            *per_order.entry(tx.order_id).or_default() += 1;
        }

        for order in &self.orders {
            let expected = usize::from(!order.status.is_pending());
            let found = per_order.remove(&order.id).unwrap_or(0);
            if found != expected {
                return Err(MarketError::Internal(format!(
                    "order {} is {} but has {} ledger entries",
                    order.id, order.status, found
                )));
            }
        }

        if let Some(order_id) = per_order.keys().next() {
            return Err(MarketError::Internal(format!(
                "ledger entry refers to unknown order {}",
                order_id
            )));
        }

        Ok(())
    }

    /// Read a snapshot from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref())
            .await
            .map_err(|e| MarketError::transient(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write the snapshot to a JSON file, replacing it atomically.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| MarketError::transient(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| MarketError::transient(e.to_string()))?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.items.is_empty() && self.orders.is_empty()
    }
}
