//! Ledger records of employee decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::Order;
use crate::types::Decision;

/// Permanent audit record of one accept/decline decision. Never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub employee_id: Uuid,
    pub item_id: Uuid,
    pub quantity: u32,
    pub status: Decision,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Mirror `order` as decided.
    pub fn record(order: &Order, decision: Decision) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: order.id,
            customer_id: order.customer_id,
            employee_id: order.employee_id,
            item_id: order.item_id,
            quantity: order.quantity,
            status: decision,
            timestamp: order.updated_at,
        }
    }
}
