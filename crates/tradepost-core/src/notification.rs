//! Inbox entries for pending orders.
//!
//! A notification is never stored on its own. It is rendered from a pending
//! order plus the item and customer it refers to, so it cannot disagree with
//! the order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::Item;
use crate::order::Order;
use crate::types::OrderStatus;
use crate::user::User;

/// Placeholder for names of records that no longer exist.
pub const UNKNOWN: &str = "Unknown";

/// Snapshot of a pending order as shown to its employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub order_id: Uuid,
    pub employee_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: u32,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub status: OrderStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Render the inbox entry for `order`, or `None` once it left `pending`.
    pub fn for_order(order: &Order, item: Option<&Item>, customer: Option<&User>) -> Option<Self> {
        if !order.status.is_pending() {
            return None;
        }

        let item_name = item.map_or(UNKNOWN, |i| i.name.as_str()).to_string();
        let customer_name = customer.map_or(UNKNOWN, |c| c.name.as_str()).to_string();
        let customer_email = customer.map_or(UNKNOWN, |c| c.email.as_str()).to_string();

        Some(Self {
            order_id: order.id,
            employee_id: order.employee_id,
            item_id: order.item_id,
            message: format!("New order placed by {} for item {}", customer_name, item_name),
            item_name,
            quantity: order.quantity,
            customer_id: order.customer_id,
            customer_name,
            customer_email,
            status: order.status,
            created_at: order.created_at,
        })
    }
}
