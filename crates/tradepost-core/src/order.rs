//! Orders and their lifecycle.
//!
//! An order is created `pending` by a successful placement and then only
//! moves forward through [`OrderStatus::apply`]. Every transition is checked
//! against the acting user first: decisions belong to the order's employee,
//! receipt belongs to its customer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarketError, Result};
use crate::transaction::Transaction;
use crate::types::{Decision, OrderAction, OrderStatus};

/// Smallest quantity an order may request.
pub const MIN_ORDER_QUANTITY: u32 = 1;

/// A customer's request to buy a quantity of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier for this order.
    pub id: Uuid,

    pub customer_id: Uuid,

    /// Copied from the item's owner at placement. Later reassignment of the
    /// item does not touch it.
    pub employee_id: Uuid,

    pub item_id: Uuid,

    pub quantity: u32,

    pub status: OrderStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Payload for placing an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderRequest {
    pub item_id: Uuid,
    pub quantity: u32,
}

impl OrderRequest {
    pub fn validate(self) -> Result<Self> {
        if self.quantity < MIN_ORDER_QUANTITY {
            return Err(MarketError::validation(
                "quantity",
                format!("must be at least {}", MIN_ORDER_QUANTITY),
            ));
        }
        Ok(self)
    }
}

impl Order {
    /// Create a pending order.
    pub fn new(customer_id: Uuid, employee_id: Uuid, item_id: Uuid, quantity: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            employee_id,
            item_id,
            quantity,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if `user_id` is the order's customer or employee.
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.customer_id == user_id || self.employee_id == user_id
    }

    /// Apply `action` on behalf of `actor`.
    ///
    /// Returns the ledger entry the transition produces, if any. On error the
    /// order is left untouched.
    pub fn apply(&mut self, action: OrderAction, actor: Uuid) -> Result<Option<Transaction>> {
        match action {
            OrderAction::Accept | OrderAction::Decline if actor != self.employee_id => {
                return Err(MarketError::forbidden(
                    "Only the assigned employee may decide on this order.",
                ));
            }
            OrderAction::MarkReceived if actor != self.customer_id => {
                return Err(MarketError::forbidden(
                    "Only the customer who placed this order may mark it as received.",
                ));
            }
            _ => {}
        }

        let next = self.status.apply(action)?;
        self.status = next;
        self.updated_at = Utc::now();

        Ok(Decision::for_status(next).map(|decision| Transaction::record(self, decision)))
    }
}
