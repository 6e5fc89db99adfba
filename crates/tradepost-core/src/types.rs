//! Common types used across Tradepost.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};

/// Role of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses items and places orders.
    Customer,
    /// Lists items and decides on orders placed against them.
    Employee,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => f.write_str("customer"),
            Role::Employee => f.write_str("employee"),
        }
    }
}

/// Status of an order.
///
/// `pending -> accepted -> completed` or `pending -> declined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, stock reserved, awaiting the employee's decision.
    Pending,
    /// Accepted by the employee, awaiting the customer's receipt.
    Accepted,
    /// Declined by the employee.
    Declined,
    /// Received by the customer.
    Completed,
}

/// A request to move an order to its next status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Accept,
    Decline,
    MarkReceived,
}

impl OrderStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Declined | OrderStatus::Completed)
    }

    /// Returns true if the order still awaits an employee decision.
    pub fn is_pending(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns the status an action leads to from this one, or a conflict
    /// when the action is not allowed here.
    pub fn apply(self, action: OrderAction) -> Result<OrderStatus> {
        match (self, action) {
            (OrderStatus::Pending, OrderAction::Accept) => Ok(OrderStatus::Accepted),
            (OrderStatus::Pending, OrderAction::Decline) => Ok(OrderStatus::Declined),
            (OrderStatus::Accepted, OrderAction::MarkReceived) => Ok(OrderStatus::Completed),
            (_, OrderAction::Accept | OrderAction::Decline) => {
                Err(MarketError::conflict("Order already processed."))
            }
            (_, OrderAction::MarkReceived) => Err(MarketError::conflict(
                "Only accepted orders can be marked as received.",
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Declined => "declined",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an employee decision, as recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Declined,
}

impl Decision {
    /// The decision recorded when an order reaches `status`, if any.
    pub fn for_status(status: OrderStatus) -> Option<Decision> {
        match status {
            OrderStatus::Accepted => Some(Decision::Accepted),
            OrderStatus::Declined => Some(Decision::Declined),
            OrderStatus::Pending | OrderStatus::Completed => None,
        }
    }
}
