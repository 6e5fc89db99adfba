//! Live marketplace events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notification::Notification;
use crate::types::{OrderStatus, Role};

/// Something that happened to an order, published after it was committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A customer placed an order; the employee has a new inbox entry.
    NewOrder { notification: Notification },
    /// The employee accepted or declined an order.
    OrderDecided {
        order_id: Uuid,
        employee_id: Uuid,
        customer_id: Uuid,
        status: OrderStatus,
    },
    /// The customer marked an accepted order as received.
    OrderCompleted {
        order_id: Uuid,
        employee_id: Uuid,
        customer_id: Uuid,
    },
}

/// Discriminant of a [`MarketEvent`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NewOrder,
    OrderDecided,
    OrderCompleted,
}

impl MarketEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MarketEvent::NewOrder { .. } => EventKind::NewOrder,
            MarketEvent::OrderDecided { .. } => EventKind::OrderDecided,
            MarketEvent::OrderCompleted { .. } => EventKind::OrderCompleted,
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            MarketEvent::NewOrder { notification } => notification.order_id,
            MarketEvent::OrderDecided { order_id, .. }
            | MarketEvent::OrderCompleted { order_id, .. } => *order_id,
        }
    }

    pub fn employee_id(&self) -> Uuid {
        match self {
            MarketEvent::NewOrder { notification } => notification.employee_id,
            MarketEvent::OrderDecided { employee_id, .. }
            | MarketEvent::OrderCompleted { employee_id, .. } => *employee_id,
        }
    }

    pub fn customer_id(&self) -> Uuid {
        match self {
            MarketEvent::NewOrder { notification } => notification.customer_id,
            MarketEvent::OrderDecided { customer_id, .. }
            | MarketEvent::OrderCompleted { customer_id, .. } => *customer_id,
        }
    }

    /// Returns true if `user_id` is a party to the event's order.
    pub fn concerns(&self, user_id: Uuid) -> bool {
        self.employee_id() == user_id || self.customer_id() == user_id
    }
}

/// Frame sent to live subscribers over the notification socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayMessage {
    /// First frame after the socket is accepted.
    Connected {
        user_id: Uuid,
        role: Role,
        /// Inbox size at connect time; zero for customers.
        pending: usize,
    },
    Event { event: MarketEvent },
}
