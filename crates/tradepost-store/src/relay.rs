//! Notification relay.
//!
//! The inbox itself is a view over pending orders (see
//! [`MarketStore::notifications`](crate::MarketStore::notifications)). The
//! relay adds live delivery: committed [`MarketEvent`]s are broadcast to
//! every subscriber, and each subscriber filters for what concerns it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::warn;
use tradepost_core::{EventKind, MarketEvent};
use uuid::Uuid;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Filter for relay subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayFilter {
    /// Only events for orders assigned to this employee.
    pub employee_id: Option<Uuid>,

    /// Only events for orders placed by this customer.
    pub customer_id: Option<Uuid>,

    /// Only these kinds of events.
    pub kinds: Option<HashSet<EventKind>>,
}

impl RelayFilter {
    /// Events for orders assigned to `employee_id`.
    pub fn employee(employee_id: Uuid) -> Self {
        Self {
            employee_id: Some(employee_id),
            ..Default::default()
        }
    }

    /// Events for orders placed by `customer_id`.
    pub fn customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    /// Restrict to the given kinds.
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Check if an event matches this filter.
    pub fn matches(&self, event: &MarketEvent) -> bool {
        if let Some(employee_id) = self.employee_id {
            if event.employee_id() != employee_id {
                return false;
            }
        }

        if let Some(customer_id) = self.customer_id {
            if event.customer_id() != customer_id {
                return false;
            }
        }

        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind()) {
                return false;
            }
        }

        true
    }
}

/// A live subscription to marketplace events.
pub struct RelaySubscription {
    /// Unique ID for this subscription.
    pub id: Uuid,

    /// Filter for this subscription.
    pub filter: RelayFilter,

    receiver: broadcast::Receiver<MarketEvent>,
}

impl RelaySubscription {
    /// Wait for the next matching event. Returns `None` once the relay is
    /// gone. Events missed by a slow subscriber are skipped.
    pub async fn recv(&mut self) -> Option<MarketEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(subscription = %self.id, skipped, "Relay subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Fan-out of committed marketplace events.
#[derive(Clone)]
pub struct NotificationRelay {
    /// Sender for broadcasting events.
    sender: broadcast::Sender<MarketEvent>,

    /// Active subscriptions.
    subscriptions: Arc<RwLock<HashMap<Uuid, RelayFilter>>>,
}

impl NotificationRelay {
    /// Create a relay buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to events with a filter.
    pub async fn subscribe(&self, filter: RelayFilter) -> RelaySubscription {
        let id = Uuid::new_v4();
        let receiver = self.sender.subscribe();

        let mut subs = self.subscriptions.write().await;
        subs.insert(id, filter.clone());

        RelaySubscription { id, filter, receiver }
    }

    /// Forget a subscription.
    pub async fn unsubscribe(&self, id: Uuid) {
        let mut subs = self.subscriptions.write().await;
        subs.remove(&id);
    }

    /// Publish a committed event. Returns how many receivers got it.
    pub fn publish(&self, event: MarketEvent) -> usize {
        // no receivers is fine; the inbox view is authoritative
        self.sender.send(event).unwrap_or(0)
    }

    /// Get the number of active subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl Default for NotificationRelay {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradepost_core::OrderStatus;

    fn decided(employee_id: Uuid, customer_id: Uuid) -> MarketEvent {
        MarketEvent::OrderDecided {
            order_id: Uuid::new_v4(),
            employee_id,
            customer_id,
            status: OrderStatus::Declined,
        }
    }

    #[test]
    fn test_filter_by_party() {
        let employee = Uuid::new_v4();
        let customer = Uuid::new_v4();
        let event = decided(employee, customer);

        assert!(RelayFilter::employee(employee).matches(&event));
        assert!(RelayFilter::customer(customer).matches(&event));
        assert!(!RelayFilter::employee(customer).matches(&event));
        assert!(RelayFilter::default().matches(&event));
    }

    #[test]
    fn test_filter_by_kind() {
        let event = decided(Uuid::new_v4(), Uuid::new_v4());
        assert!(!RelayFilter::default().kinds([EventKind::NewOrder]).matches(&event));
        assert!(RelayFilter::default()
            .kinds([EventKind::NewOrder, EventKind::OrderDecided])
            .matches(&event));
    }

    #[tokio::test]
    async fn test_subscriber_only_sees_matching_events() {
        let relay = NotificationRelay::new(16);
        let employee = Uuid::new_v4();
        let mut sub = relay.subscribe(RelayFilter::employee(employee)).await;
        assert_eq!(relay.subscription_count().await, 1);

        relay.publish(decided(Uuid::new_v4(), Uuid::new_v4()));
        let mine = decided(employee, Uuid::new_v4());
        relay.publish(mine.clone());

        assert_eq!(sub.recv().await, Some(mine));

        relay.unsubscribe(sub.id).await;
        assert_eq!(relay.subscription_count().await, 0);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let relay = NotificationRelay::default();
        assert_eq!(relay.publish(decided(Uuid::new_v4(), Uuid::new_v4())), 0);
    }
}
