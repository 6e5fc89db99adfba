//! Order lifecycle engine.
//!
//! Every operation takes the caller's [`Identity`], checks the role rules,
//! runs one unit of work against the store and, only once that committed,
//! publishes the matching [`MarketEvent`] on the relay.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use tradepost_core::{
    Identity, Item, ItemDraft, MarketError, MarketEvent, Notification, Order, OrderAction,
    OrderRequest, OrderStatus, Result, Role, Transaction, User, UserDraft,
};
use tradepost_store::{
    ItemFilter, LedgerFilter, MarketStore, NotificationRelay, OrderDetails, OrderFilter,
    Placement, RelayFilter, RelaySubscription, TransitionOutcome,
};
use uuid::Uuid;

/// The order lifecycle engine.
pub struct OrderEngine {
    store: Arc<dyn MarketStore>,
    relay: NotificationRelay,
}

impl OrderEngine {
    pub fn new(store: Arc<dyn MarketStore>, relay: NotificationRelay) -> Self {
        Self { store, relay }
    }

    pub fn store(&self) -> &Arc<dyn MarketStore> {
        &self.store
    }

    pub fn relay(&self) -> &NotificationRelay {
        &self.relay
    }

    /// Resolve a user ID into the caller identity for one request.
    pub async fn identify(&self, user_id: Uuid) -> Result<Identity> {
        self.store
            .get_user(user_id)
            .await?
            .map(|user| Identity::from(&user))
            .ok_or(MarketError::Unauthenticated)
    }

    #[instrument(skip(self, draft), fields(role = %draft.role))]
    pub async fn register_user(&self, draft: UserDraft) -> Result<User> {
        let user = self.store.register_user(draft).await?;
        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    // Orders

    /// Reserve stock and create a pending order for the calling customer.
    #[instrument(skip(self, identity), fields(customer_id = %identity.user_id, item_id = %request.item_id))]
    pub async fn place_order(&self, identity: &Identity, request: OrderRequest) -> Result<Placement> {
        let request = request.validate()?;
        identity.require(Role::Customer)?;

        let placement = self.store.place_order(identity.user_id, request).await?;
        info!(
            order_id = %placement.order.id,
            employee_id = %placement.order.employee_id,
            quantity = placement.order.quantity,
            stock_left = placement.item.quantity,
            "Order placed"
        );

        self.relay.publish(MarketEvent::NewOrder {
            notification: placement.notification.clone(),
        });
        Ok(placement)
    }

    #[instrument(skip(self, identity), fields(employee_id = %identity.user_id))]
    pub async fn accept_order(&self, identity: &Identity, order_id: Uuid) -> Result<TransitionOutcome> {
        self.decide(identity, order_id, OrderAction::Accept).await
    }

    #[instrument(skip(self, identity), fields(employee_id = %identity.user_id))]
    pub async fn decline_order(&self, identity: &Identity, order_id: Uuid) -> Result<TransitionOutcome> {
        self.decide(identity, order_id, OrderAction::Decline).await
    }

    async fn decide(
        &self,
        identity: &Identity,
        order_id: Uuid,
        action: OrderAction,
    ) -> Result<TransitionOutcome> {
        identity.require(Role::Employee)?;

        let outcome = self
            .store
            .transition_order(order_id, action, identity.user_id)
            .await?;
        if outcome.transaction.is_none() {
            warn!(%order_id, ?action, "Decision produced no ledger entry");
        }
        info!(%order_id, status = %outcome.order.status, "Order decided");

        self.relay.publish(MarketEvent::OrderDecided {
            order_id,
            employee_id: outcome.order.employee_id,
            customer_id: outcome.order.customer_id,
            status: outcome.order.status,
        });
        Ok(outcome)
    }

    #[instrument(skip(self, identity), fields(customer_id = %identity.user_id))]
    pub async fn mark_received(&self, identity: &Identity, order_id: Uuid) -> Result<TransitionOutcome> {
        let outcome = self
            .store
            .transition_order(order_id, OrderAction::MarkReceived, identity.user_id)
            .await?;
        info!(%order_id, "Order completed");

        self.relay.publish(MarketEvent::OrderCompleted {
            order_id,
            employee_id: outcome.order.employee_id,
            customer_id: outcome.order.customer_id,
        });
        Ok(outcome)
    }

    /// An order, if the caller is its customer or its employee.
    pub async fn get_order(&self, identity: &Identity, order_id: Uuid) -> Result<Order> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| MarketError::not_found("Order", order_id))?;

        if !order.is_visible_to(identity.user_id) {
            return Err(MarketError::forbidden("Unauthorized"));
        }
        Ok(order)
    }

    /// Orders placed by the caller, newest first.
    pub async fn list_my_orders(&self, identity: &Identity) -> Result<Vec<OrderDetails>> {
        self.store
            .list_orders(OrderFilter::customer(identity.user_id))
            .await
    }

    /// Accepted orders assigned to the calling employee, newest first.
    pub async fn list_accepted_orders(&self, identity: &Identity) -> Result<Vec<OrderDetails>> {
        identity.require(Role::Employee)?;
        self.store
            .list_orders(OrderFilter::employee(identity.user_id).with_status(OrderStatus::Accepted))
            .await
    }

    /// The calling employee's inbox.
    pub async fn list_pending_notifications(&self, identity: &Identity) -> Result<Vec<Notification>> {
        identity.require(Role::Employee)?;
        self.store.notifications(identity.user_id).await
    }

    /// Ledger entries for orders decided by the calling employee.
    pub async fn list_transactions(
        &self,
        identity: &Identity,
        order_id: Option<Uuid>,
    ) -> Result<Vec<Transaction>> {
        identity.require(Role::Employee)?;
        self.store
            .transactions(LedgerFilter {
                order_id,
                employee_id: Some(identity.user_id),
            })
            .await
    }

    // Catalog

    #[instrument(skip(self, identity, draft), fields(employee_id = %identity.user_id))]
    pub async fn create_item(&self, identity: &Identity, draft: ItemDraft) -> Result<Item> {
        identity.require(Role::Employee)?;
        let item = self.store.create_item(identity.user_id, draft).await?;
        info!(item_id = %item.id, quantity = item.quantity, "Item created");
        Ok(item)
    }

    #[instrument(skip(self, identity, draft), fields(employee_id = %identity.user_id))]
    pub async fn update_item(&self, identity: &Identity, item_id: Uuid, draft: ItemDraft) -> Result<Item> {
        identity.require(Role::Employee)?;
        self.store.update_item(item_id, identity.user_id, draft).await
    }

    #[instrument(skip(self, identity), fields(employee_id = %identity.user_id))]
    pub async fn delete_item(&self, identity: &Identity, item_id: Uuid) -> Result<Item> {
        identity.require(Role::Employee)?;
        let item = self.store.delete_item(item_id, identity.user_id).await?;
        info!(%item_id, "Item deleted");
        Ok(item)
    }

    #[instrument(skip(self, identity), fields(employee_id = %identity.user_id))]
    pub async fn reassign_item(
        &self,
        identity: &Identity,
        item_id: Uuid,
        new_owner: Option<Uuid>,
    ) -> Result<Item> {
        identity.require(Role::Employee)?;
        let item = self
            .store
            .reassign_item(item_id, identity.user_id, new_owner)
            .await?;
        info!(%item_id, new_owner = ?item.employee_id, "Item reassigned");
        Ok(item)
    }

    pub async fn list_my_items(&self, identity: &Identity) -> Result<Vec<Item>> {
        identity.require(Role::Employee)?;
        self.store.list_items(ItemFilter::owned_by(identity.user_id)).await
    }

    pub async fn list_items_for_sale(&self) -> Result<Vec<Item>> {
        self.store.list_items(ItemFilter::for_sale()).await
    }

    /// Live events concerning the caller.
    pub async fn subscribe(&self, identity: &Identity) -> RelaySubscription {
        let filter = match identity.role {
            Role::Employee => RelayFilter::employee(identity.user_id),
            Role::Customer => RelayFilter::customer(identity.user_id),
        };
        self.relay.subscribe(filter).await
    }
}
