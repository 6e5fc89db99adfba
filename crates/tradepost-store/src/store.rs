//! Marketplace store implementations.
//!
//! Every mutating operation is one unit of work: it runs against a staged
//! copy of the tables while holding the single writer lock, and the copy
//! replaces the live tables only if the whole unit succeeded. A failure at
//! any step therefore leaves no partial state behind, and concurrent units
//! against the same item or order are serialised.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use tradepost_core::{
    Item, ItemDraft, MarketError, Notification, Order, OrderAction, OrderRequest, OrderStatus,
    Result, Role, Transaction, User, UserDraft,
};
use uuid::Uuid;

use crate::snapshot::MarketSnapshot;

/// Selects catalog items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFilter {
    /// Only items owned by this employee.
    pub owner: Option<Uuid>,

    /// Only items with stock on hand.
    pub in_stock: bool,
}

impl ItemFilter {
    pub fn owned_by(owner: Uuid) -> Self {
        Self {
            owner: Some(owner),
            in_stock: false,
        }
    }

    pub fn for_sale() -> Self {
        Self {
            owner: None,
            in_stock: true,
        }
    }

    fn matches(&self, item: &Item) -> bool {
        self.owner.map_or(true, |owner| item.employee_id == Some(owner))
            && (!self.in_stock || item.is_for_sale())
    }
}

/// Selects orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    pub fn employee(employee_id: Uuid) -> Self {
        Self {
            employee_id: Some(employee_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn matches(&self, order: &Order) -> bool {
        self.customer_id.map_or(true, |id| order.customer_id == id)
            && self.employee_id.map_or(true, |id| order.employee_id == id)
            && self.status.map_or(true, |status| order.status == status)
    }
}

/// Selects ledger entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerFilter {
    pub order_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
}

impl LedgerFilter {
    fn matches(&self, tx: &Transaction) -> bool {
        self.order_id.map_or(true, |id| tx.order_id == id)
            && self.employee_id.map_or(true, |id| tx.employee_id == id)
    }
}

/// An order joined with the records it refers to. Fields are `None` when
/// the referenced record no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub item_name: Option<String>,
    pub item_price: Option<Decimal>,
    pub customer_name: Option<String>,
    pub employee_name: Option<String>,
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub order: Order,
    /// The item after its stock was decremented.
    pub item: Item,
    /// The inbox entry the order produced for its employee.
    pub notification: Notification,
}

/// Result of a successful status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub order: Order,
    /// Ledger entry appended by the transition, if it was a decision.
    pub transaction: Option<Transaction>,
}

/// Trait for marketplace stores.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Register a user. Emails are unique.
    async fn register_user(&self, draft: UserDraft) -> Result<User>;

    /// Get a user by ID.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Add an item owned by `owner`.
    async fn create_item(&self, owner: Uuid, draft: ItemDraft) -> Result<Item>;

    /// Get an item by ID.
    async fn get_item(&self, id: Uuid) -> Result<Option<Item>>;

    /// Replace an item's editable fields. Only its owner may do this.
    async fn update_item(&self, id: Uuid, actor: Uuid, draft: ItemDraft) -> Result<Item>;

    /// Remove an item. Only its owner may do this.
    async fn delete_item(&self, id: Uuid, actor: Uuid) -> Result<Item>;

    /// Hand an item to another employee, or release it with `None`.
    async fn reassign_item(&self, id: Uuid, actor: Uuid, new_owner: Option<Uuid>) -> Result<Item>;

    /// List items in creation order.
    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<Item>>;

    /// Reserve stock and create a pending order as one unit.
    async fn place_order(&self, customer_id: Uuid, request: OrderRequest) -> Result<Placement>;

    /// Compare-and-set an order's status on behalf of `actor`, appending the
    /// ledger entry a decision produces in the same unit.
    async fn transition_order(
        &self,
        id: Uuid,
        action: OrderAction,
        actor: Uuid,
    ) -> Result<TransitionOutcome>;

    /// Get an order by ID.
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;

    /// List orders, newest first.
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderDetails>>;

    /// The inbox of `employee_id`: one entry per pending order, newest first.
    async fn notifications(&self, employee_id: Uuid) -> Result<Vec<Notification>>;

    /// List ledger entries, newest first.
    async fn transactions(&self, filter: LedgerFilter) -> Result<Vec<Transaction>>;

    /// Create a snapshot of the current state.
    async fn snapshot(&self) -> Result<MarketSnapshot>;

    /// Number of committed units of work.
    async fn version(&self) -> u64;
}

/// The live tables. Cloned to stage a unit of work.
#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    items: HashMap<Uuid, Item>,
    orders: HashMap<Uuid, Order>,
    /// Item IDs in creation order.
    item_seq: Vec<Uuid>,
    /// Order IDs in creation order.
    order_seq: Vec<Uuid>,
    /// Append-only ledger.
    transactions: Vec<Transaction>,
    /// Orders that already have a ledger entry.
    decided: HashSet<Uuid>,
    version: u64,
}

impl Tables {
    fn employee(&self, id: Uuid) -> Option<&User> {
        self.users.get(&id).filter(|u| u.role == Role::Employee)
    }

    fn item_mut(&mut self, id: Uuid) -> Result<&mut Item> {
        self.items
            .get_mut(&id)
            .ok_or_else(|| MarketError::not_found("Item", id))
    }

    fn append_transaction(&mut self, tx: Transaction) -> Result<()> {
        if !self.decided.insert(tx.order_id) {
            return Err(MarketError::Internal(format!(
                "order {} already has a ledger entry",
                tx.order_id
            )));
        }
        self.transactions.push(tx);
        Ok(())
    }

    fn notification(&self, order: &Order) -> Option<Notification> {
        Notification::for_order(
            order,
            self.items.get(&order.item_id),
            self.users.get(&order.customer_id),
        )
    }

    fn details(&self, order: &Order) -> OrderDetails {
        let item = self.items.get(&order.item_id);
        OrderDetails {
            order: order.clone(),
            item_name: item.map(|i| i.name.clone()),
            item_price: item.map(|i| i.price),
            customer_name: self.users.get(&order.customer_id).map(|u| u.name.clone()),
            employee_name: self.users.get(&order.employee_id).map(|u| u.name.clone()),
        }
    }

    fn orders_newest_first(&self) -> impl Iterator<Item = &Order> {
        self.order_seq
            .iter()
            .rev()
            .filter_map(|id| self.orders.get(id))
    }
}

/// In-memory implementation of MarketStore.
#[derive(Clone, Default)]
pub struct InMemoryMarketStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryMarketStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot after checking its ledger.
    pub fn from_snapshot(snapshot: MarketSnapshot) -> Result<Self> {
        snapshot.verify()?;

        let mut tables = Tables {
            version: snapshot.version,
            ..Default::default()
        };

        let mut items = snapshot.items;
        items.sort_by_key(|i| i.created_at);
        for item in items {
            tables.item_seq.push(item.id);
            tables.items.insert(item.id, item);
        }

        let mut orders = snapshot.orders;
        orders.sort_by_key(|o| o.created_at);
        for order in orders {
            tables.order_seq.push(order.id);
            tables.orders.insert(order.id, order);
        }

        for user in snapshot.users {
            tables.users.insert(user.id, user);
        }

        for tx in snapshot.transactions {
            tables.append_transaction(tx)?;
        }

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
        })
    }

    /// Run `unit` against a staged copy of the tables and commit the copy
    /// only if it succeeds.
    async fn unit_of_work<T>(
        &self,
        name: &'static str,
        unit: impl FnOnce(&mut Tables) -> Result<T>,
    ) -> Result<T> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();

        match unit(&mut staged) {
            Ok(out) => {
                staged.version += 1;
                debug!(unit = name, version = staged.version, "Committed");
                *tables = staged;
                Ok(out)
            }
            Err(e) => {
                debug!(unit = name, error = %e, "Rolled back");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
    async fn register_user(&self, draft: UserDraft) -> Result<User> {
        let draft = draft.validate()?;
        self.unit_of_work("register_user", move |t| {
            if t.users.values().any(|u| u.email == draft.email) {
                return Err(MarketError::conflict("The email has already been taken."));
            }
            let user = draft.into_user();
            t.users.insert(user.id, user.clone());
            Ok(user)
        })
        .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn create_item(&self, owner: Uuid, draft: ItemDraft) -> Result<Item> {
        let draft = draft.validate()?;
        self.unit_of_work("create_item", move |t| {
            if t.employee(owner).is_none() {
                return Err(MarketError::forbidden("Only an employee may list items."));
            }
            let item = Item::new(owner, draft);
            t.item_seq.push(item.id);
            t.items.insert(item.id, item.clone());
            Ok(item)
        })
        .await
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<Item>> {
        let tables = self.tables.read().await;
        Ok(tables.items.get(&id).cloned())
    }

    async fn update_item(&self, id: Uuid, actor: Uuid, draft: ItemDraft) -> Result<Item> {
        let draft = draft.validate()?;
        self.unit_of_work("update_item", move |t| {
            let item = t.item_mut(id)?;
            item.ensure_owned_by(actor)?;
            item.apply_draft(draft);
            Ok(item.clone())
        })
        .await
    }

    async fn delete_item(&self, id: Uuid, actor: Uuid) -> Result<Item> {
        self.unit_of_work("delete_item", move |t| {
            t.item_mut(id)?.ensure_owned_by(actor)?;
            t.item_seq.retain(|seq_id| *seq_id != id);
            t.items
                .remove(&id)
                .ok_or_else(|| MarketError::not_found("Item", id))
        })
        .await
    }

    async fn reassign_item(&self, id: Uuid, actor: Uuid, new_owner: Option<Uuid>) -> Result<Item> {
        self.unit_of_work("reassign_item", move |t| {
            if let Some(owner) = new_owner {
                if t.employee(owner).is_none() {
                    return Err(MarketError::validation(
                        "employee_id",
                        "must be a registered employee",
                    ));
                }
            }
            let item = t.item_mut(id)?;
            item.ensure_owned_by(actor)?;
            item.employee_id = new_owner;
            item.updated_at = Utc::now();
            Ok(item.clone())
        })
        .await
    }

    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<Item>> {
        let tables = self.tables.read().await;
        Ok(tables
            .item_seq
            .iter()
            .filter_map(|id| tables.items.get(id))
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    async fn place_order(&self, customer_id: Uuid, request: OrderRequest) -> Result<Placement> {
        let request = request.validate()?;
        self.unit_of_work("place_order", move |t| {
            let item = t
                .items
                .get(&request.item_id)
                .ok_or_else(|| MarketError::not_found("Item", request.item_id))?;

            let employee_id = item.assigned_employee()?;
            if t.employee(employee_id).is_none() {
                warn!(item_id = %item.id, %employee_id, "Item owner is not a registered employee");
                return Err(MarketError::invalid_state(
                    "Item does not have an associated employee.",
                ));
            }

            let item = t.item_mut(request.item_id)?;
            item.reserve(request.quantity)?;
            let item = item.clone();

            let order = Order::new(customer_id, employee_id, item.id, request.quantity);
            t.order_seq.push(order.id);
            t.orders.insert(order.id, order.clone());

            let notification = t.notification(&order).ok_or_else(|| {
                MarketError::Internal(format!("new order {} is not pending", order.id))
            })?;

            Ok(Placement {
                order,
                item,
                notification,
            })
        })
        .await
    }

    async fn transition_order(
        &self,
        id: Uuid,
        action: OrderAction,
        actor: Uuid,
    ) -> Result<TransitionOutcome> {
        self.unit_of_work("transition_order", move |t| {
            let order = t
                .orders
                .get_mut(&id)
                .ok_or_else(|| MarketError::not_found("Order", id))?;

            let transaction = order.apply(action, actor)?;
            let order = order.clone();

            if let Some(tx) = &transaction {
                t.append_transaction(tx.clone())?;
            }

            Ok(TransitionOutcome { order, transaction })
        })
        .await
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).cloned())
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderDetails>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders_newest_first()
            .filter(|order| filter.matches(order))
            .map(|order| tables.details(order))
            .collect())
    }

    async fn notifications(&self, employee_id: Uuid) -> Result<Vec<Notification>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders_newest_first()
            .filter(|order| order.employee_id == employee_id)
            .filter_map(|order| tables.notification(order))
            .collect())
    }

    async fn transactions(&self, filter: LedgerFilter) -> Result<Vec<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .iter()
            .rev()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect())
    }

    async fn snapshot(&self) -> Result<MarketSnapshot> {
        let tables = self.tables.read().await;

        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);

        Ok(MarketSnapshot {
            version: tables.version,
            taken_at: Some(Utc::now()),
            users,
            items: tables
                .item_seq
                .iter()
                .filter_map(|id| tables.items.get(id).cloned())
                .collect(),
            orders: tables
                .order_seq
                .iter()
                .filter_map(|id| tables.orders.get(id).cloned())
                .collect(),
            transactions: tables.transactions.clone(),
        })
    }

    async fn version(&self) -> u64 {
        self.tables.read().await.version
    }
}
