//! Tradepost client implementation.

use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tradepost_core::{
    Identity, Item, ItemDraft, MarketError, Notification, Order, OrderRequest, OrderStatus,
    Result, Transaction, User, UserDraft,
};
use uuid::Uuid;

use crate::stream::NotificationStream;

/// Header carrying the caller's user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Client for interacting with a Tradepost node.
#[derive(Clone)]
pub struct TradepostClient {
    /// Base URL of the node.
    base_url: String,

    /// HTTP client.
    http_client: reqwest::Client,

    /// User the requests are made as.
    user_id: Option<Uuid>,
}

/// Health of a node.
#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub store_version: u64,
    pub subscribers: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    order: Order,
}

#[derive(Debug, Serialize)]
struct ReassignRequest {
    employee_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct LedgerQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<Uuid>,
}

/// Item as shown on an order row.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub price: Option<Decimal>,
}

/// A row of the caller's order history.
#[derive(Debug, Clone, Deserialize)]
pub struct MyOrder {
    pub id: Uuid,
    pub quantity: u32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub item: OrderItem,
    pub employee_name: String,
}

/// A row of the caller's accepted orders.
#[derive(Debug, Clone, Deserialize)]
pub struct AcceptedOrder {
    pub id: Uuid,
    pub item_name: String,
    pub quantity: u32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
}

/// Rebuild the node's error from a failed response.
pub(crate) fn error_from_status(status: StatusCode, message: String) -> MarketError {
    match status {
        StatusCode::UNAUTHORIZED => MarketError::Unauthenticated,
        StatusCode::FORBIDDEN => MarketError::Forbidden { message },
        StatusCode::CONFLICT => MarketError::Conflict { message },
        StatusCode::BAD_REQUEST => MarketError::InvalidState { message },
        StatusCode::NOT_FOUND => match message
            .strip_suffix(" not found")
            .and_then(|rest| rest.split_once(' '))
        {
            Some((resource_type, id)) => MarketError::not_found(resource_type, id),
            None => MarketError::not_found("Resource", message),
        },
        StatusCode::UNPROCESSABLE_ENTITY => match message
            .strip_prefix("Invalid ")
            .and_then(|rest| rest.split_once(": "))
        {
            Some((field, detail)) => MarketError::validation(field, detail),
            None => MarketError::validation("request", message),
        },
        s if s.is_server_error() => MarketError::transient(message),
        _ => MarketError::Internal(format!("unexpected status {}: {}", status, message)),
    }
}

fn connection_error(e: reqwest::Error) -> MarketError {
    MarketError::transient(format!("connection failed: {}", e))
}

impl TradepostClient {
    /// Connect to a Tradepost node.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Self::new(url);
        client.health().await?;
        Ok(client)
    }

    /// Create a client without contacting the node.
    pub fn new(url: &str) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
            user_id: None,
        }
    }

    /// A client making requests as `user_id`.
    pub fn as_user(&self, user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..self.clone()
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn ws_url(&self, path: &str) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!("{}{}", base, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match self.user_id {
            Some(user_id) => request.header(USER_ID_HEADER, user_id.to_string()),
            None => request,
        };

        let response = request.send().await.map_err(connection_error)?;
        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => status.to_string(),
            };
            tracing::debug!(%status, %message, "Request rejected");
            return Err(error_from_status(status, message));
        }

        response
            .json()
            .await
            .map_err(|e| MarketError::Serialization(e.to_string()))
    }

    /// Check the node's health.
    pub async fn health(&self) -> Result<HealthStatus> {
        self.send(self.http_client.get(self.url("/health"))).await
    }

    /// Register a user.
    pub async fn register_user(&self, draft: &UserDraft) -> Result<User> {
        self.send(self.http_client.post(self.url("/api/v1/users")).json(draft))
            .await
    }

    /// The identity the node resolves this client's user to.
    pub async fn me(&self) -> Result<Identity> {
        self.send(self.http_client.get(self.url("/api/v1/me"))).await
    }

    // Catalog

    pub async fn create_item(&self, draft: &ItemDraft) -> Result<Item> {
        self.send(self.http_client.post(self.url("/api/v1/items")).json(draft))
            .await
    }

    pub async fn update_item(&self, id: Uuid, draft: &ItemDraft) -> Result<Item> {
        let url = self.url(&format!("/api/v1/items/{}", id));
        self.send(self.http_client.put(url).json(draft)).await
    }

    pub async fn delete_item(&self, id: Uuid) -> Result<()> {
        let url = self.url(&format!("/api/v1/items/{}", id));
        let _: serde_json::Value = self.send(self.http_client.delete(url)).await?;
        Ok(())
    }

    /// Hand an item to another employee, or release it with `None`.
    pub async fn reassign_item(&self, id: Uuid, employee_id: Option<Uuid>) -> Result<Item> {
        let url = self.url(&format!("/api/v1/items/{}/reassign", id));
        self.send(self.http_client.post(url).json(&ReassignRequest { employee_id }))
            .await
    }

    pub async fn my_items(&self) -> Result<Vec<Item>> {
        self.send(self.http_client.get(self.url("/api/v1/items"))).await
    }

    pub async fn items_for_sale(&self) -> Result<Vec<Item>> {
        self.send(self.http_client.get(self.url("/api/v1/items/for-sale")))
            .await
    }

    // Orders

    /// Place an order for `quantity` units of an item.
    pub async fn place_order(&self, item_id: Uuid, quantity: u32) -> Result<Order> {
        let request = OrderRequest { item_id, quantity };
        let response: OrderResponse = self
            .send(self.http_client.post(self.url("/api/v1/orders")).json(&request))
            .await?;
        Ok(response.order)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order> {
        let url = self.url(&format!("/api/v1/orders/{}", id));
        self.send(self.http_client.get(url)).await
    }

    pub async fn my_orders(&self) -> Result<Vec<MyOrder>> {
        self.send(self.http_client.get(self.url("/api/v1/orders/mine")))
            .await
    }

    pub async fn accepted_orders(&self) -> Result<Vec<AcceptedOrder>> {
        self.send(self.http_client.get(self.url("/api/v1/orders/accepted")))
            .await
    }

    pub async fn accept_order(&self, id: Uuid) -> Result<Order> {
        self.order_action(id, "accept").await
    }

    pub async fn decline_order(&self, id: Uuid) -> Result<Order> {
        self.order_action(id, "decline").await
    }

    pub async fn mark_received(&self, id: Uuid) -> Result<Order> {
        self.order_action(id, "received").await
    }

    async fn order_action(&self, id: Uuid, action: &str) -> Result<Order> {
        let url = self.url(&format!("/api/v1/orders/{}/{}", id, action));
        let response: OrderResponse = self.send(self.http_client.post(url)).await?;
        Ok(response.order)
    }

    // Inbox and ledger

    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        self.send(self.http_client.get(self.url("/api/v1/notifications")))
            .await
    }

    pub async fn transactions(&self, order_id: Option<Uuid>) -> Result<Vec<Transaction>> {
        let request = self
            .http_client
            .get(self.url("/api/v1/transactions"))
            .query(&LedgerQuery { order_id });
        self.send(request).await
    }

    /// Open the live notification stream for this client's user.
    pub async fn subscribe(&self) -> Result<NotificationStream> {
        let user_id = self.user_id.ok_or(MarketError::Unauthenticated)?;
        NotificationStream::connect(&self.ws_url("/ws/notifications"), user_id).await
    }
}
