//! Order endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradepost_core::{notification::UNKNOWN, Order, OrderRequest, OrderStatus};
use tradepost_store::{OrderDetails, TransitionOutcome};
use uuid::Uuid;

use crate::error::{ApiJson, ApiPath, ApiResult};
use crate::identity::Caller;
use crate::state::AppState;

/// Response after placing an order.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceOrderResponse {
    pub message: String,
    pub order: Order,
}

/// Response after an order changed status.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderUpdateResponse {
    pub message: String,
    pub order: Order,
}

/// Item as shown on an order row. `price` is null once the item is gone.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub price: Option<Decimal>,
}

/// A row of the customer's order history.
#[derive(Debug, Serialize, Deserialize)]
pub struct MyOrderRow {
    pub id: Uuid,
    pub quantity: u32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub item: OrderItem,
    pub employee_name: String,
}

impl From<OrderDetails> for MyOrderRow {
    fn from(details: OrderDetails) -> Self {
        Self {
            id: details.order.id,
            quantity: details.order.quantity,
            status: details.order.status,
            created_at: details.order.created_at,
            item: OrderItem {
                name: details.item_name.unwrap_or_else(|| UNKNOWN.to_string()),
                price: details.item_price,
            },
            employee_name: details.employee_name.unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// A row of the employee's accepted orders.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedOrderRow {
    pub id: Uuid,
    pub item_name: String,
    pub quantity: u32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
}

impl From<OrderDetails> for AcceptedOrderRow {
    fn from(details: OrderDetails) -> Self {
        Self {
            id: details.order.id,
            item_name: details.item_name.unwrap_or_else(|| UNKNOWN.to_string()),
            quantity: details.order.quantity,
            status: details.order.status,
            created_at: details.order.created_at,
            customer_name: details.customer_name.unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

fn updated(message: &str, outcome: TransitionOutcome) -> Json<OrderUpdateResponse> {
    Json(OrderUpdateResponse {
        message: message.to_string(),
        order: outcome.order,
    })
}

/// Place an order.
pub async fn place_order(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(req): ApiJson<OrderRequest>,
) -> ApiResult<(StatusCode, Json<PlaceOrderResponse>)> {
    let placement = state.engine.place_order(&caller, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            message: "Order placed and employee notified!".to_string(),
            order: placement.order,
        }),
    ))
}

/// List the caller's orders, newest first.
pub async fn list_my_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<MyOrderRow>>> {
    let orders = state.engine.list_my_orders(&caller).await?;
    Ok(Json(orders.into_iter().map(MyOrderRow::from).collect()))
}

/// List accepted orders assigned to the caller, newest first.
pub async fn list_accepted_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<AcceptedOrderRow>>> {
    let orders = state.engine.list_accepted_orders(&caller).await?;
    Ok(Json(orders.into_iter().map(AcceptedOrderRow::from).collect()))
}

/// Get one order.
pub async fn get_order(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.engine.get_order(&caller, id).await?))
}

/// Accept a pending order.
pub async fn accept_order(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<OrderUpdateResponse>> {
    let outcome = state.engine.accept_order(&caller, id).await?;
    Ok(updated("Order accepted.", outcome))
}

/// Decline a pending order.
pub async fn decline_order(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<OrderUpdateResponse>> {
    let outcome = state.engine.decline_order(&caller, id).await?;
    Ok(updated("Order declined.", outcome))
}

/// Mark an accepted order as received.
pub async fn mark_received(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<OrderUpdateResponse>> {
    let outcome = state.engine.mark_received(&caller, id).await?;
    Ok(updated("Order marked as received.", outcome))
}
