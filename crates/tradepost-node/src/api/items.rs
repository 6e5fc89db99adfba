//! Item catalog endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tradepost_core::{Item, ItemDraft};
use uuid::Uuid;

use super::MessageResponse;
use crate::error::{ApiJson, ApiPath, ApiResult};
use crate::identity::Caller;
use crate::state::AppState;

/// Request to hand an item to another employee. A missing or null
/// `employee_id` releases the item.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReassignRequest {
    #[serde(default)]
    pub employee_id: Option<Uuid>,
}

/// List the caller's items.
pub async fn list_my_items(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<Item>>> {
    Ok(Json(state.engine.list_my_items(&caller).await?))
}

/// List every item with stock on hand.
pub async fn list_items_for_sale(
    State(state): State<AppState>,
    _caller: Caller,
) -> ApiResult<Json<Vec<Item>>> {
    Ok(Json(state.engine.list_items_for_sale().await?))
}

/// Create an item owned by the caller.
pub async fn create_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(draft): ApiJson<ItemDraft>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let item = state.engine.create_item(&caller, draft).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Update one of the caller's items.
pub async fn update_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(draft): ApiJson<ItemDraft>,
) -> ApiResult<Json<Item>> {
    Ok(Json(state.engine.update_item(&caller, id, draft).await?))
}

/// Delete one of the caller's items.
pub async fn delete_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.engine.delete_item(&caller, id).await?;
    Ok(Json(MessageResponse::new("Item deleted successfully")))
}

/// Hand one of the caller's items to another employee.
pub async fn reassign_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReassignRequest>,
) -> ApiResult<Json<Item>> {
    Ok(Json(state.engine.reassign_item(&caller, id, req.employee_id).await?))
}
