//! Employee inbox endpoint.

use axum::{extract::State, Json};
use tradepost_core::Notification;

use crate::error::ApiResult;
use crate::identity::Caller;
use crate::state::AppState;

/// The caller's pending notifications, newest first.
pub async fn list_pending_notifications(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(state.engine.list_pending_notifications(&caller).await?))
}
