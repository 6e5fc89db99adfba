//! User directory endpoints.

use axum::{extract::State, http::StatusCode, Json};
use tradepost_core::{Identity, User, UserDraft};

use crate::error::{ApiJson, ApiResult};
use crate::identity::Caller;
use crate::state::AppState;

/// Register a user.
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<UserDraft>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.engine.register_user(draft).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// The caller's identity.
pub async fn me(Caller(identity): Caller) -> Json<Identity> {
    Json(identity)
}
