//! Caller identity extractor.
//!
//! The caller is named by the `x-user-id` header and resolved against the
//! user directory once per request.

use std::ops::Deref;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tradepost_core::{Identity, MarketError};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl Deref for Caller {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(caller.clone());
        }

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

        let Some(user_id) = user_id else {
            tracing::debug!(uri = %parts.uri, "Missing or malformed caller header");
            return Err(ApiError(MarketError::Unauthenticated));
        };

        let caller = Caller(state.engine.identify(user_id).await?);
        parts.extensions.insert(caller.clone());
        Ok(caller)
    }
}
