//! API error responses.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradepost_core::MarketError;

/// Message returned in place of storage and internal failures.
pub const RETRY_MESSAGE: &str = "Something went wrong while saving. Please try again.";

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// A [`MarketError`] on its way to the client.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub MarketError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
            MarketError::Conflict { .. } => StatusCode::CONFLICT,
            MarketError::InvalidState { .. } => StatusCode::BAD_REQUEST,
            MarketError::Forbidden { .. } => StatusCode::FORBIDDEN,
            MarketError::Unauthenticated => StatusCode::UNAUTHORIZED,
            MarketError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            MarketError::Transient { .. }
            | MarketError::Serialization(_)
            | MarketError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_business_rule() {
            self.0.to_string()
        } else {
            tracing::error!(error = %self.0, retryable = self.0.is_retryable(), "Request failed");
            RETRY_MESSAGE.to_string()
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(MarketError::validation("body", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(MarketError::validation("path", rejection.body_text()))
    }
}

/// `Json` whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejections use the API error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
