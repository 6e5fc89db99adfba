//! Transaction ledger endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tradepost_core::Transaction;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::identity::Caller;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub order_id: Option<Uuid>,
}

/// Ledger entries for the caller's decisions, newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<LedgerQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    Ok(Json(
        state
            .engine
            .list_transactions(&caller, query.order_id)
            .await?,
    ))
}
