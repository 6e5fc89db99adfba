//! # Tradepost Node
//!
//! REST and WebSocket API over the order lifecycle engine.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tradepost_store::{InMemoryMarketStore, MarketSnapshot, NotificationRelay};

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod state;

pub use config::NodeConfig;
pub use engine::OrderEngine;
pub use state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    // CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))

        // Users
        .route("/api/v1/users", post(api::users::register_user))
        .route("/api/v1/me", get(api::users::me))

        // Item catalog
        .route("/api/v1/items", get(api::items::list_my_items).post(api::items::create_item))
        .route("/api/v1/items/for-sale", get(api::items::list_items_for_sale))
        .route("/api/v1/items/:id", put(api::items::update_item).delete(api::items::delete_item))
        .route("/api/v1/items/:id/reassign", post(api::items::reassign_item))

        // Orders
        .route("/api/v1/orders", post(api::orders::place_order))
        .route("/api/v1/orders/mine", get(api::orders::list_my_orders))
        .route("/api/v1/orders/accepted", get(api::orders::list_accepted_orders))
        .route("/api/v1/orders/:id", get(api::orders::get_order))
        .route("/api/v1/orders/:id/accept", post(api::orders::accept_order))
        .route("/api/v1/orders/:id/decline", post(api::orders::decline_order))
        .route("/api/v1/orders/:id/received", post(api::orders::mark_received))

        // Inbox and ledger
        .route("/api/v1/notifications", get(api::notifications::list_pending_notifications))
        .route("/api/v1/transactions", get(api::transactions::list_transactions))

        // WebSocket endpoints
        .route("/ws/notifications", get(api::ws::notification_stream))

        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Build application state, restoring the snapshot at `data_file` if one
/// exists.
pub async fn build_state(config: &NodeConfig) -> anyhow::Result<AppState> {
    let relay = NotificationRelay::new(config.event_capacity);

    let store = match &config.data_file {
        Some(path) if path.exists() => {
            let snapshot = MarketSnapshot::load(path)
                .await
                .with_context(|| format!("reading snapshot {}", path.display()))?;
            info!(
                path = %path.display(),
                version = snapshot.version,
                orders = snapshot.orders.len(),
                "Restored marketplace snapshot"
            );
            InMemoryMarketStore::from_snapshot(snapshot)
                .with_context(|| format!("restoring snapshot {}", path.display()))?
        }
        _ => InMemoryMarketStore::new(),
    };

    Ok(AppState::new(Arc::new(store), relay))
}

/// Write the current state to `path`.
pub async fn save_state(state: &AppState, path: &Path) -> anyhow::Result<()> {
    let snapshot = state.engine.store().snapshot().await?;
    snapshot
        .save(path)
        .await
        .with_context(|| format!("writing snapshot {}", path.display()))?;
    info!(path = %path.display(), version = snapshot.version, "Saved marketplace snapshot");
    Ok(())
}

/// Run the Tradepost node until interrupted.
pub async fn run_server(config: NodeConfig) -> anyhow::Result<()> {
    info!("Tradepost node starting");

    let state = build_state(&config).await?;
    let app = create_router(state.clone());

    info!(addr = %config.addr, "Listening");

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(path) = &config.data_file {
        save_state(&state, path).await?;
    }

    info!("Tradepost node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
