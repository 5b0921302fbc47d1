//! Inventory tracking REST API: list and create inventory records in PostgreSQL,
//! report service health, and serve the bundled front-end.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

#[cfg(test)]
pub(crate) mod test_helpers;

use crate::config::Config;
use crate::db::InventoryStore;

/// Shared application state, cheap to clone (all heap behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
    pub config: Arc<Config>,
}

pub fn build_router(state: AppState) -> Router {
    // ServeDir maps `/` to index.html and answers 404 for missing files and for
    // any path that would climb out of the asset root.
    let assets = ServeDir::new(&state.config.static_dir);

    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/api/health", get(handlers::health))

        // ── Inventory ───────────────────────────────────────────────────────
        .route(
            "/api/inventory",
            get(handlers::inventory::list_inventory)
                .post(handlers::inventory::create_inventory_record),
        )
        .route(
            "/api/inventory/insights",
            get(handlers::inventory::inventory_insights),
        )

        // ── Front-end ───────────────────────────────────────────────────────
        .fallback_service(assets)

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
