pub mod inventory;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use tracing::warn;

use crate::AppState;

pub const SERVICE_NAME: &str = "InvTrackPro";

/// Always answers 200; store reachability is reported in the body.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let database = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            warn!(error = %e, "Health probe could not reach the store");
            "disconnected"
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "active",
            "service": SERVICE_NAME,
            "region": state.config.region,
            "database": database,
            "model": state.config.model_id,
        })),
    )
}
