use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    models::{InventoryRecord, NewInventoryRecord, StockInsight},
    AppState,
};

pub const CREATED_STATUS: &str = "record_created";

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_inventory(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<Vec<InventoryRecord>>)> {
    let start = Instant::now();
    let records = state.store.list_all().await?;
    let elapsed = start.elapsed();

    info!(
        count = records.len(),
        low_stock = records.iter().filter(|r| r.is_low_stock()).count(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Listed inventory"
    );

    Ok((StatusCode::OK, Json(records)))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_inventory_record(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let Json(body) = payload?;
    let record = NewInventoryRecord::from_json(&body)?;

    let start = Instant::now();
    let id = state.store.insert(&record).await.map_err(AppError::write)?;

    info!(
        id,
        name = %record.name,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Created inventory record"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "status": CREATED_STATUS })),
    ))
}

// ── Insights ──────────────────────────────────────────────────────────────────

pub async fn inventory_insights(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<Vec<StockInsight>>)> {
    let records = state.store.list_all().await?;
    let insights: Vec<StockInsight> = records.iter().map(StockInsight::for_record).collect();

    info!(
        count = insights.len(),
        alerts = insights.iter().filter(|i| i.low_stock_alert).count(),
        "Computed stock insights"
    );

    Ok((StatusCode::OK, Json(insights)))
}
