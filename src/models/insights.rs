use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::InventoryRecord;

/// Window, in days, the sales history is assumed to cover.
const HISTORY_WINDOW_DAYS: f64 = 30.0;

pub const PROJECTION_EXPLANATION: &str =
    "Projection from average daily sales over the last 30 days of recorded history.";

/// Restock projection for a single record, derived purely from its stored fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInsight {
    pub id: i64,
    pub name: String,
    pub current_quantity: i32,
    pub min_required_quantity: i32,
    pub low_stock: bool,
    pub low_stock_alert: bool,
    pub restock_in_days: i64,
    pub predicted_sales_next_month: i64,
    pub explanation: String,
}

impl StockInsight {
    pub fn for_record(record: &InventoryRecord) -> Self {
        let total_sold: f64 = record.sales_history.iter().map(units_sold).sum();
        let velocity = total_sold / HISTORY_WINDOW_DAYS;
        let divisor = if velocity > 0.0 { velocity } else { 1.0 };

        Self {
            id: record.id,
            name: record.name.clone(),
            current_quantity: record.current_quantity,
            min_required_quantity: record.min_required_quantity,
            low_stock: record.is_low_stock(),
            low_stock_alert: record.current_quantity <= record.min_required_quantity,
            restock_in_days: (f64::from(record.current_quantity) / divisor).floor() as i64,
            predicted_sales_next_month: (velocity * HISTORY_WINDOW_DAYS).floor() as i64,
            explanation: PROJECTION_EXPLANATION.to_string(),
        }
    }
}

/// Units recorded by one history entry. Entries are opaque, so anything without a
/// numeric `quantity` (or the shorter `qty`) counts as zero.
fn units_sold(entry: &Value) -> f64 {
    entry
        .get("quantity")
        .or_else(|| entry.get("qty"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}
