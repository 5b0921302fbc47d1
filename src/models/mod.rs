pub mod insights;
pub mod inventory;

pub use insights::StockInsight;
pub use inventory::{InventoryRecord, InventoryRow, NewInventoryRecord};
