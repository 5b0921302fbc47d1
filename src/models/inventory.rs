use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult, StoreError};

/// One stocked item. `id` is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub current_quantity: i32,
    pub min_required_quantity: i32,
    pub price: f64,
    /// Opaque history entries, kept in the order they were submitted.
    pub sales_history: Vec<Value>,
}

impl InventoryRecord {
    /// Stock has dropped under the configured minimum.
    pub fn is_low_stock(&self) -> bool {
        self.current_quantity < self.min_required_quantity
    }
}

/// Raw row as read from the `inventory` table. `sales_history` arrives as JSON text
/// and is only trusted once it parses as an array.
#[derive(Debug, sqlx::FromRow)]
pub struct InventoryRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub current_quantity: i32,
    pub min_required_quantity: i32,
    pub price: f64,
    pub sales_history: Option<String>,
}

impl TryFrom<InventoryRow> for InventoryRecord {
    type Error = StoreError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        let sales_history = match row.sales_history.as_deref() {
            None => Vec::new(),
            Some(text) => serde_json::from_str(text)?,
        };

        Ok(Self {
            id: row.id,
            name: row.name,
            category: row.category,
            current_quantity: row.current_quantity,
            min_required_quantity: row.min_required_quantity,
            price: row.price,
            sales_history,
        })
    }
}

// ── Request payloads ─────────────────────────────────────────────────────────

/// `price` is stored as NUMERIC(12, 2): ten integer digits, two decimals.
const MAX_PRICE: f64 = 10_000_000_000.0;
const PRICE_SCALE: usize = 2;

/// A create request that has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInventoryRecord {
    pub name: String,
    pub category: String,
    pub current_quantity: i32,
    pub min_required_quantity: i32,
    pub price: f64,
    pub sales_history: Vec<Value>,
}

impl NewInventoryRecord {
    /// Validates a raw JSON body. Fields are checked in a fixed order so the
    /// reported field is deterministic when several are wrong.
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| AppError::BadRequest("request body must be a JSON object".to_string()))?;

        let name = required_string(object, "name")?;
        if name.trim().is_empty() {
            return Err(AppError::invalid_field("name", "must not be empty"));
        }

        Ok(Self {
            name,
            category: required_string(object, "category")?,
            current_quantity: required_quantity(object, "current_quantity")?,
            min_required_quantity: required_quantity(object, "min_required_quantity")?,
            price: required_price(object, "price")?,
            sales_history: optional_history(object, "sales_history")?,
        })
    }

    /// Storage form of the history column.
    pub fn sales_history_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.sales_history)
    }

    pub fn into_record(self, id: i64) -> InventoryRecord {
        InventoryRecord {
            id,
            name: self.name,
            category: self.category,
            current_quantity: self.current_quantity,
            min_required_quantity: self.min_required_quantity,
            price: self.price,
            sales_history: self.sales_history,
        }
    }
}

fn present<'a>(object: &'a Map<String, Value>, field: &'static str) -> AppResult<&'a Value> {
    match object.get(field) {
        None | Some(Value::Null) => Err(AppError::missing_field(field)),
        Some(value) => Ok(value),
    }
}

fn required_string(object: &Map<String, Value>, field: &'static str) -> AppResult<String> {
    present(object, field)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::invalid_field(field, "expected a string"))
}

fn required_quantity(object: &Map<String, Value>, field: &'static str) -> AppResult<i32> {
    let value = present(object, field)?;
    let n = value
        .as_i64()
        .ok_or_else(|| AppError::invalid_field(field, "expected an integer"))?;
    if n < 0 {
        return Err(AppError::invalid_field(field, "must be >= 0"));
    }
    i32::try_from(n).map_err(|_| AppError::invalid_field(field, "out of range"))
}

fn required_price(object: &Map<String, Value>, field: &'static str) -> AppResult<f64> {
    let price = present(object, field)?
        .as_f64()
        .ok_or_else(|| AppError::invalid_field(field, "expected a number"))?;
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::invalid_field(field, "must be a non-negative number"));
    }
    if price >= MAX_PRICE {
        return Err(AppError::invalid_field(field, "must be below 10000000000"));
    }
    // Display prints the shortest representation that round-trips, never exponent form.
    let decimals = price
        .to_string()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len());
    if decimals > PRICE_SCALE {
        return Err(AppError::invalid_field(field, "at most two decimal places"));
    }
    Ok(price)
}

fn optional_history(object: &Map<String, Value>, field: &'static str) -> AppResult<Vec<Value>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => Ok(entries.clone()),
        Some(_) => Err(AppError::invalid_field(field, "expected an array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "name": "Ergonomic Office Chair",
            "category": "Furniture",
            "current_quantity": 8,
            "min_required_quantity": 15,
            "price": 349.5,
        })
    }

    fn field_of(err: AppError) -> &'static str {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_payload_defaults_history() {
        let record = NewInventoryRecord::from_json(&valid_body()).unwrap();
        assert_eq!(record.name, "Ergonomic Office Chair");
        assert_eq!(record.current_quantity, 8);
        assert!(record.sales_history.is_empty());
        assert_eq!(record.sales_history_json().unwrap(), "[]");
    }

    #[test]
    fn null_history_treated_as_absent() {
        let mut body = valid_body();
        body["sales_history"] = Value::Null;
        let record = NewInventoryRecord::from_json(&body).unwrap();
        assert!(record.sales_history.is_empty());
    }

    #[test]
    fn history_entries_kept_verbatim() {
        let mut body = valid_body();
        body["sales_history"] = json!([{ "date": "2024-01-01", "qty": 3 }, "free-form"]);
        let record = NewInventoryRecord::from_json(&body).unwrap();
        assert_eq!(
            record.sales_history,
            vec![json!({ "date": "2024-01-01", "qty": 3 }), json!("free-form")]
        );
    }

    #[test]
    fn each_required_field_reported_when_missing() {
        for field in [
            "name",
            "category",
            "current_quantity",
            "min_required_quantity",
            "price",
        ] {
            let mut body = valid_body();
            body.as_object_mut().unwrap().remove(field);
            let err = NewInventoryRecord::from_json(&body).unwrap_err();
            assert_eq!(field_of(err), field);
        }
    }

    #[test]
    fn null_required_field_is_missing() {
        let mut body = valid_body();
        body["price"] = Value::Null;
        let err = NewInventoryRecord::from_json(&body).unwrap_err();
        assert_eq!(err.to_string(), "missing required field: price");
    }

    #[test]
    fn blank_name_rejected() {
        let mut body = valid_body();
        body["name"] = json!("   ");
        assert_eq!(field_of(NewInventoryRecord::from_json(&body).unwrap_err()), "name");
    }

    #[test]
    fn wrong_types_rejected() {
        let cases = [
            ("category", json!(12)),
            ("current_quantity", json!("eight")),
            ("min_required_quantity", json!(1.5)),
            ("price", json!("free")),
            ("sales_history", json!({ "date": "2024-01-01" })),
        ];
        for (field, value) in cases {
            let mut body = valid_body();
            body[field] = value;
            let err = NewInventoryRecord::from_json(&body).unwrap_err();
            assert_eq!(field_of(err), field);
        }
    }

    #[test]
    fn negative_quantities_and_price_rejected() {
        for (field, value) in [
            ("current_quantity", json!(-1)),
            ("min_required_quantity", json!(-5)),
            ("price", json!(-0.01)),
        ] {
            let mut body = valid_body();
            body[field] = value;
            assert_eq!(field_of(NewInventoryRecord::from_json(&body).unwrap_err()), field);
        }
    }

    #[test]
    fn price_must_fit_column_precision() {
        for value in [json!(1e12), json!(10_000_000_000.0), json!(0.005), json!(12.345)] {
            let mut body = valid_body();
            body["price"] = value.clone();
            let err = NewInventoryRecord::from_json(&body).unwrap_err();
            assert_eq!(field_of(err), "price", "{value}");
        }

        for value in [json!(0), json!(129.99), json!(0.01), json!(9_999_999_999.99)] {
            let mut body = valid_body();
            body["price"] = value.clone();
            assert!(NewInventoryRecord::from_json(&body).is_ok(), "{value}");
        }
    }

    #[test]
    fn quantity_beyond_column_range_rejected() {
        let mut body = valid_body();
        body["current_quantity"] = json!(i64::from(i32::MAX) + 1);
        assert_eq!(
            field_of(NewInventoryRecord::from_json(&body).unwrap_err()),
            "current_quantity"
        );
    }

    #[test]
    fn non_object_body_is_bad_request() {
        let err = NewInventoryRecord::from_json(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn row_with_history_text_decodes() {
        let row = InventoryRow {
            id: 7,
            name: "USB-C Hub".to_string(),
            category: "Accessories".to_string(),
            current_quantity: 120,
            min_required_quantity: 50,
            price: 89.0,
            sales_history: Some(r#"[{"date":"2024-01-01","qty":3}]"#.to_string()),
        };
        let record = InventoryRecord::try_from(row).unwrap();
        assert_eq!(record.sales_history, vec![json!({ "date": "2024-01-01", "qty": 3 })]);
        assert!(!record.is_low_stock());
    }

    #[test]
    fn row_with_non_array_history_is_serialization_failure() {
        let row = InventoryRow {
            id: 1,
            name: "Broken".to_string(),
            category: "Misc".to_string(),
            current_quantity: 0,
            min_required_quantity: 1,
            price: 1.0,
            sales_history: Some(r#"{"not":"an array"}"#.to_string()),
        };
        let err = InventoryRecord::try_from(row).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn low_stock_is_strictly_below_minimum() {
        let record = NewInventoryRecord::from_json(&valid_body()).unwrap().into_record(1);
        assert!(record.is_low_stock());

        let mut at_minimum = record.clone();
        at_minimum.current_quantity = at_minimum.min_required_quantity;
        assert!(!at_minimum.is_low_stock());
    }
}
