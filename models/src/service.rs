// models/src/service.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A billable catalog entry. `price` is copied onto invoice items at
/// invoice creation, so later price changes never touch issued invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
}
