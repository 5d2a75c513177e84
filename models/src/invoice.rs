// models/src/invoice.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(UnknownVariant::new("payment status", other)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issued invoice. The three amounts are fixed at creation; only the
/// payment fields move afterwards (pending → paid, one-way).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub appointment_id: i64,
    pub owner_id: i64,
    pub total_amount: Decimal,
    pub discount_pct: Decimal,
    pub final_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub service_id: i64,
    pub quantity: i64,
    /// Snapshot of the service price at invoice creation.
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

/// final = total × (1 − discount/100), decimal-exact.
pub fn apply_discount(total: Decimal, discount_pct: Decimal) -> Decimal {
    total * (Decimal::ONE - discount_pct / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn discount_is_decimal_exact() {
        assert_eq!(apply_discount(dec("1300.00"), dec("10")), dec("1170.000"));
        assert_eq!(apply_discount(dec("1300.00"), dec("0")), dec("1300.00"));
        assert_eq!(apply_discount(dec("100"), dec("100")), dec("0"));
    }

    #[test]
    fn ten_percent_off_thirteen_hundred() {
        // line items: 500 × 2 + 300 × 1
        let total = dec("500") * Decimal::from(2) + dec("300") * Decimal::from(1);
        assert_eq!(total, dec("1300"));
        assert_eq!(apply_discount(total, dec("10")), dec("1170.00"));
    }
}
