// models/src/inventory.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::UnknownVariant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub unit: Option<String>,
    pub reorder_level: i64,
    pub expiry_date: Option<NaiveDate>,
    pub cost_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Low stock means the quantity has fallen to or below the reorder
    /// level.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// Append-only audit row for every stock adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLog {
    pub id: i64,
    pub item_id: i64,
    pub change_qty: i64,
    pub reason: String,
    pub performed_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Expiry severity, derived purely from days-until-expiry at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Expired,
    Critical,
    Warning,
    Upcoming,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Expired => "expired",
            AlertLevel::Critical => "critical",
            AlertLevel::Warning => "warning",
            AlertLevel::Upcoming => "upcoming",
        }
    }
}

impl FromStr for AlertLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expired" => Ok(AlertLevel::Expired),
            "critical" => Ok(AlertLevel::Critical),
            "warning" => Ok(AlertLevel::Warning),
            "upcoming" => Ok(AlertLevel::Upcoming),
            other => Err(UnknownVariant::new("alert level", other)),
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an expiry date relative to `today`.
///
/// Buckets by `delta = expiry − today` in days: delta < 0 → expired,
/// 0–7 → critical, 8–30 → warning, 31–90 → upcoming. Anything further
/// out than 90 days is not alerted on at all.
pub fn classify_expiry(expiry: NaiveDate, today: NaiveDate) -> Option<AlertLevel> {
    let delta = (expiry - today).num_days();
    match delta {
        d if d < 0 => Some(AlertLevel::Expired),
        0..=7 => Some(AlertLevel::Critical),
        8..=30 => Some(AlertLevel::Warning),
        31..=90 => Some(AlertLevel::Upcoming),
        _ => None,
    }
}

/// One entry of the expiry-alert report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryAlert {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub unit: Option<String>,
    pub expiry_date: NaiveDate,
    pub days_until_expiry: i64,
    pub alert_level: AlertLevel,
}

impl ExpiryAlert {
    pub fn from_item(item: &InventoryItem, today: NaiveDate) -> Option<Self> {
        let expiry = item.expiry_date?;
        let level = classify_expiry(expiry, today)?;
        Some(ExpiryAlert {
            id: item.id,
            name: item.name.clone(),
            category: item.category.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            expiry_date: expiry,
            days_until_expiry: (expiry - today).num_days(),
            alert_level: level,
        })
    }
}

/// Expiry alerts grouped by severity. `total_alerts` is the sum of the
/// four bucket sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ExpiryAlertSummary {
    pub expired: Vec<ExpiryAlert>,
    pub critical: Vec<ExpiryAlert>,
    pub warning: Vec<ExpiryAlert>,
    pub upcoming: Vec<ExpiryAlert>,
    pub total_alerts: usize,
}

impl ExpiryAlertSummary {
    /// Bucket every item that has an expiry date. Items more than 90 days
    /// out are excluded entirely.
    pub fn build<'a>(items: impl IntoIterator<Item = &'a InventoryItem>, today: NaiveDate) -> Self {
        let mut summary = ExpiryAlertSummary::default();
        for item in items {
            let Some(alert) = ExpiryAlert::from_item(item, today) else {
                continue;
            };
            match alert.alert_level {
                AlertLevel::Expired => summary.expired.push(alert),
                AlertLevel::Critical => summary.critical.push(alert),
                AlertLevel::Warning => summary.warning.push(alert),
                AlertLevel::Upcoming => summary.upcoming.push(alert),
            }
        }
        summary.total_alerts = summary.expired.len()
            + summary.critical.len()
            + summary.warning.len()
            + summary.upcoming.len();
        summary
    }
}
