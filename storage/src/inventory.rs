// storage/src/inventory.rs
//! Inventory ledger: item CRUD, audited stock adjustments and the
//! expiry-severity report. A stock adjustment and its audit row commit
//! together or not at all; an adjustment that would push the quantity
//! below zero leaves the item untouched.

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row, params};
use rust_decimal::Decimal;

use models::{ExpiryAlertSummary, InventoryItem, InventoryLog};

use crate::{
    Database, StorageError, StorageResult, opt_date_col, opt_decimal_col, timestamp_col,
};

const ITEM_COLUMNS: &str =
    "id, name, category, quantity, unit, reorder_level, expiry_date, cost_price, updated_at";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        quantity: row.get(3)?,
        unit: row.get(4)?,
        reorder_level: row.get(5)?,
        expiry_date: opt_date_col(row, 6)?,
        cost_price: opt_decimal_col(row, 7)?,
        updated_at: timestamp_col(row, 8)?,
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryLog> {
    Ok(InventoryLog {
        id: row.get(0)?,
        item_id: row.get(1)?,
        change_qty: row.get(2)?,
        reason: row.get(3)?,
        performed_by: row.get(4)?,
        created_at: timestamp_col(row, 5)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub unit: Option<String>,
    pub reorder_level: i64,
    pub expiry_date: Option<NaiveDate>,
    pub cost_price: Option<Decimal>,
}

/// Partial update; only supplied fields change. No quantity bound is
/// applied here — only `adjust_stock` enforces the zero floor.
#[derive(Debug, Default, Clone)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub reorder_level: Option<i64>,
    pub expiry_date: Option<NaiveDate>,
    pub cost_price: Option<Decimal>,
}

impl Database {
    pub fn create_inventory_item(&self, new: &NewInventoryItem) -> StorageResult<InventoryItem> {
        self.conn.execute(
            "INSERT INTO inventory_items
                 (name, category, quantity, unit, reorder_level, expiry_date, cost_price)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.name,
                new.category,
                new.quantity,
                new.unit,
                new.reorder_level,
                new.expiry_date.map(|d| d.format("%Y-%m-%d").to_string()),
                new.cost_price.map(|p| p.to_string()),
            ],
        )?;
        self.get_inventory_item(self.conn.last_insert_rowid())
    }

    pub fn get_inventory_item(&self, item_id: i64) -> StorageResult<InventoryItem> {
        self.conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1"),
                [item_id],
                item_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Item not found".into()))
    }

    /// Nearest expiry first, items without an expiry last, then by name.
    pub fn list_inventory_items(
        &self,
        category: Option<&str>,
        low_stock: bool,
    ) -> StorageResult<Vec<InventoryItem>> {
        let mut sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE 1=1");
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(category) = category {
            sql.push_str(" AND category = ?");
            args.push(Box::new(category.to_string()));
        }
        if low_stock {
            sql.push_str(" AND quantity <= reorder_level");
        }
        sql.push_str(" ORDER BY (expiry_date IS NULL), expiry_date ASC, name ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(args.iter().map(|b| b.as_ref())),
            item_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn update_inventory_item(
        &self,
        item_id: i64,
        patch: &ItemPatch,
    ) -> StorageResult<InventoryItem> {
        self.get_inventory_item(item_id)?;

        if let Some(name) = &patch.name {
            self.conn.execute(
                "UPDATE inventory_items SET name = ?1 WHERE id = ?2",
                params![name, item_id],
            )?;
        }
        if let Some(category) = &patch.category {
            self.conn.execute(
                "UPDATE inventory_items SET category = ?1 WHERE id = ?2",
                params![category, item_id],
            )?;
        }
        if let Some(quantity) = patch.quantity {
            self.conn.execute(
                "UPDATE inventory_items SET quantity = ?1 WHERE id = ?2",
                params![quantity, item_id],
            )?;
        }
        if let Some(unit) = &patch.unit {
            self.conn.execute(
                "UPDATE inventory_items SET unit = ?1 WHERE id = ?2",
                params![unit, item_id],
            )?;
        }
        if let Some(reorder_level) = patch.reorder_level {
            self.conn.execute(
                "UPDATE inventory_items SET reorder_level = ?1 WHERE id = ?2",
                params![reorder_level, item_id],
            )?;
        }
        if let Some(expiry_date) = patch.expiry_date {
            self.conn.execute(
                "UPDATE inventory_items SET expiry_date = ?1 WHERE id = ?2",
                params![expiry_date.format("%Y-%m-%d").to_string(), item_id],
            )?;
        }
        if let Some(cost_price) = &patch.cost_price {
            self.conn.execute(
                "UPDATE inventory_items SET cost_price = ?1 WHERE id = ?2",
                params![cost_price.to_string(), item_id],
            )?;
        }

        self.conn.execute(
            "UPDATE inventory_items SET updated_at = datetime('now') WHERE id = ?1",
            [item_id],
        )?;
        self.get_inventory_item(item_id)
    }

    /// Applies a signed quantity change and appends the audit row in the
    /// same transaction. Fails without touching the item if the result
    /// would be negative.
    pub fn adjust_stock(
        &mut self,
        item_id: i64,
        change_qty: i64,
        reason: &str,
        staff_id: i64,
    ) -> StorageResult<InventoryItem> {
        let tx = self.conn.transaction()?;

        let quantity: Option<i64> = tx
            .query_row(
                "SELECT quantity FROM inventory_items WHERE id = ?1",
                [item_id],
                |row| row.get(0),
            )
            .optional()?;
        let quantity = quantity.ok_or_else(|| StorageError::NotFound("Item not found".into()))?;

        let new_quantity = quantity + change_qty;
        if new_quantity < 0 {
            return Err(StorageError::Invalid("Stock cannot go below zero".into()));
        }

        tx.execute(
            "UPDATE inventory_items SET quantity = ?1, updated_at = datetime('now')
             WHERE id = ?2",
            params![new_quantity, item_id],
        )?;
        tx.execute(
            "INSERT INTO inventory_logs (item_id, change_qty, reason, performed_by)
             VALUES (?1, ?2, ?3, ?4)",
            params![item_id, change_qty, reason, staff_id],
        )?;

        tx.commit()?;
        self.get_inventory_item(item_id)
    }

    /// Adjustment history of one item, newest first.
    pub fn inventory_logs(&self, item_id: i64) -> StorageResult<Vec<InventoryLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_id, change_qty, reason, performed_by, created_at
             FROM inventory_logs WHERE item_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([item_id], log_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Items expiring on or before `today + days`, soonest first.
    pub fn expiring_items(&self, today: NaiveDate, days: i64) -> StorageResult<Vec<InventoryItem>> {
        let cutoff = today + chrono::Duration::days(days);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items
             WHERE expiry_date IS NOT NULL AND expiry_date <= ?1
             ORDER BY expiry_date"
        ))?;
        let rows = stmt.query_map([cutoff.format("%Y-%m-%d").to_string()], item_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Severity-bucketed expiry report over every dated item.
    pub fn expiry_alerts(&self, today: NaiveDate) -> StorageResult<ExpiryAlertSummary> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items
             WHERE expiry_date IS NOT NULL
             ORDER BY expiry_date ASC"
        ))?;
        let items = stmt
            .query_map([], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ExpiryAlertSummary::build(&items, today))
    }

    /// Removes an item after deleting its log rows; the cleanup is the
    /// engine's job, not a schema cascade.
    pub fn delete_inventory_item(&mut self, item_id: i64) -> StorageResult<InventoryItem> {
        let item = self.get_inventory_item(item_id)?;

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM inventory_logs WHERE item_id = ?1", [item_id])?;
        tx.execute("DELETE FROM inventory_items WHERE id = ?1", [item_id])?;
        tx.commit()?;

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use models::Role;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn item(db: &Database, name: &str, qty: i64, expiry_days: Option<i64>) -> InventoryItem {
        db.create_inventory_item(&NewInventoryItem {
            name: name.into(),
            category: Some("medicine".into()),
            quantity: qty,
            unit: Some("bottle".into()),
            reorder_level: 10,
            expiry_date: expiry_days.map(|d| today() + Duration::days(d)),
            cost_price: Some("25.50".parse().unwrap()),
        })
        .unwrap()
    }

    fn staff_id(db: &Database) -> i64 {
        db.create_staff("N", "nurse", "nurse@clinic.test", Role::Receptionist, "h")
            .unwrap()
            .id
    }

    #[test]
    fn adjustment_updates_quantity_and_appends_log() {
        let mut db = db();
        let staff = staff_id(&db);
        let it = item(&db, "Amoxicillin", 20, None);

        let adjusted = db.adjust_stock(it.id, -5, "Used in surgery", staff).unwrap();
        assert_eq!(adjusted.quantity, 15);

        let logs = db.inventory_logs(it.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].change_qty, -5);
        assert_eq!(logs[0].reason, "Used in surgery");
        assert_eq!(logs[0].performed_by, staff);
    }

    #[test]
    fn adjustment_below_zero_rejected_without_partial_write() {
        let mut db = db();
        let staff = staff_id(&db);
        let it = item(&db, "Amoxicillin", 3, None);

        let err = db.adjust_stock(it.id, -4, "oops", staff).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));
        assert_eq!(err.to_string(), "Stock cannot go below zero");

        // neither the quantity nor the log moved
        assert_eq!(db.get_inventory_item(it.id).unwrap().quantity, 3);
        assert!(db.inventory_logs(it.id).unwrap().is_empty());
    }

    #[test]
    fn adjusting_missing_item_is_not_found() {
        let mut db = db();
        let staff = staff_id(&db);
        let err = db.adjust_stock(404, 1, "r", staff).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn listing_orders_by_expiry_with_dateless_last() {
        let db = db();
        item(&db, "Zaltrap", 5, Some(40));
        item(&db, "Bandages", 5, None);
        item(&db, "Amoxicillin", 5, Some(10));

        let listed = db.list_inventory_items(None, false).unwrap();
        let names: Vec<_> = listed.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Amoxicillin", "Zaltrap", "Bandages"]);
    }

    #[test]
    fn low_stock_filter_uses_reorder_level() {
        let db = db();
        item(&db, "Plenty", 50, None);
        let low = item(&db, "Scarce", 10, None); // quantity == reorder_level counts

        let flagged = db.list_inventory_items(None, true).unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, low.id);
    }

    #[test]
    fn expiring_items_respects_horizon() {
        let db = db();
        item(&db, "Soon", 5, Some(10));
        item(&db, "Later", 5, Some(60));
        item(&db, "Never", 5, None);

        let within_month = db.expiring_items(today(), 30).unwrap();
        assert_eq!(within_month.len(), 1);
        assert_eq!(within_month[0].name, "Soon");
    }

    #[test]
    fn alerts_bucket_by_severity() {
        let db = db();
        item(&db, "Old", 5, Some(-2));
        item(&db, "Urgent", 5, Some(3));
        item(&db, "Watch", 5, Some(15));
        item(&db, "Plan", 5, Some(45));
        item(&db, "Far", 5, Some(200));

        let summary = db.expiry_alerts(today()).unwrap();
        assert_eq!(summary.expired.len(), 1);
        assert_eq!(summary.critical.len(), 1);
        assert_eq!(summary.warning.len(), 1);
        assert_eq!(summary.upcoming.len(), 1);
        assert_eq!(summary.total_alerts, 4);
        assert_eq!(summary.expired[0].days_until_expiry, -2);
    }

    #[test]
    fn direct_edit_applies_no_quantity_floor() {
        let db = db();
        let it = item(&db, "Amoxicillin", 5, None);
        let updated = db
            .update_inventory_item(
                it.id,
                &ItemPatch {
                    quantity: Some(-7),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.quantity, -7);
    }

    #[test]
    fn delete_cascades_logs_first() {
        let mut db = db();
        let staff = staff_id(&db);
        let it = item(&db, "Amoxicillin", 20, None);
        db.adjust_stock(it.id, -1, "use", staff).unwrap();

        db.delete_inventory_item(it.id).unwrap();
        assert!(matches!(
            db.get_inventory_item(it.id).unwrap_err(),
            StorageError::NotFound(_)
        ));
        let remaining: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM inventory_logs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
