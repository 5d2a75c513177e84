// storage/src/billing.rs
//! Service catalog and invoicing. Invoice amounts are computed with
//! `rust_decimal` and frozen at creation; the invoice plus all of its
//! line items are written in one transaction, so a missing service
//! leaves nothing behind.

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row, params};
use rust_decimal::Decimal;

use models::{Invoice, InvoiceItem, InvoiceWithItems, PaymentStatus, Service, apply_discount};

use crate::{Database, StorageError, StorageResult, decimal_col, enum_col, timestamp_col};

fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        price: decimal_col(row, 3)?,
        is_active: row.get(4)?,
    })
}

fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        owner_id: row.get(2)?,
        total_amount: decimal_col(row, 3)?,
        discount_pct: decimal_col(row, 4)?,
        final_amount: decimal_col(row, 5)?,
        payment_status: enum_col(row, 6)?,
        payment_method: row.get(7)?,
        created_at: timestamp_col(row, 8)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<InvoiceItem> {
    Ok(InvoiceItem {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        service_id: row.get(2)?,
        quantity: row.get(3)?,
        unit_price: decimal_col(row, 4)?,
        line_total: decimal_col(row, 5)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
}

/// Partial update; only supplied fields change.
#[derive(Debug, Default, Clone)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct InvoiceItemInput {
    pub service_id: i64,
    pub quantity: i64,
}

impl Database {
    // ── services ──

    pub fn create_service(&self, new: &NewService) -> StorageResult<Service> {
        let exists: bool = self
            .conn
            .query_row("SELECT 1 FROM services WHERE name = ?1", [&new.name], |_| {
                Ok(true)
            })
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StorageError::Conflict("Service already exists".into()));
        }
        self.conn.execute(
            "INSERT INTO services (name, category, price, is_active) VALUES (?1, ?2, ?3, 1)",
            params![new.name, new.category, new.price.to_string()],
        )?;
        self.get_service(self.conn.last_insert_rowid())
    }

    pub fn get_service(&self, service_id: i64) -> StorageResult<Service> {
        self.conn
            .query_row(
                "SELECT id, name, category, price, is_active FROM services WHERE id = ?1",
                [service_id],
                service_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Service not found".into()))
    }

    pub fn list_services(&self) -> StorageResult<Vec<Service>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, price, is_active FROM services ORDER BY name",
        )?;
        let rows = stmt.query_map([], service_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn list_active_services(&self) -> StorageResult<Vec<Service>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, price, is_active FROM services
             WHERE is_active = 1 ORDER BY name",
        )?;
        let rows = stmt.query_map([], service_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn update_service(&self, service_id: i64, patch: &ServicePatch) -> StorageResult<Service> {
        self.get_service(service_id)?;

        if let Some(name) = &patch.name {
            let taken: bool = self
                .conn
                .query_row(
                    "SELECT 1 FROM services WHERE name = ?1 AND id != ?2",
                    params![name, service_id],
                    |_| Ok(true),
                )
                .optional()?
                .unwrap_or(false);
            if taken {
                return Err(StorageError::Conflict(
                    "Another service with this name already exists".into(),
                ));
            }
            self.conn.execute(
                "UPDATE services SET name = ?1 WHERE id = ?2",
                params![name, service_id],
            )?;
        }
        if let Some(category) = &patch.category {
            self.conn.execute(
                "UPDATE services SET category = ?1 WHERE id = ?2",
                params![category, service_id],
            )?;
        }
        if let Some(price) = &patch.price {
            self.conn.execute(
                "UPDATE services SET price = ?1 WHERE id = ?2",
                params![price.to_string(), service_id],
            )?;
        }
        if let Some(is_active) = patch.is_active {
            self.conn.execute(
                "UPDATE services SET is_active = ?1 WHERE id = ?2",
                params![is_active, service_id],
            )?;
        }
        self.get_service(service_id)
    }

    // ── invoices ──

    /// Builds an invoice from the catalog: every line's unit price is a
    /// snapshot of the current service price; the whole write is
    /// all-or-nothing. Appointment and owner ids are taken on trust
    /// (see DESIGN.md).
    pub fn create_invoice(
        &mut self,
        appointment_id: i64,
        owner_id: i64,
        items: &[InvoiceItemInput],
        discount_pct: Decimal,
    ) -> StorageResult<InvoiceWithItems> {
        let tx = self.conn.transaction()?;

        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let service = tx
                .query_row(
                    "SELECT id, name, category, price, is_active FROM services WHERE id = ?1",
                    [item.service_id],
                    service_from_row,
                )
                .optional()?
                .ok_or_else(|| {
                    StorageError::NotFound(format!("Service {} not found", item.service_id))
                })?;
            let line_total = service.price * Decimal::from(item.quantity);
            total += line_total;
            lines.push((service.id, item.quantity, service.price, line_total));
        }

        let final_amount = apply_discount(total, discount_pct);

        tx.execute(
            "INSERT INTO invoices
                 (appointment_id, owner_id, total_amount, discount_pct, final_amount,
                  payment_status)
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending')",
            params![
                appointment_id,
                owner_id,
                total.to_string(),
                discount_pct.to_string(),
                final_amount.to_string(),
            ],
        )?;
        let invoice_id = tx.last_insert_rowid();

        for (service_id, quantity, unit_price, line_total) in lines {
            tx.execute(
                "INSERT INTO invoice_items
                     (invoice_id, service_id, quantity, unit_price, line_total)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    invoice_id,
                    service_id,
                    quantity,
                    unit_price.to_string(),
                    line_total.to_string(),
                ],
            )?;
        }

        tx.commit()?;
        self.get_invoice(invoice_id)
    }

    pub fn get_invoice(&self, invoice_id: i64) -> StorageResult<InvoiceWithItems> {
        let invoice = self
            .conn
            .query_row(
                "SELECT id, appointment_id, owner_id, total_amount, discount_pct, final_amount,
                        payment_status, payment_method, created_at
                 FROM invoices WHERE id = ?1",
                [invoice_id],
                invoice_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Invoice not found".into()))?;

        let mut stmt = self.conn.prepare(
            "SELECT id, invoice_id, service_id, quantity, unit_price, line_total
             FROM invoice_items WHERE invoice_id = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map([invoice_id], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(InvoiceWithItems { invoice, items })
    }

    /// Filter by owner and/or the calendar date of creation; newest
    /// first.
    pub fn list_invoices(
        &self,
        owner_id: Option<i64>,
        date: Option<NaiveDate>,
    ) -> StorageResult<Vec<InvoiceWithItems>> {
        let mut sql = String::from(
            "SELECT id, appointment_id, owner_id, total_amount, discount_pct, final_amount,
                    payment_status, payment_method, created_at
             FROM invoices WHERE 1=1",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(owner_id) = owner_id {
            sql.push_str(" AND owner_id = ?");
            args.push(Box::new(owner_id));
        }
        if let Some(date) = date {
            sql.push_str(" AND date(created_at) = ?");
            args.push(Box::new(date.format("%Y-%m-%d").to_string()));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let params = rusqlite::params_from_iter(args.iter().map(|b| b.as_ref()));
        let invoices = stmt
            .query_map(params, invoice_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        invoices
            .into_iter()
            .map(|invoice| self.get_invoice(invoice.id))
            .collect()
    }

    /// Marks an invoice paid and records the method. Deliberately
    /// unguarded: re-paying a paid invoice re-applies silently.
    pub fn mark_invoice_paid(
        &self,
        invoice_id: i64,
        payment_method: &str,
    ) -> StorageResult<InvoiceWithItems> {
        let updated = self.conn.execute(
            "UPDATE invoices SET payment_status = ?1, payment_method = ?2 WHERE id = ?3",
            params![PaymentStatus::Paid.as_str(), payment_method, invoice_id],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound("Invoice not found".into()));
        }
        self.get_invoice(invoice_id)
    }
}
