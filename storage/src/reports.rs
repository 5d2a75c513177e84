// storage/src/reports.rs
//! Read-only aggregates for the admin dashboard and reports. Every call
//! re-scans the relevant rows; revenue is folded in Rust over `Decimal`
//! values so no float arithmetic touches money.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::params;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use models::InventoryItem;

use crate::{Database, StorageResult, bad_column};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub todays_appointments: i64,
    pub total_revenue_today: Decimal,
    pub low_stock_count: i64,
    pub active_staff: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueReport {
    pub data: Vec<RevenuePoint>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceUsage {
    pub service_name: String,
    pub count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentsReport {
    pub total: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub walk_in: i64,
    pub scheduled: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryReport {
    pub low_stock: Vec<InventoryItem>,
    pub near_expiry: Vec<InventoryItem>,
}

impl Database {
    /// Today-at-a-glance counters for the dashboard.
    pub fn dashboard_summary(&self, today: NaiveDate) -> StorageResult<DashboardSummary> {
        let date = today.format("%Y-%m-%d").to_string();

        let todays_appointments: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM appointments WHERE appointment_date = ?1",
            [&date],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT final_amount FROM invoices
             WHERE payment_status = 'paid' AND date(created_at) = ?1",
        )?;
        let amounts = stmt.query_map([&date], |row| {
            let raw: String = row.get(0)?;
            Decimal::from_str(&raw).map_err(|e| bad_column(0, e))
        })?;
        let mut total_revenue_today = Decimal::ZERO;
        for amount in amounts {
            total_revenue_today += amount?;
        }

        let low_stock_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM inventory_items WHERE quantity <= reorder_level",
            [],
            |row| row.get(0),
        )?;

        let active_staff: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM staff_users WHERE is_active = 1",
            [],
            |row| row.get(0),
        )?;

        Ok(DashboardSummary {
            todays_appointments,
            total_revenue_today,
            low_stock_count,
            active_staff,
        })
    }

    /// Paid revenue grouped by calendar day over an inclusive range.
    pub fn revenue_report(&self, start: NaiveDate, end: NaiveDate) -> StorageResult<RevenueReport> {
        let mut stmt = self.conn.prepare(
            "SELECT date(created_at), final_amount FROM invoices
             WHERE payment_status = 'paid'
               AND date(created_at) >= ?1 AND date(created_at) <= ?2",
        )?;
        let rows = stmt.query_map(
            params![
                start.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string(),
            ],
            |row| {
                let day: String = row.get(0)?;
                let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .map_err(|e| bad_column(0, e))?;
                let raw: String = row.get(1)?;
                let amount = Decimal::from_str(&raw).map_err(|e| bad_column(1, e))?;
                Ok((day, amount))
            },
        )?;

        let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for row in rows {
            let (day, amount) = row?;
            *by_day.entry(day).or_insert(Decimal::ZERO) += amount;
        }

        let total = by_day.values().copied().sum();
        let data = by_day
            .into_iter()
            .map(|(date, amount)| RevenuePoint { date, amount })
            .collect();
        Ok(RevenueReport { data, total })
    }

    /// Service popularity and revenue over an inclusive range, busiest
    /// services first. Counts every invoice in the range regardless of
    /// payment status, matching the billing ledger rather than receipts.
    pub fn services_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<ServiceUsage>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.name, ii.quantity, ii.line_total
             FROM invoice_items ii
             JOIN services s ON s.id = ii.service_id
             JOIN invoices i ON i.id = ii.invoice_id
             WHERE date(i.created_at) >= ?1 AND date(i.created_at) <= ?2",
        )?;
        let rows = stmt.query_map(
            params![
                start.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string(),
            ],
            |row| {
                let name: String = row.get(0)?;
                let quantity: i64 = row.get(1)?;
                let raw: String = row.get(2)?;
                let line_total = Decimal::from_str(&raw).map_err(|e| bad_column(2, e))?;
                Ok((name, quantity, line_total))
            },
        )?;

        let mut usage: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();
        for row in rows {
            let (name, quantity, line_total) = row?;
            let entry = usage.entry(name).or_insert((0, Decimal::ZERO));
            entry.0 += quantity;
            entry.1 += line_total;
        }

        let mut report: Vec<ServiceUsage> = usage
            .into_iter()
            .map(|(service_name, (count, revenue))| ServiceUsage {
                service_name,
                count,
                revenue,
            })
            .collect();
        report.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(report)
    }

    /// Appointment status/type breakdown over an inclusive date range.
    pub fn appointments_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<AppointmentsReport> {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let count = |extra: &str| -> StorageResult<i64> {
            Ok(self.conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM appointments
                     WHERE appointment_date >= ?1 AND appointment_date <= ?2 {extra}"
                ),
                params![start, end],
                |row| row.get(0),
            )?)
        };

        Ok(AppointmentsReport {
            total: count("")?,
            completed: count("AND status = 'completed'")?,
            cancelled: count("AND status = 'cancelled'")?,
            walk_in: count("AND type = 'walk-in'")?,
            scheduled: count("AND type = 'scheduled'")?,
        })
    }

    /// Current low-stock and near-expiry (≤ 30 days) snapshots.
    pub fn inventory_report(&self, today: NaiveDate) -> StorageResult<InventoryReport> {
        let low_stock = self.list_inventory_items(None, true)?;
        let near_expiry = self.expiring_items(today, 30)?;
        Ok(InventoryReport {
            low_stock,
            near_expiry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::billing::{InvoiceItemInput, NewService};
    use crate::inventory::NewInventoryItem;
    use models::Role;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn today() -> NaiveDate {
        // matches date(CURRENT_TIMESTAMP), which the invoice rows carry
        chrono::Utc::now().date_naive()
    }

    #[test]
    fn dashboard_counts_paid_revenue_and_staff() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_staff("A", "admin1", "a@clinic.test", Role::Admin, "h")
            .unwrap();
        let inactive = db
            .create_staff("B", "gone", "b@clinic.test", Role::Doctor, "h")
            .unwrap();
        db.set_staff_status(inactive.id, false, today()).unwrap();

        let consult = db
            .create_service(&NewService {
                name: "Consultation".into(),
                category: None,
                price: dec("500"),
            })
            .unwrap();
        let line = [InvoiceItemInput {
            service_id: consult.id,
            quantity: 1,
        }];
        let paid = db.create_invoice(1, 1, &line, Decimal::ZERO).unwrap();
        db.mark_invoice_paid(paid.invoice.id, "cash").unwrap();
        // second invoice stays pending and must not count
        db.create_invoice(2, 1, &line, Decimal::ZERO).unwrap();

        db.create_inventory_item(&NewInventoryItem {
            name: "Scarce".into(),
            category: None,
            quantity: 2,
            unit: None,
            reorder_level: 10,
            expiry_date: None,
            cost_price: None,
        })
        .unwrap();

        let summary = db.dashboard_summary(today()).unwrap();
        assert_eq!(summary.total_revenue_today, dec("500"));
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.active_staff, 1);
    }

    #[test]
    fn revenue_report_only_counts_paid() {
        let mut db = Database::open_in_memory().unwrap();
        let consult = db
            .create_service(&NewService {
                name: "Consultation".into(),
                category: None,
                price: dec("250.50"),
            })
            .unwrap();
        let line = [InvoiceItemInput {
            service_id: consult.id,
            quantity: 2,
        }];
        let paid = db.create_invoice(1, 1, &line, Decimal::ZERO).unwrap();
        db.mark_invoice_paid(paid.invoice.id, "upi").unwrap();
        db.create_invoice(2, 1, &line, Decimal::ZERO).unwrap();

        let report = db.revenue_report(today(), today()).unwrap();
        assert_eq!(report.data.len(), 1);
        assert_eq!(report.data[0].amount, dec("501.00"));
        assert_eq!(report.total, dec("501.00"));
    }

    #[test]
    fn services_report_ranks_by_count() {
        let mut db = Database::open_in_memory().unwrap();
        let consult = db
            .create_service(&NewService {
                name: "Consultation".into(),
                category: None,
                price: dec("500"),
            })
            .unwrap();
        let groom = db
            .create_service(&NewService {
                name: "Grooming".into(),
                category: None,
                price: dec("300"),
            })
            .unwrap();

        db.create_invoice(
            1,
            1,
            &[
                InvoiceItemInput {
                    service_id: consult.id,
                    quantity: 1,
                },
                InvoiceItemInput {
                    service_id: groom.id,
                    quantity: 3,
                },
            ],
            Decimal::ZERO,
        )
        .unwrap();

        let report = db.services_report(today(), today()).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].service_name, "Grooming");
        assert_eq!(report[0].count, 3);
        assert_eq!(report[0].revenue, dec("900"));
        assert_eq!(report[1].service_name, "Consultation");
    }

    #[test]
    fn appointments_report_breaks_down_by_status_and_type() {
        use crate::appointments::{AppointmentPatch, NewAppointment};
        use crate::registry::{NewOwner, NewPet};
        use chrono::NaiveTime;
        use models::{AppointmentStatus, AppointmentType};

        let db = Database::open_in_memory().unwrap();
        let owner = db
            .create_owner(&NewOwner {
                name: "O".into(),
                phone: "1".into(),
                email: None,
                address: None,
            })
            .unwrap();
        let pet = db
            .create_pet(
                owner.id,
                &NewPet {
                    name: "P".into(),
                    species: "cat".into(),
                    breed: None,
                    age: None,
                },
            )
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let book = |kind: AppointmentType, hour: u32| {
            db.create_appointment(&NewAppointment {
                owner_id: owner.id,
                pet_id: pet.id,
                appointment_date: date,
                appointment_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                kind,
                notes: None,
            })
            .unwrap()
        };
        book(AppointmentType::WalkIn, 9);
        let second = book(AppointmentType::Scheduled, 10);
        db.update_appointment(
            second.id,
            &AppointmentPatch {
                status: Some(AppointmentStatus::Cancelled),
                ..Default::default()
            },
        )
        .unwrap();

        let report = db.appointments_report(date, date).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.cancelled, 1);
        assert_eq!(report.completed, 0);
        assert_eq!(report.walk_in, 1);
        assert_eq!(report.scheduled, 1);
    }
}
