// storage/src/lib.rs
//! Embedded relational store for the clinic backend.
//!
//! A `Database` wraps a single `rusqlite::Connection`; the schema is
//! created on open. Each store lives in its own module as an
//! `impl Database` block. Mutations that touch more than one row run
//! inside one SQLite transaction and take `&mut self`.
//!
//! Column conventions: money is TEXT holding a decimal string, dates are
//! `YYYY-MM-DD`, times are `HH:MM:SS`, timestamps are UTC
//! `YYYY-MM-DD HH:MM:SS` (the same shape SQLite's CURRENT_TIMESTAMP
//! produces, so `date(...)` filters work on them).

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use thiserror::Error;

pub mod appointments;
pub mod billing;
pub mod inventory;
pub mod notifications;
pub mod records;
pub mod registry;
pub mod reports;
pub mod staff;

pub use appointments::{AppointmentPatch, NewAppointment, PublicIntake};
pub use billing::{InvoiceItemInput, NewService, ServicePatch};
pub use inventory::{ItemPatch, NewInventoryItem};
pub use records::RecordFields;
pub use registry::{NewOwner, NewPet};
pub use reports::{
    AppointmentsReport, DashboardSummary, InventoryReport, RevenuePoint, RevenueReport,
    ServiceUsage,
};
pub use staff::StaffProfilePatch;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Handle to the clinic database. Not `Sync`; callers share it behind a
/// mutex and hold the lock for the duration of one request.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database file and ensures the
    /// schema exists.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> StorageResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS staff_users (
                id            INTEGER PRIMARY KEY,
                name          TEXT NOT NULL,
                username      TEXT NOT NULL UNIQUE,
                email         TEXT NOT NULL UNIQUE,
                role          TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                is_active     INTEGER NOT NULL DEFAULT 1,
                created_at    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS owners (
                id      INTEGER PRIMARY KEY,
                name    TEXT NOT NULL,
                phone   TEXT NOT NULL,
                email   TEXT,
                address TEXT
            );

            CREATE TABLE IF NOT EXISTS pets (
                id       INTEGER PRIMARY KEY,
                owner_id INTEGER NOT NULL REFERENCES owners(id),
                name     TEXT NOT NULL,
                species  TEXT NOT NULL,
                breed    TEXT,
                age      INTEGER
            );

            CREATE TABLE IF NOT EXISTS appointments (
                id               INTEGER PRIMARY KEY,
                owner_id         INTEGER NOT NULL REFERENCES owners(id),
                pet_id           INTEGER NOT NULL REFERENCES pets(id),
                appointment_date TEXT NOT NULL,
                appointment_time TEXT NOT NULL,
                type             TEXT NOT NULL,
                status           TEXT NOT NULL,
                notes            TEXT,
                created_at       TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS medical_records (
                id             INTEGER PRIMARY KEY,
                appointment_id INTEGER NOT NULL UNIQUE REFERENCES appointments(id),
                doctor_id      INTEGER NOT NULL REFERENCES staff_users(id),
                diagnosis      TEXT NOT NULL,
                symptoms       TEXT,
                treatment      TEXT,
                prescription   TEXT,
                notes          TEXT,
                created_at     TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS services (
                id        INTEGER PRIMARY KEY,
                name      TEXT NOT NULL UNIQUE,
                category  TEXT,
                price     TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS invoices (
                id             INTEGER PRIMARY KEY,
                appointment_id INTEGER NOT NULL,
                owner_id       INTEGER NOT NULL,
                total_amount   TEXT NOT NULL,
                discount_pct   TEXT NOT NULL DEFAULT '0',
                final_amount   TEXT NOT NULL,
                payment_status TEXT NOT NULL DEFAULT 'pending',
                payment_method TEXT,
                created_at     TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS invoice_items (
                id         INTEGER PRIMARY KEY,
                invoice_id INTEGER NOT NULL REFERENCES invoices(id),
                service_id INTEGER NOT NULL REFERENCES services(id),
                quantity   INTEGER NOT NULL DEFAULT 1,
                unit_price TEXT NOT NULL,
                line_total TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS inventory_items (
                id            INTEGER PRIMARY KEY,
                name          TEXT NOT NULL,
                category      TEXT,
                quantity      INTEGER NOT NULL DEFAULT 0,
                unit          TEXT,
                reorder_level INTEGER NOT NULL DEFAULT 10,
                expiry_date   TEXT,
                cost_price    TEXT,
                updated_at    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS inventory_logs (
                id           INTEGER PRIMARY KEY,
                item_id      INTEGER NOT NULL REFERENCES inventory_items(id),
                change_qty   INTEGER NOT NULL,
                reason       TEXT NOT NULL,
                performed_by INTEGER NOT NULL REFERENCES staff_users(id),
                created_at   TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS notification_logs (
                id             INTEGER PRIMARY KEY,
                owner_id       INTEGER NOT NULL REFERENCES owners(id),
                appointment_id INTEGER,
                channel        TEXT NOT NULL,
                message        TEXT NOT NULL,
                status         TEXT NOT NULL,
                sent_at        TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;
        Ok(())
    }
}

// ── column codecs ──
// Row-mapping closures must return `rusqlite::Result`, so conversion
// failures are wrapped as FromSqlConversionFailure at the column index.

pub(crate) fn bad_column(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

pub(crate) fn decimal_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| bad_column(idx, e))
}

pub(crate) fn opt_decimal_col(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Decimal::from_str(&s).map_err(|e| bad_column(idx, e)))
        .transpose()
}

pub(crate) fn date_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| bad_column(idx, e))
}

pub(crate) fn opt_date_col(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| bad_column(idx, e)))
        .transpose()
}

pub(crate) fn time_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    NaiveTime::parse_from_str(&raw, "%H:%M:%S").map_err(|e| bad_column(idx, e))
}

pub(crate) fn timestamp_col(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| bad_column(idx, e))
}

pub(crate) fn enum_col<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| bad_column(idx, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_bootstrap_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.create_schema().unwrap();
    }

    #[test]
    fn open_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.db");
        {
            let _db = Database::open(&path).unwrap();
        }
        assert!(path.exists());
    }
}
