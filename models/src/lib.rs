// models/src/lib.rs
//! Domain types shared across the clinic backend: staff and roles, the
//! owner/pet registry, appointments, medical records, billing, inventory
//! and notification logs. These are plain serde structs; persistence and
//! HTTP concerns live in the `storage` and `rest_api` crates.

pub mod appointment;
pub mod inventory;
pub mod invoice;
pub mod medical_record;
pub mod notification;
pub mod owner;
pub mod pet;
pub mod service;
pub mod staff;

pub use appointment::{Appointment, AppointmentStatus, AppointmentType, AppointmentView};
pub use inventory::{
    AlertLevel, ExpiryAlert, ExpiryAlertSummary, InventoryItem, InventoryLog, classify_expiry,
};
pub use invoice::{Invoice, InvoiceItem, InvoiceWithItems, PaymentStatus, apply_discount};
pub use medical_record::{MedicalRecord, MedicalRecordView};
pub use notification::{DispatchOutcome, NotificationLog};
pub use owner::Owner;
pub use pet::Pet;
pub use service::Service;
pub use staff::{Role, StaffUser};

use thiserror::Error;

/// Raised when a stored string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}
