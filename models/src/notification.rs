// models/src/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded outbound message. There is no real delivery behind this:
/// rows are written with status "sent" and kept as an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationLog {
    pub id: i64,
    pub owner_id: i64,
    pub appointment_id: Option<i64>,
    pub channel: String,
    pub message: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

/// Outcome of a fire-and-forget notification dispatch. A `Failed` outcome
/// is logged and discarded; it must never abort the operation that
/// triggered the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent)
    }
}
