// rest_api/src/notifications.rs
//! Manual notification sending, the admin log view, and the
//! fire-and-forget dispatch path used by billing and scheduling.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::Deserialize;

use models::{DispatchOutcome, NotificationLog};
use security::roles::ADMIN_ACCESS;
use storage::Database;

use crate::auth::{AuthStaff, require};
use crate::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send", post(send))
        .route("/logs", get(logs))
}

fn default_channel() -> String {
    "sms".into()
}

#[derive(Debug, Deserialize)]
struct NotificationSendRequest {
    owner_id: i64,
    appointment_id: Option<i64>,
    #[serde(default = "default_channel")]
    channel: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    owner_id: Option<i64>,
}

/// Best-effort dispatch: records the message and reports the outcome
/// without ever failing the caller. The triggering operation (payment,
/// booking, cancellation) must not notice a broken notification path.
pub(crate) fn dispatch(
    db: &Database,
    owner_id: i64,
    appointment_id: Option<i64>,
    message: &str,
) -> DispatchOutcome {
    match db.record_notification(owner_id, appointment_id, "sms", message) {
        Ok(_) => DispatchOutcome::Sent,
        Err(err) => DispatchOutcome::Failed(err.to_string()),
    }
}

/// Dispatches and logs a failure, keeping the swallow-and-continue
/// contract in one place.
pub(crate) fn dispatch_logged(
    db: &Database,
    owner_id: i64,
    appointment_id: Option<i64>,
    message: &str,
) {
    if let DispatchOutcome::Failed(reason) = dispatch(db, owner_id, appointment_id, message) {
        tracing::warn!(owner_id, ?appointment_id, %reason, "notification dispatch failed");
    }
}

async fn send(
    AuthStaff(_staff): AuthStaff,
    State(state): State<AppState>,
    Json(payload): Json<NotificationSendRequest>,
) -> Result<Json<NotificationLog>, ApiError> {
    let db = state.db.lock().await;
    let log = db.record_notification(
        payload.owner_id,
        payload.appointment_id,
        &payload.channel,
        &payload.message,
    )?;
    Ok(Json(log))
}

async fn logs(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<NotificationLog>>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.list_notifications(query.owner_id)?))
}
