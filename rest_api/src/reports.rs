// rest_api/src/reports.rs
//! Admin reporting: pure read-only projections, recomputed on every
//! call.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use security::roles::ADMIN_ACCESS;
use storage::{AppointmentsReport, DashboardSummary, InventoryReport, RevenueReport, ServiceUsage};

use crate::auth::{AuthStaff, require};
use crate::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/revenue", get(revenue))
        .route("/services", get(services))
        .route("/appointments", get(appointments))
        .route("/inventory", get(inventory))
}

#[derive(Debug, Deserialize)]
struct DateRangeQuery {
    start: NaiveDate,
    end: NaiveDate,
}

async fn dashboard(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.dashboard_summary(Local::now().date_naive())?))
}

async fn revenue(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<RevenueReport>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.revenue_report(range.start, range.end)?))
}

async fn services(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<ServiceUsage>>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.services_report(range.start, range.end)?))
}

async fn appointments(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<AppointmentsReport>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.appointments_report(range.start, range.end)?))
}

async fn inventory(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
) -> Result<Json<InventoryReport>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.inventory_report(Local::now().date_naive())?))
}
