// rest_api/src/inventory.rs
//! Inventory surface. Item CRUD is admin-only; any authenticated staff
//! member can adjust stock (the acting user lands in the audit log) and
//! read the expiry reports.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use models::{ExpiryAlertSummary, InventoryItem, InventoryLog};
use security::roles::ADMIN_ACCESS;
use storage::{ItemPatch, NewInventoryItem};

use crate::auth::{AuthStaff, require};
use crate::validation::non_blank;
use crate::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", post(create_item).get(list_items))
        .route("/items/:item_id", patch(update_item).delete(delete_item))
        .route("/items/:item_id/stock", post(change_stock))
        .route("/items/:item_id/logs", get(item_logs))
        .route("/expiring", get(expiring_items))
        .route("/expiry-alerts", get(expiry_alerts))
}

fn default_reorder_level() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
struct ItemCreateRequest {
    name: String,
    category: Option<String>,
    #[serde(default)]
    quantity: i64,
    unit: Option<String>,
    #[serde(default = "default_reorder_level")]
    reorder_level: i64,
    expiry_date: Option<NaiveDate>,
    cost_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ItemUpdateRequest {
    name: Option<String>,
    category: Option<String>,
    quantity: Option<i64>,
    unit: Option<String>,
    reorder_level: Option<i64>,
    expiry_date: Option<NaiveDate>,
    cost_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ItemListQuery {
    category: Option<String>,
    #[serde(default)]
    low_stock: bool,
}

#[derive(Debug, Deserialize)]
struct StockChangeRequest {
    change_qty: i64,
    reason: String,
}

fn default_days() -> i64 {
    30
}

#[derive(Debug, Deserialize)]
struct ExpiringQuery {
    #[serde(default = "default_days")]
    days: i64,
}

async fn create_item(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Json(payload): Json<ItemCreateRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let name = non_blank(&payload.name, "Name")?;
    if payload.quantity < 0 {
        return Err(ApiError::Validation("Quantity cannot be negative".into()));
    }
    if payload.cost_price.is_some_and(|price| price < Decimal::ZERO) {
        return Err(ApiError::Validation("Cost price cannot be negative".into()));
    }
    if payload
        .expiry_date
        .is_some_and(|date| date < Local::now().date_naive())
    {
        return Err(ApiError::Validation(
            "Expiry date cannot be in the past".into(),
        ));
    }

    let db = state.db.lock().await;
    let item = db.create_inventory_item(&NewInventoryItem {
        name,
        category: payload.category,
        quantity: payload.quantity,
        unit: payload.unit,
        reorder_level: payload.reorder_level,
        expiry_date: payload.expiry_date,
        cost_price: payload.cost_price,
    })?;
    Ok(Json(item))
}

async fn list_items(
    AuthStaff(_staff): AuthStaff,
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_inventory_items(
        query.category.as_deref(),
        query.low_stock,
    )?))
}

async fn update_item(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(payload): Json<ItemUpdateRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;

    let db = state.db.lock().await;
    let item = db.update_inventory_item(
        item_id,
        &ItemPatch {
            name: payload.name,
            category: payload.category,
            quantity: payload.quantity,
            unit: payload.unit,
            reorder_level: payload.reorder_level,
            expiry_date: payload.expiry_date,
            cost_price: payload.cost_price,
        },
    )?;
    Ok(Json(item))
}

async fn change_stock(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(payload): Json<StockChangeRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    if payload.change_qty == 0 {
        return Err(ApiError::Validation(
            "Stock change quantity cannot be zero".into(),
        ));
    }
    let reason = non_blank(&payload.reason, "Reason")?;

    let mut db = state.db.lock().await;
    let item = db.adjust_stock(item_id, payload.change_qty, &reason, staff.id)?;
    Ok(Json(item))
}

async fn item_logs(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Json<Vec<InventoryLog>>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.inventory_logs(item_id)?))
}

async fn expiring_items(
    AuthStaff(_staff): AuthStaff,
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.expiring_items(Local::now().date_naive(), query.days)?))
}

async fn expiry_alerts(
    AuthStaff(_staff): AuthStaff,
    State(state): State<AppState>,
) -> Result<Json<ExpiryAlertSummary>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.expiry_alerts(Local::now().date_naive())?))
}

async fn delete_item(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let mut db = state.db.lock().await;
    let item = db.delete_inventory_item(item_id)?;
    Ok(Json(json!({
        "message": format!("Item '{}' deleted successfully", item.name)
    })))
}
