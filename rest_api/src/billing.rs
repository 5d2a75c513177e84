// rest_api/src/billing.rs
//! Service catalog and invoicing. Catalog writes are admin-only;
//! invoices are issued and settled by the front desk; reads are open to
//! any authenticated staff member.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use models::{Invoice, InvoiceWithItems, Service};
use security::roles::{ADMIN_ACCESS, RECEPTIONIST_ACCESS};
use storage::{InvoiceItemInput, NewService, ServicePatch};

use crate::auth::{AuthStaff, require};
use crate::notifications::dispatch_logged;
use crate::validation::non_blank;
use crate::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/services", post(create_service).get(list_services))
        .route("/services/:service_id", patch(update_service))
        .route("/invoices", post(create_invoice).get(list_invoices))
        .route("/invoices/:invoice_id", get(view_invoice))
        .route("/invoices/:invoice_id/pay", patch(pay_invoice))
}

#[derive(Debug, Deserialize)]
struct ServiceCreateRequest {
    name: String,
    category: Option<String>,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct ServiceUpdateRequest {
    name: Option<String>,
    category: Option<String>,
    price: Option<Decimal>,
    is_active: Option<bool>,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
struct InvoiceItemRequest {
    service_id: i64,
    #[serde(default = "default_quantity")]
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct InvoiceCreateRequest {
    appointment_id: i64,
    owner_id: i64,
    items: Vec<InvoiceItemRequest>,
    #[serde(default)]
    discount_pct: Decimal,
}

#[derive(Debug, Deserialize)]
struct InvoiceListQuery {
    owner_id: Option<i64>,
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct PaymentUpdateRequest {
    payment_method: String, // cash / card / upi
}

fn positive_price(price: Decimal) -> Result<(), ApiError> {
    if price <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "Price must be greater than zero".into(),
        ));
    }
    Ok(())
}

async fn create_service(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Json(payload): Json<ServiceCreateRequest>,
) -> Result<Json<Service>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    let name = non_blank(&payload.name, "Service name")?;
    positive_price(payload.price)?;

    let db = state.db.lock().await;
    let service = db.create_service(&NewService {
        name,
        category: payload.category,
        price: payload.price,
    })?;
    Ok(Json(service))
}

async fn list_services(
    AuthStaff(_staff): AuthStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<Service>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_services()?))
}

async fn update_service(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(service_id): Path<i64>,
    Json(payload): Json<ServiceUpdateRequest>,
) -> Result<Json<Service>, ApiError> {
    require(&staff, ADMIN_ACCESS)?;
    if let Some(price) = payload.price {
        positive_price(price)?;
    }
    let name = payload
        .name
        .as_deref()
        .map(|name| non_blank(name, "Service name"))
        .transpose()?;

    let db = state.db.lock().await;
    let service = db.update_service(
        service_id,
        &ServicePatch {
            name,
            category: payload.category,
            price: payload.price,
            is_active: payload.is_active,
        },
    )?;
    Ok(Json(service))
}

async fn create_invoice(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Json(payload): Json<InvoiceCreateRequest>,
) -> Result<Json<InvoiceWithItems>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;

    if payload.items.is_empty() {
        return Err(ApiError::Validation(
            "Invoice must have at least one item".into(),
        ));
    }
    let items: Vec<InvoiceItemInput> = payload
        .items
        .iter()
        .map(|item| {
            if item.quantity < 1 {
                return Err(ApiError::Validation(
                    "Item quantity must be at least 1".into(),
                ));
            }
            Ok(InvoiceItemInput {
                service_id: item.service_id,
                quantity: item.quantity,
            })
        })
        .collect::<Result<_, _>>()?;

    let mut db = state.db.lock().await;
    let invoice = db.create_invoice(
        payload.appointment_id,
        payload.owner_id,
        &items,
        payload.discount_pct,
    )?;
    Ok(Json(invoice))
}

async fn view_invoice(
    AuthStaff(_staff): AuthStaff,
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceWithItems>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.get_invoice(invoice_id)?))
}

async fn list_invoices(
    AuthStaff(_staff): AuthStaff,
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<Vec<InvoiceWithItems>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_invoices(query.owner_id, query.date)?))
}

fn payment_message(clinic: &str, owner_name: &str, invoice: &Invoice, method: &str) -> String {
    format!(
        "Hi {owner_name}! Payment of {} received via {method} for Invoice #{}. Thank you! — {clinic}",
        invoice.final_amount, invoice.id,
    )
}

async fn pay_invoice(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
    Json(payload): Json<PaymentUpdateRequest>,
) -> Result<Json<InvoiceWithItems>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;
    let method = non_blank(&payload.payment_method, "Payment method")?;

    let db = state.db.lock().await;
    let invoice = db.mark_invoice_paid(invoice_id, &method)?;

    // Payment confirmation is best-effort; a failure here never unwinds
    // the payment itself.
    if let Ok(Some(owner)) = db.find_owner(invoice.invoice.owner_id) {
        let message = payment_message(
            &state.config.clinic.name,
            &owner.name,
            &invoice.invoice,
            &method,
        );
        dispatch_logged(
            &db,
            owner.id,
            Some(invoice.invoice.appointment_id),
            &message,
        );
    }

    Ok(Json(invoice))
}
