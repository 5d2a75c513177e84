// rest_api/src/website.rs
//! Public, unauthenticated surface: clinic details, the published
//! service list, and the appointment-request intake form.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use storage::PublicIntake;

use crate::validation::non_blank;
use crate::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/info", get(clinic_info))
        .route("/services", get(public_services))
        .route("/appointments", post(appointment_request))
}

/// Catalog entry as shown to the public: no internal id or active flag.
#[derive(Debug, Serialize)]
struct PublicService {
    name: String,
    category: Option<String>,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct PublicAppointmentRequest {
    owner_name: String,
    phone: String,
    pet_name: String,
    species: String,
    preferred_date: NaiveDate,
    preferred_time: NaiveTime,
    notes: Option<String>,
}

async fn clinic_info(State(state): State<AppState>) -> Json<Value> {
    let clinic = &state.config.clinic;
    Json(json!({
        "name": clinic.name,
        "address": clinic.address,
        "phone": clinic.phone,
        "hours": clinic.hours,
        "about": clinic.about,
    }))
}

async fn public_services(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicService>>, ApiError> {
    let db = state.db.lock().await;
    let services = db
        .list_active_services()?
        .into_iter()
        .map(|service| PublicService {
            name: service.name,
            category: service.category,
            price: service.price,
        })
        .collect();
    Ok(Json(services))
}

async fn appointment_request(
    State(state): State<AppState>,
    Json(payload): Json<PublicAppointmentRequest>,
) -> Result<Json<Value>, ApiError> {
    let intake = PublicIntake {
        owner_name: non_blank(&payload.owner_name, "Name")?,
        phone: non_blank(&payload.phone, "Phone")?,
        pet_name: non_blank(&payload.pet_name, "Pet name")?,
        species: non_blank(&payload.species, "Species")?,
        preferred_date: payload.preferred_date,
        preferred_time: payload.preferred_time,
        notes: payload.notes,
    };

    let mut db = state.db.lock().await;
    let appointment = db.public_appointment_request(&intake)?;
    Ok(Json(json!({
        "message": "Appointment request received. We will contact you shortly.",
        "id": appointment.id,
    })))
}
