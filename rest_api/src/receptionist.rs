// rest_api/src/receptionist.rs
//! Front-desk flows: the owner/pet registry and appointment booking.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Deserialize;

use models::{
    Appointment, AppointmentStatus, AppointmentType, AppointmentView, Owner, Pet,
};
use security::roles::RECEPTIONIST_ACCESS;
use storage::{AppointmentPatch, Database, NewAppointment, NewOwner, NewPet};

use crate::auth::{AuthStaff, require};
use crate::notifications::dispatch_logged;
use crate::validation::non_blank;
use crate::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/owners", post(create_owner).get(list_owners))
        .route("/owners/search", get(search_owners))
        .route("/owners/:owner_id/pets", post(create_pet).get(list_pets))
        .route("/appointments", post(create_appointment).get(appointments_by_date))
        .route("/appointments/today", get(today_appointments))
        .route("/appointments/:appointment_id", patch(update_appointment))
}

#[derive(Debug, Deserialize)]
struct OwnerCreateRequest {
    name: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnerSearchQuery {
    phone: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PetCreateRequest {
    name: String,
    species: String,
    breed: Option<String>,
    age: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct AppointmentCreateRequest {
    owner_id: i64,
    pet_id: i64,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    #[serde(rename = "type")]
    kind: AppointmentType,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AppointmentDateQuery {
    appointment_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct AppointmentUpdateRequest {
    appointment_date: Option<NaiveDate>,
    appointment_time: Option<NaiveTime>,
    status: Option<AppointmentStatus>,
    notes: Option<String>,
}

/// Booking confirmation, sent best-effort after the row is committed.
pub(crate) fn confirmation_message(
    clinic: &str,
    owner_name: &str,
    pet_name: &str,
    date: NaiveDate,
    time: NaiveTime,
) -> String {
    format!(
        "Hi {owner_name}! Your appointment for {pet_name} is confirmed on {} at {}. — {clinic}",
        date.format("%d-%b-%Y"),
        time.format("%I:%M %p"),
    )
}

fn cancellation_message(clinic: &str, owner_name: &str, pet_name: &str, date: NaiveDate) -> String {
    format!(
        "Hi {owner_name}, your appointment for {pet_name} on {} has been cancelled. \
         Please contact us to reschedule. — {clinic}",
        date.format("%d-%b-%Y"),
    )
}

async fn create_owner(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Json(payload): Json<OwnerCreateRequest>,
) -> Result<Json<Owner>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;
    let name = non_blank(&payload.name, "Name")?;
    let phone = non_blank(&payload.phone, "Phone")?;

    let db = state.db.lock().await;
    let owner = db.create_owner(&NewOwner {
        name,
        phone,
        email: payload.email,
        address: payload.address,
    })?;
    Ok(Json(owner))
}

async fn list_owners(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<Owner>>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.list_owners()?))
}

async fn search_owners(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Query(query): Query<OwnerSearchQuery>,
) -> Result<Json<Vec<Owner>>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.search_owners(
        query.phone.as_deref(),
        query.email.as_deref(),
    )?))
}

async fn create_pet(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
    Json(payload): Json<PetCreateRequest>,
) -> Result<Json<Pet>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;
    let name = non_blank(&payload.name, "Name")?;
    let species = non_blank(&payload.species, "Species")?;

    let db = state.db.lock().await;
    let pet = db.create_pet(
        owner_id,
        &NewPet {
            name,
            species,
            breed: payload.breed,
            age: payload.age,
        },
    )?;
    Ok(Json(pet))
}

async fn list_pets(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
) -> Result<Json<Vec<Pet>>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.list_pets(owner_id)?))
}

async fn create_appointment(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Json(payload): Json<AppointmentCreateRequest>,
) -> Result<Json<Appointment>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;

    let db = state.db.lock().await;
    let appointment = db.create_appointment(&NewAppointment {
        owner_id: payload.owner_id,
        pet_id: payload.pet_id,
        appointment_date: payload.appointment_date,
        appointment_time: payload.appointment_time,
        kind: payload.kind,
        notes: payload.notes,
    })?;

    send_confirmation(&db, &state.config.clinic.name, &appointment);
    Ok(Json(appointment))
}

fn send_confirmation(db: &Database, clinic: &str, appointment: &Appointment) {
    let owner = match db.find_owner(appointment.owner_id) {
        Ok(Some(owner)) => owner,
        _ => return,
    };
    let pet_name = db
        .find_pet(appointment.pet_id)
        .ok()
        .flatten()
        .map(|pet| pet.name)
        .unwrap_or_else(|| "your pet".into());
    let message = confirmation_message(
        clinic,
        &owner.name,
        &pet_name,
        appointment.appointment_date,
        appointment.appointment_time,
    );
    dispatch_logged(db, owner.id, Some(appointment.id), &message);
}

async fn today_appointments(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.appointments_on(Local::now().date_naive())?))
}

async fn appointments_by_date(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Query(query): Query<AppointmentDateQuery>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.appointments_on(query.appointment_date)?))
}

async fn update_appointment(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
    Json(payload): Json<AppointmentUpdateRequest>,
) -> Result<Json<Appointment>, ApiError> {
    require(&staff, RECEPTIONIST_ACCESS)?;

    let db = state.db.lock().await;
    let (old_status, appointment) = db.update_appointment(
        appointment_id,
        &AppointmentPatch {
            appointment_date: payload.appointment_date,
            appointment_time: payload.appointment_time,
            status: payload.status,
            notes: payload.notes,
        },
    )?;

    // Only a transition into "cancelled" notifies the owner.
    if appointment.status == AppointmentStatus::Cancelled
        && old_status != AppointmentStatus::Cancelled
    {
        if let Ok(Some(owner)) = db.find_owner(appointment.owner_id) {
            let pet_name = db
                .find_pet(appointment.pet_id)
                .ok()
                .flatten()
                .map(|pet| pet.name)
                .unwrap_or_else(|| "your pet".into());
            let message = cancellation_message(
                &state.config.clinic.name,
                &owner.name,
                &pet_name,
                appointment.appointment_date,
            );
            dispatch_logged(&db, owner.id, Some(appointment.id), &message);
        }
    }

    Ok(Json(appointment))
}
