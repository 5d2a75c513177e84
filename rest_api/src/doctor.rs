// rest_api/src/doctor.rs
//! Doctor-facing flows: the shared appointment queue and medical
//! records. The clinic runs a single queue, so "today's appointments"
//! is not filtered per doctor.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post, put},
};
use chrono::Local;
use serde::Deserialize;
use serde_json::{Value, json};

use models::{AppointmentView, MedicalRecord, MedicalRecordView};
use security::roles::DOCTOR_ACCESS;
use storage::RecordFields;

use crate::auth::{AuthStaff, require};
use crate::validation::non_blank;
use crate::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments/today", get(today_appointments))
        .route("/appointments/:appointment_id", get(view_appointment))
        .route(
            "/appointments/:appointment_id/complete",
            patch(complete_appointment),
        )
        .route(
            "/appointments/:appointment_id/medical-record",
            post(create_medical_record),
        )
        .route("/medical-records", get(my_medical_records))
        .route("/medical-records/:record_id", put(update_medical_record))
        .route("/pets/:pet_id/history", get(pet_history))
}

#[derive(Debug, Deserialize)]
struct MedicalRecordRequest {
    diagnosis: String,
    symptoms: Option<String>,
    treatment: Option<String>,
    prescription: Option<String>,
    notes: Option<String>,
}

impl MedicalRecordRequest {
    fn into_fields(self) -> Result<RecordFields, ApiError> {
        Ok(RecordFields {
            diagnosis: non_blank(&self.diagnosis, "Diagnosis")?,
            symptoms: self.symptoms,
            treatment: self.treatment,
            prescription: self.prescription,
            notes: self.notes,
        })
    }
}

async fn today_appointments(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    require(&staff, DOCTOR_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.appointments_on(Local::now().date_naive())?))
}

async fn view_appointment(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<AppointmentView>, ApiError> {
    require(&staff, DOCTOR_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.get_appointment_view(appointment_id)?))
}

async fn complete_appointment(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    require(&staff, DOCTOR_ACCESS)?;
    let db = state.db.lock().await;
    db.complete_appointment(appointment_id)?;
    Ok(Json(json!({ "message": "Appointment marked as completed" })))
}

async fn create_medical_record(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
    Json(payload): Json<MedicalRecordRequest>,
) -> Result<Json<MedicalRecord>, ApiError> {
    require(&staff, DOCTOR_ACCESS)?;
    let fields = payload.into_fields()?;

    let mut db = state.db.lock().await;
    let record = db.create_medical_record(appointment_id, staff.id, &fields)?;
    Ok(Json(record))
}

async fn update_medical_record(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    Json(payload): Json<MedicalRecordRequest>,
) -> Result<Json<MedicalRecordView>, ApiError> {
    require(&staff, DOCTOR_ACCESS)?;
    let fields = payload.into_fields()?;

    let db = state.db.lock().await;
    let existing = db.get_medical_record(record_id)?;
    if existing.doctor_id != staff.id {
        return Err(ApiError::Forbidden(
            "You can only edit your own records".into(),
        ));
    }
    Ok(Json(db.update_medical_record(record_id, &fields)?))
}

async fn my_medical_records(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<MedicalRecordView>>, ApiError> {
    require(&staff, DOCTOR_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.records_by_doctor(staff.id)?))
}

async fn pet_history(
    AuthStaff(staff): AuthStaff,
    State(state): State<AppState>,
    Path(pet_id): Path<i64>,
) -> Result<Json<Vec<MedicalRecordView>>, ApiError> {
    require(&staff, DOCTOR_ACCESS)?;
    let db = state.db.lock().await;
    Ok(Json(db.records_for_pet(pet_id)?))
}
