// rest_api/src/admin.rs
//! Staff administration. Admin-only; new accounts can only be doctors or
//! receptionists — further admins are provisioned out of band.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use chrono::Local;
use serde::Deserialize;
use serde_json::{Value, json};

use models::{Role, StaffUser};
use security::roles::ADMIN_ACCESS;
use storage::StaffProfilePatch;

use crate::auth::{AuthStaff, require};
use crate::validation::{email_shape, non_blank, password_strength};
use crate::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/staff", post(create_staff).get(list_staff))
        .route("/staff/:staff_id", patch(update_staff_status))
        .route("/staff/:staff_id/profile", patch(update_staff_profile))
        .route("/staff/:staff_id/reset-password", post(reset_staff_password))
        .route("/ping", get(ping))
}

#[derive(Debug, Deserialize)]
struct StaffCreateRequest {
    name: String,
    username: String,
    email: String,
    password: String,
    role: Role,
}

#[derive(Debug, Deserialize)]
struct StaffStatusUpdateRequest {
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct StaffProfileUpdateRequest {
    name: Option<String>,
    username: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StaffPasswordResetRequest {
    new_password: String,
}

async fn ping(AuthStaff(admin): AuthStaff) -> Result<Json<Value>, ApiError> {
    require(&admin, ADMIN_ACCESS)?;
    Ok(Json(json!({
        "message": "Admin access granted",
        "id": admin.id,
        "name": admin.name,
        "role": admin.role,
    })))
}

async fn create_staff(
    AuthStaff(admin): AuthStaff,
    State(state): State<AppState>,
    Json(payload): Json<StaffCreateRequest>,
) -> Result<Json<StaffUser>, ApiError> {
    require(&admin, ADMIN_ACCESS)?;

    if payload.role == Role::Admin {
        return Err(ApiError::Validation(
            "Role must be doctor or receptionist".into(),
        ));
    }
    let name = non_blank(&payload.name, "Name")?;
    let username = non_blank(&payload.username, "Username")?;
    let email = email_shape(&payload.email)?;
    password_strength(&payload.password)?;
    let hash = security::hash_password(&payload.password)?;

    let db = state.db.lock().await;
    let staff = db.create_staff(&name, &username, &email, payload.role, &hash)?;
    Ok(Json(staff))
}

async fn list_staff(
    AuthStaff(admin): AuthStaff,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    require(&admin, ADMIN_ACCESS)?;
    let db = state.db.lock().await;
    let staff = db.list_staff()?;
    Ok(Json(json!({ "staff": staff })))
}

async fn update_staff_status(
    AuthStaff(admin): AuthStaff,
    State(state): State<AppState>,
    Path(staff_id): Path<i64>,
    Json(payload): Json<StaffStatusUpdateRequest>,
) -> Result<Json<StaffUser>, ApiError> {
    require(&admin, ADMIN_ACCESS)?;

    // An admin can never switch off their own account.
    if staff_id == admin.id && !payload.is_active {
        return Err(ApiError::Conflict(
            "Cannot deactivate your own account".into(),
        ));
    }

    let db = state.db.lock().await;
    let staff = db.set_staff_status(staff_id, payload.is_active, Local::now().date_naive())?;
    Ok(Json(staff))
}

async fn update_staff_profile(
    AuthStaff(admin): AuthStaff,
    State(state): State<AppState>,
    Path(staff_id): Path<i64>,
    Json(payload): Json<StaffProfileUpdateRequest>,
) -> Result<Json<StaffUser>, ApiError> {
    require(&admin, ADMIN_ACCESS)?;

    let patch = StaffProfilePatch {
        name: payload
            .name
            .as_deref()
            .map(|name| non_blank(name, "Name"))
            .transpose()?,
        username: payload
            .username
            .as_deref()
            .map(|username| non_blank(username, "Username"))
            .transpose()?,
        email: payload
            .email
            .as_deref()
            .map(email_shape)
            .transpose()?,
    };

    let db = state.db.lock().await;
    let staff = db.update_staff_profile(staff_id, &patch)?;
    Ok(Json(staff))
}

async fn reset_staff_password(
    AuthStaff(admin): AuthStaff,
    State(state): State<AppState>,
    Path(staff_id): Path<i64>,
    Json(payload): Json<StaffPasswordResetRequest>,
) -> Result<Json<Value>, ApiError> {
    require(&admin, ADMIN_ACCESS)?;
    password_strength(&payload.new_password)?;
    let hash = security::hash_password(&payload.new_password)?;

    let db = state.db.lock().await;
    db.reset_staff_password(staff_id, &hash)?;
    Ok(Json(json!({ "message": "Password reset successfully" })))
}
