// rest_api/src/auth.rs
//! Login and the bearer-token extractor every protected handler uses.

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::request::Parts,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use models::{Role, StaffUser};
use security::roles;

use crate::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
}

/// The authenticated staff member, resolved from the Authorization
/// header. Extraction fails with 401 when the token is missing, invalid,
/// expired, or no longer maps to an active account.
pub struct AuthStaff(pub StaffUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Missing or invalid token".into()))?;

        let claims = security::validate_token(token, state.config.jwt_secret.as_bytes())?;
        let staff_id = claims.staff_id()?;

        let db = state.db.lock().await;
        let staff = db
            .get_active_staff(staff_id)?
            .ok_or_else(|| ApiError::Unauthorized("User not found or inactive".into()))?;
        Ok(AuthStaff(staff))
    }
}

/// Allow-list check used at the top of protected handlers.
pub fn require(staff: &StaffUser, allowed: &[Role]) -> Result<(), ApiError> {
    if roles::authorize(staff.role, allowed) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".into()))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: Role,
    pub name: String,
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let staff = {
        let db = state.db.lock().await;
        db.find_active_staff_by_username(&payload.username)?
    };

    let staff = staff.ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;
    if !security::verify_password(&payload.password, &staff.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let token = security::issue_token(
        staff.id,
        staff.role,
        state.config.jwt_secret.as_bytes(),
        state.config.jwt_expire_minutes,
    )?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".into(),
        role: staff.role,
        name: staff.name,
    }))
}

async fn me(AuthStaff(staff): AuthStaff) -> Json<Value> {
    Json(json!({
        "id": staff.id,
        "name": staff.name,
        "role": staff.role,
        "username": staff.username,
    }))
}
