// rest_api/src/lib.rs
//! HTTP surface of the clinic backend: an axum router with bearer-token
//! authentication and per-role route groups, backed by the `storage`
//! crate. Handlers validate input at the boundary, take the database
//! lock for the duration of the request, and map storage failures onto
//! HTTP statuses.

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use security::AuthError;
use storage::{Database, StorageError};

pub mod admin;
pub mod auth;
pub mod billing;
pub mod config;
pub mod doctor;
pub mod inventory;
pub mod notifications;
pub mod receptionist;
pub mod reports;
pub mod validation;
pub mod website;

pub use config::AppConfig;

// Define the REST API error enum
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => ApiError::NotFound(msg),
            StorageError::Conflict(msg) => ApiError::Conflict(msg),
            StorageError::Invalid(msg) => ApiError::Validation(msg),
            StorageError::Sqlite(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".into()),
            AuthError::InvalidToken => ApiError::Unauthorized("Invalid or expired token".into()),
            AuthError::PasswordHash(msg) | AuthError::Jwt(msg) => {
                ApiError::Internal(anyhow::anyhow!(msg))
            }
        }
    }
}

// Convert the error into an HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
        }

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

// Shared state for the axum application
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        AppState {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
        }
    }
}

/// Creates the first admin account when the staff table is empty, so a
/// fresh deployment can log in.
pub async fn ensure_bootstrap_admin(state: &AppState) -> Result<(), ApiError> {
    let db = state.db.lock().await;
    if db.staff_count()? > 0 {
        return Ok(());
    }
    let admin = &state.config.bootstrap_admin;
    let hash = security::hash_password(&admin.password)?;
    db.create_staff(
        &admin.name,
        &admin.username,
        &admin.email,
        models::Role::Admin,
        &hash,
    )?;
    tracing::info!(username = %admin.username, "created bootstrap admin account");
    Ok(())
}

async fn health_check_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "environment": state.config.environment })),
    )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    if config.allowed_origins.iter().any(|origin| origin == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Assembles the full application router.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/receptionist", receptionist::router())
        .nest("/doctor", doctor::router())
        .nest("/billing", billing::router())
        .nest("/inventory", inventory::router())
        .nest("/notifications", notifications::router())
        .nest("/reports", reports::router())
        .nest("/website", website::router())
        .with_state(state)
        .layer(cors)
}
