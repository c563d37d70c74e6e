//! Handlers for registration, login, refresh and identity administration

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tollgate_core::{AuthError, IdentityProfile, IssuedToken, SessionClaims, UserId};
use tracing::info;

use super::{extract_bearer, ApiError, Authenticated};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActiveRequest {
    pub active: bool,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Register a new identity with the default role
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<IdentityProfile>), ApiError> {
    let record = state
        .identities
        .create(&request.email, &request.password, &request.name)
        .await?;

    Ok((StatusCode::CREATED, Json(record.profile())))
}

/// Exchange email and password for a bearer token
pub async fn login_user(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<IssuedToken>, ApiError> {
    let issued = state.gate.login(&request.email, &request.password).await?;
    Ok(Json(issued))
}

/// Re-issue the bearer token from the `Authorization` header.
///
/// Stale tokens are accepted here, so this route sits outside the
/// authenticate middleware.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<IssuedToken>, ApiError> {
    let token = extract_bearer(&headers)?;
    let issued = state.gate.refresh_token(token).await?;
    Ok(Json(issued))
}

pub async fn current_user(Authenticated(claims): Authenticated) -> Json<SessionClaims> {
    Json(claims)
}

pub async fn change_password(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .identities
        .change_password(
            claims.subject,
            &request.current_password,
            &request.new_password,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_role(
    State(state): State<AppState>,
    Authenticated(admin): Authenticated,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<IdentityProfile>, ApiError> {
    let id = parse_user_id(&id)?;
    let record = state.identities.update_role(id, &request.role).await?;

    info!(admin_id = %admin.subject, user_id = %id, role = %record.role, "Role changed by administrator");
    Ok(Json(record.profile()))
}

pub async fn update_active(
    State(state): State<AppState>,
    Authenticated(admin): Authenticated,
    Path(id): Path<String>,
    Json(request): Json<UpdateActiveRequest>,
) -> Result<Json<IdentityProfile>, ApiError> {
    let id = parse_user_id(&id)?;
    let record = state.identities.set_active(id, request.active).await?;

    info!(admin_id = %admin.subject, user_id = %id, active = record.active, "Activation changed by administrator");
    Ok(Json(record.profile()))
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(AuthError::validation("invalid user id", "id")))
}
