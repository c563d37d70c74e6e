//! Authentication boundary: bearer extraction, gating middleware and the
//! mapping from core errors to HTTP responses

pub mod handlers;


use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tollgate_core::{AuthError, ErrorKind, RoleGuard, SessionClaims};
use tracing::debug;

use crate::AppState;

/// Core error rendered as `{ "error": code, "message": text }`
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.0;
        error.log();

        let kind = error.kind();
        let status = match kind {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match kind {
            ErrorKind::Internal => "internal server error".to_string(),
            _ => error.to_string(),
        };

        let body = Json(json!({
            "error": error.code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Pull the token out of `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::Unauthorized)?
        .to_str()
        .map_err(|_| AuthError::Unauthorized)?;

    match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => {
            debug!("Authorization header is not a bearer token");
            Err(AuthError::Unauthorized)
        }
    }
}

/// Verify the bearer token and attach its claims to the request
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = state.gate.authenticate(extract_bearer(request.headers())?)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Admit the request only if the attached claims carry the guard's role.
/// Must run after [`authenticate`].
pub async fn require_role(
    State(guard): State<RoleGuard>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard.check(request.extensions().get::<SessionClaims>())?;
    Ok(next.run(request).await)
}

/// Claims attached by [`authenticate`]
#[derive(Debug, Clone)]
pub struct Authenticated(pub SessionClaims);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionClaims>()
            .cloned()
            .map(Authenticated)
            .ok_or(ApiError(AuthError::Unauthorized))
    }
}
