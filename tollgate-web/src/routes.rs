//! Route definitions for the tollgate web server

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tollgate_core::RoleGuard;

use crate::auth::{self, handlers};
use crate::AppState;

/// Create API routes.
///
/// Layers added later wrap earlier ones, so `authenticate` always runs
/// before `require_role`.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/register", post(handlers::register_user))
        .route("/auth/login", post(handlers::login_user))
        .route("/auth/refresh", post(handlers::refresh_token));

    let authenticated = Router::new()
        .route("/auth/me", get(handlers::current_user))
        .route("/auth/password", put(handlers::change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    let admin = Router::new()
        .route("/admin/users/{id}/role", put(handlers::update_role))
        .route("/admin/users/{id}/active", put(handlers::update_active))
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::admin(),
            auth::require_role,
        ))
        .route_layer(middleware::from_fn_with_state(state, auth::authenticate));

    public.merge(authenticated).merge(admin)
}
