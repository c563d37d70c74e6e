//! Tollgate Web Server
//!
//! Thin axum boundary over `tollgate-core`: login, refresh and role-gated
//! identity routes.

pub mod auth;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use server::TollgateServer;
pub use state::AppState;

use axum::Router;
use tollgate_core::{AuthConfig, AuthError};
use tower_http::trace::TraceLayer;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentials for an administrator created at startup
#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    /// Seeded on startup when both `TOLLGATE_ADMIN_EMAIL` and
    /// `TOLLGATE_ADMIN_PASSWORD` are set
    pub admin: Option<AdminSeed>,
}

impl WebConfig {
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            auth,
            admin: None,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> WebResult<Self> {
        Ok(Self::from_env_with(AuthConfig::from_env()?))
    }

    /// Environment overrides on top of an already loaded `AuthConfig`
    pub fn from_env_with(auth: AuthConfig) -> Self {
        let mut config = Self::new(auth);

        if let Ok(host) = std::env::var("TOLLGATE_HOST") {
            config.host = host;
        }
        if let Some(port) = std::env::var("TOLLGATE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            config.port = port;
        }

        config.admin = match (
            std::env::var("TOLLGATE_ADMIN_EMAIL"),
            std::env::var("TOLLGATE_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(AdminSeed { email, password }),
            _ => None,
        };

        config
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::SigningSecret;

    #[test]
    fn address_joins_host_and_port() {
        let mut config = WebConfig::new(AuthConfig::new(SigningSecret::from(
            "address-test-secret".to_string(),
        )));
        config.host = "0.0.0.0".to_string();
        config.port = 3000;

        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn admin_seed_debug_hides_password() {
        let seed = AdminSeed {
            email: "root@x.com".to_string(),
            password: "hunter22".to_string(),
        };

        let rendered = format!("{:?}", seed);
        assert!(rendered.contains("root@x.com"));
        assert!(!rendered.contains("hunter22"));
    }
}
