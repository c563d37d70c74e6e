//! Tollgate web server

use axum::serve;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{create_app, AppState, WebConfig, WebError, WebResult};

pub struct TollgateServer {
    config: WebConfig,
    state: AppState,
}

impl TollgateServer {
    /// Build the state and seed the administrator, if one is configured
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone())?;

        if let Some(seed) = &config.admin {
            state.seed_admin(&seed.email, &seed.password).await?;
        }

        Ok(Self { config, state })
    }

    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();
        let app = create_app(self.state);

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!(
            address = %address,
            token_ttl_secs = self.config.auth.token_ttl_secs,
            refresh_policy = ?self.config.auth.refresh_policy,
            "Server listening"
        );

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdminSeed;
    use tollgate_core::{AuthConfig, PasswordPolicy, Role, SigningSecret};

    fn config() -> WebConfig {
        let mut auth = AuthConfig::new(SigningSecret::from(
            "server-test-secret-server-test-secret".to_string(),
        ));
        auth.password = PasswordPolicy::low_cost();
        WebConfig::new(auth)
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = TollgateServer::new(config()).await.unwrap();
        assert_eq!(server.config().port, 8080);
    }

    #[tokio::test]
    async fn test_admin_is_seeded() {
        let mut config = config();
        config.admin = Some(AdminSeed {
            email: "Root@X.com".to_string(),
            password: "root-password".to_string(),
        });

        let server = TollgateServer::new(config).await.unwrap();
        let admin = server
            .state()
            .identities
            .get_by_email("root@x.com")
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_missing_secret_fails() {
        let mut config = config();
        config.auth.jwt_secret = SigningSecret::new(Vec::new());

        assert!(matches!(
            TollgateServer::new(config).await,
            Err(WebError::Auth(_))
        ));
    }
}
