//! Shared application state

use std::sync::Arc;
use tollgate_core::{
    AuthResult, Clock, CredentialStore, IdentityRecord, IdentityService, MemoryCredentialStore,
    Role, SessionGate,
};
use tracing::info;

use crate::{WebConfig, WebResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebConfig>,
    pub gate: SessionGate,
    pub identities: IdentityService,
}

impl AppState {
    /// State backed by an in-process credential store
    pub fn new(config: WebConfig) -> WebResult<Self> {
        Self::with_store(config, Arc::new(MemoryCredentialStore::new()))
    }

    pub fn with_store(config: WebConfig, store: Arc<dyn CredentialStore>) -> WebResult<Self> {
        let gate = SessionGate::new(&config.auth, store.clone())?;
        let identities = IdentityService::from_config(&config.auth, store)?;

        Ok(Self {
            config: Arc::new(config),
            gate,
            identities,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.gate = self.gate.with_clock(clock.clone());
        self.identities = self.identities.with_clock(clock);
        self
    }

    /// Create an administrator, or promote the existing identity with that email
    pub async fn seed_admin(&self, email: &str, password: &str) -> AuthResult<IdentityRecord> {
        let record = match self.identities.get_by_email(email).await {
            Ok(existing) => existing,
            Err(tollgate_core::AuthError::NotFound) => {
                self.identities.create(email, password, "Administrator").await?
            }
            Err(e) => return Err(e),
        };

        let admin = self
            .identities
            .update_role(record.id, Role::Admin.as_str())
            .await?;
        info!(user_id = %admin.id, "Administrator seeded");
        Ok(admin)
    }
}
