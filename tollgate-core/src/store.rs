//! Credential store boundary
//!
//! Persistence lives outside this crate. The core only talks to identities
//! through [`CredentialStore`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::identity::{IdentityRecord, UserId};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an identity by its normalized email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<IdentityRecord>>;

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<IdentityRecord>>;

    /// Insert or replace the record with the same id
    async fn save(&self, record: IdentityRecord) -> AuthResult<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, IdentityRecord>,
    users_by_email: HashMap<String, UserId>,
}

/// In-memory store for development and testing
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<IdentityRecord>> {
        let state = self.state.read().await;
        Ok(state
            .users_by_email
            .get(email)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<IdentityRecord>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn save(&self, record: IdentityRecord) -> AuthResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if let Some(owner) = state.users_by_email.get(&record.email) {
            if *owner != record.id {
                return Err(AuthError::AlreadyExists);
            }
        }

        if let Some(previous) = state.users.get(&record.id) {
            if previous.email != record.email {
                state.users_by_email.remove(&previous.email);
            }
        }

        debug!(user_id = %record.id, "Saving identity");
        state.users_by_email.insert(record.email.clone(), record.id);
        state.users.insert(record.id, record);
        Ok(())
    }
}
