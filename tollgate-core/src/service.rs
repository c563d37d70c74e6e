//! Identity lifecycle: registration, profile and administrative updates

use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{AuthConfig, PasswordPolicy};
use crate::credential::CredentialVerifier;
use crate::error::{AuthError, AuthResult};
use crate::identity::{normalize_email, IdentityRecord, UserId};
use crate::store::CredentialStore;

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn CredentialStore>,
    verifier: CredentialVerifier,
    policy: PasswordPolicy,
    clock: Arc<dyn Clock>,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        verifier: CredentialVerifier,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            store,
            verifier,
            policy,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn from_config(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> AuthResult<Self> {
        let verifier = CredentialVerifier::new(&config.password)?;
        Ok(Self::new(store, verifier, config.password.clone()))
    }

    /// Register a new active `user` identity
    pub async fn create(&self, email: &str, password: &str, name: &str) -> AuthResult<IdentityRecord> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_name(name)?;
        self.validate_password(password)?;

        if self.store.find_by_email(&email).await?.is_some() {
            warn!("Registration attempt for an existing email");
            return Err(AuthError::AlreadyExists);
        }

        let record = IdentityRecord::create(
            &email,
            password,
            name.trim(),
            &self.verifier,
            self.clock.now(),
        )?;
        self.store.save(record.clone()).await?;

        info!(user_id = %record.id, "Identity created");
        Ok(record)
    }

    pub async fn get_by_id(&self, id: UserId) -> AuthResult<IdentityRecord> {
        self.store.find_by_id(id).await?.ok_or(AuthError::NotFound)
    }

    pub async fn get_by_email(&self, email: &str) -> AuthResult<IdentityRecord> {
        self.store
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::NotFound)
    }

    pub async fn rename(&self, id: UserId, name: &str) -> AuthResult<IdentityRecord> {
        validate_name(name)?;

        let mut record = self.get_by_id(id).await?;
        record.rename(name.trim(), self.clock.now());
        self.store.save(record.clone()).await?;
        Ok(record)
    }

    /// Replace the password after checking the current one
    pub async fn change_password(&self, id: UserId, old: &str, new: &str) -> AuthResult<()> {
        let mut record = self.get_by_id(id).await?;

        if !record.verify_password(old, &self.verifier)? {
            warn!(user_id = %id, "Password change with wrong current password");
            return Err(AuthError::InvalidCredential);
        }

        self.validate_password(new)?;
        record.update_password(new, &self.verifier, self.clock.now())?;
        self.store.save(record).await?;

        info!(user_id = %id, "Password changed");
        Ok(())
    }

    /// Set the role from untrusted input; unknown roles are rejected before
    /// anything is written.
    pub async fn update_role(&self, id: UserId, role: &str) -> AuthResult<IdentityRecord> {
        let mut record = self.get_by_id(id).await?;
        record.set_role(role, self.clock.now())?;
        self.store.save(record.clone()).await?;

        info!(user_id = %id, role = %record.role, "Role updated");
        Ok(record)
    }

    pub async fn set_active(&self, id: UserId, active: bool) -> AuthResult<IdentityRecord> {
        let mut record = self.get_by_id(id).await?;
        record.set_active(active, self.clock.now());
        self.store.save(record.clone()).await?;

        info!(user_id = %id, active, "Activation changed");
        Ok(record)
    }

    fn validate_password(&self, password: &str) -> AuthResult<()> {
        if password.chars().count() < self.policy.min_length {
            return Err(AuthError::validation(
                format!(
                    "password must be at least {} characters",
                    self.policy.min_length
                ),
                "password",
            ));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> AuthResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AuthError::validation("invalid email address", "email")),
    }
}

fn validate_name(name: &str) -> AuthResult<()> {
    if name.trim().is_empty() {
        return Err(AuthError::validation("name must not be empty", "name"));
    }
    Ok(())
}
