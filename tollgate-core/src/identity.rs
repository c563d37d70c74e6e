//! Identity records: the authoritative subject behind every session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::credential::{CredentialVerifier, PasswordProof};
use crate::error::{AuthError, AuthResult};

/// Opaque, immutable identifier of an identity
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Closed set of roles. Nothing outside this enum is ever persisted or trusted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::User, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthError::InvalidRole(s.to_string()))
    }
}

/// Canonical login handle: trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// The durable subject profile: credentials, role and status
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_proof: PasswordProof,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of an identity, safe to serialize outward
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IdentityRecord {
    /// Create a new active `user` identity, deriving the proof from `password`
    pub fn create(
        email: &str,
        password: &str,
        name: &str,
        verifier: &CredentialVerifier,
        now: DateTime<Utc>,
    ) -> AuthResult<Self> {
        let password_proof = verifier.derive(password)?;

        Ok(Self {
            id: UserId::new(),
            email: normalize_email(email),
            name: name.to_string(),
            password_proof,
            role: Role::User,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn verify_password(&self, password: &str, verifier: &CredentialVerifier) -> AuthResult<bool> {
        verifier.verify(password, &self.password_proof)
    }

    pub fn update_password(
        &mut self,
        password: &str,
        verifier: &CredentialVerifier,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        self.password_proof = verifier.derive(password)?;
        self.touch(now);
        Ok(())
    }

    pub fn rename(&mut self, name: &str, now: DateTime<Utc>) {
        self.name = name.to_string();
        self.touch(now);
    }

    /// Validates `role` against the closed set before mutating anything
    pub fn set_role(&mut self, role: &str, now: DateTime<Utc>) -> AuthResult<()> {
        let role = Role::from_str(role)?;
        self.assign_role(role, now);
        Ok(())
    }

    pub fn assign_role(&mut self, role: Role, now: DateTime<Utc>) {
        self.role = role;
        self.touch(now);
    }

    pub fn set_active(&mut self, active: bool, now: DateTime<Utc>) {
        self.active = active;
        self.touch(now);
    }

    pub fn profile(&self) -> IdentityProfile {
        IdentityProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// `updated_at` never moves backwards
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at);
    }
}
