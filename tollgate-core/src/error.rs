//! Unified error handling for the authentication core
//!
//! Every failure is returned as a typed value. The boundary layer maps
//! [`ErrorKind`] to its own status codes; it never decides the category itself.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::identity::Role;

pub type AuthResult<T> = Result<T, AuthError>;

/// Transport-neutral category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

/// Outcome of parsing a signed token that did not yield claims.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Structural decode failure, unexpected signing algorithm or bad claim shape
    #[error("malformed token: {reason}")]
    Malformed { reason: String },

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,
}

impl TokenError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Main error type for login, refresh, authentication and identity lifecycle
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately merged so callers
    /// cannot enumerate registered identities.
    #[error("invalid credentials")]
    InvalidCredential,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: role '{required}' is required")]
    Forbidden { required: Role },

    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("identity already exists")]
    AlreadyExists,

    #[error("identity not found")]
    NotFound,

    #[error("stored password proof is corrupt: {0}")]
    CorruptProof(String),

    #[error("password derivation failed: {0}")]
    Derivation(String),

    #[error("token issuance failed: {0}")]
    TokenCreation(String),

    #[error("credential store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AuthError {
    pub fn validation(message: impl Into<String>, field: &str) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Category used by the boundary layer to pick a status code
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredential | AuthError::Unauthorized | AuthError::InvalidToken(_) => {
                ErrorKind::Unauthorized
            }
            AuthError::Forbidden { .. } => ErrorKind::Forbidden,
            AuthError::InvalidRole(_) | AuthError::Validation { .. } => ErrorKind::BadRequest,
            AuthError::AlreadyExists => ErrorKind::Conflict,
            AuthError::NotFound => ErrorKind::NotFound,
            AuthError::CorruptProof(_)
            | AuthError::Derivation(_)
            | AuthError::TokenCreation(_)
            | AuthError::Store { .. }
            | AuthError::Config { .. } => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for response bodies
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredential => "invalid_credentials",
            AuthError::Unauthorized => "unauthorized",
            AuthError::Forbidden { .. } => "forbidden",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::InvalidRole(_) => "invalid_role",
            AuthError::Validation { .. } => "validation_error",
            AuthError::AlreadyExists => "already_exists",
            AuthError::NotFound => "not_found",
            AuthError::CorruptProof(_)
            | AuthError::Derivation(_)
            | AuthError::TokenCreation(_)
            | AuthError::Store { .. }
            | AuthError::Config { .. } => "internal_error",
        }
    }

    /// Log the error with a level matching its kind
    pub fn log(&self) {
        match self.kind() {
            ErrorKind::Internal => {
                error!(code = self.code(), error = %self, "Internal authentication failure");
            }
            _ => {
                debug!(code = self.code(), error = %self, "Request denied");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_and_token_failures_are_unauthorized() {
        assert_eq!(AuthError::InvalidCredential.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::Unauthorized.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            AuthError::InvalidToken(TokenError::Expired).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            AuthError::InvalidToken(TokenError::malformed("x")).kind(),
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn role_mismatch_is_forbidden_and_bad_role_is_bad_request() {
        let err = AuthError::Forbidden {
            required: Role::Admin,
        };
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.to_string(), "forbidden: role 'admin' is required");
        assert_eq!(
            AuthError::InvalidRole("root".into()).kind(),
            ErrorKind::BadRequest
        );
    }

    #[test]
    fn integrity_failures_share_internal_code() {
        for err in [
            AuthError::CorruptProof("bad".into()),
            AuthError::Derivation("oom".into()),
            AuthError::store("down"),
            AuthError::config("missing secret"),
        ] {
            assert_eq!(err.kind(), ErrorKind::Internal);
            assert_eq!(err.code(), "internal_error");
        }
    }
}
