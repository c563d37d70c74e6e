//! Tollgate Core - identity, credential and session-token primitives
//!
//! Turns an email/password pair into a signed, expiring bearer token and
//! gates later requests on that token and the role it carries.

pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
pub mod gate;
pub mod guard;
pub mod identity;
pub mod logging;
pub mod service;
pub mod store;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, PasswordPolicy, RefreshPolicy, SigningSecret};
pub use credential::{CredentialVerifier, PasswordProof};
pub use error::{AuthError, AuthResult, ErrorKind, TokenError};
pub use gate::{IssuedToken, SessionGate};
pub use guard::{require_role, RoleGuard};
pub use identity::{normalize_email, IdentityProfile, IdentityRecord, Role, UserId};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use service::IdentityService;
pub use store::{CredentialStore, MemoryCredentialStore};
pub use token::{ClaimsSnapshot, SessionClaims, TokenCodec};

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
