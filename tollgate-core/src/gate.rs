//! Session gate: login, refresh and per-request authentication
//!
//! Per request: `Unauthenticated -> authenticate -> Authenticated ->
//! require_role -> Authorized`. A failed step ends the request; nothing is
//! carried over between requests.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{AuthConfig, RefreshPolicy};
use crate::credential::{CredentialVerifier, PasswordProof};
use crate::error::{AuthError, AuthResult, TokenError};
use crate::guard;
use crate::identity::{normalize_email, Role};
use crate::store::CredentialStore;
use crate::token::{ClaimsSnapshot, SessionClaims, TokenCodec};

const TIMING_EQUALIZER_PASSWORD: &str = "tollgate-timing-equalizer";

/// A freshly signed bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl IssuedToken {
    fn bearer(token: String, claims: &SessionClaims) -> Self {
        Self {
            token,
            token_type: "Bearer",
            issued_at: claims.issued_at,
            expires_at: claims.expires_at,
        }
    }
}

#[derive(Clone)]
pub struct SessionGate {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    verifier: CredentialVerifier,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
    refresh_window: Duration,
    refresh_policy: RefreshPolicy,
    /// Compared against when the email is unknown so both paths cost the same
    dummy_proof: PasswordProof,
}

impl SessionGate {
    pub fn new(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> AuthResult<Self> {
        config.validate()?;

        let verifier = CredentialVerifier::new(&config.password)?;
        let dummy_proof = verifier.derive(TIMING_EQUALIZER_PASSWORD)?;

        Ok(Self {
            store,
            codec: TokenCodec::new(&config.jwt_secret),
            verifier,
            clock: Arc::new(SystemClock),
            token_ttl: config.token_ttl(),
            refresh_window: config.refresh_window(),
            refresh_policy: config.refresh_policy,
            dummy_proof,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Exchange email and password for a signed token.
    ///
    /// Unknown email and wrong password are indistinguishable
    /// (`InvalidCredential`). An inactive identity with the right password
    /// is `Unauthorized`.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<IssuedToken> {
        let email = normalize_email(email);

        let Some(record) = self.store.find_by_email(&email).await? else {
            self.verifier.verify(password, &self.dummy_proof).ok();
            debug!("Login failed: unknown identity");
            return Err(AuthError::InvalidCredential);
        };

        if !record.verify_password(password, &self.verifier)? {
            warn!(user_id = %record.id, "Invalid password");
            return Err(AuthError::InvalidCredential);
        }

        if !record.active {
            warn!(user_id = %record.id, "Login attempt for inactive identity");
            return Err(AuthError::Unauthorized);
        }

        let issued = self.issue(&ClaimsSnapshot::from(&record), self.clock.now())?;
        info!(user_id = %record.id, role = %record.role, "User logged in");
        Ok(issued)
    }

    /// Re-issue a validly signed token, even an expired one within the
    /// refresh window, with fresh timestamps.
    pub async fn refresh_token(&self, token: &str) -> AuthResult<IssuedToken> {
        let now = self.clock.now();
        let claims = self.codec.parse_verified(token)?;

        if claims.is_expired_at(now) {
            let stale_for = now.timestamp() - claims.expires_at;
            if stale_for > self.refresh_window.num_seconds() {
                debug!(user_id = %claims.subject, stale_for, "Token is past the refresh window");
                return Err(TokenError::Expired.into());
            }
        }

        let snapshot = match self.refresh_policy {
            RefreshPolicy::Snapshot => claims.snapshot(),
            RefreshPolicy::Revalidate => {
                let record = self
                    .store
                    .find_by_id(claims.subject)
                    .await?
                    .ok_or(AuthError::Unauthorized)?;

                if !record.active {
                    warn!(user_id = %record.id, "Refresh attempt for inactive identity");
                    return Err(AuthError::Unauthorized);
                }

                ClaimsSnapshot::from(&record)
            }
        };

        let issued = self.issue(&snapshot, now)?;
        info!(user_id = %snapshot.subject, "Token refreshed");
        Ok(issued)
    }

    /// Verify a bearer token for the current request
    pub fn authenticate(&self, token: &str) -> AuthResult<SessionClaims> {
        self.codec.parse(token, self.clock.now()).map_err(|e| {
            debug!(reason = %e, "Token rejected");
            AuthError::Unauthorized
        })
    }

    pub fn require_role<'a>(
        &self,
        claims: Option<&'a SessionClaims>,
        expected: Role,
    ) -> AuthResult<&'a SessionClaims> {
        guard::require_role(claims, expected)
    }

    fn issue(&self, snapshot: &ClaimsSnapshot, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let (token, claims) = self.codec.issue(snapshot, now, self.token_ttl)?;
        Ok(IssuedToken::bearer(token, &claims))
    }
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("codec", &self.codec)
            .field("verifier", &self.verifier)
            .field("token_ttl", &self.token_ttl)
            .field("refresh_window", &self.refresh_window)
            .field("refresh_policy", &self.refresh_policy)
            .finish_non_exhaustive()
    }
}
