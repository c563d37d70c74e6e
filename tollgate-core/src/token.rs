//! Signed session tokens
//!
//! Tokens use JWT compact serialization (`header.claims.signature`, each part
//! base64url encoded) and are signed with HMAC-SHA256. Parsing checks, in order:
//! structure, declared algorithm, signature, then expiry. Expiry is only looked
//! at once the signature is known to be good.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SigningSecret;
use crate::error::{AuthError, AuthResult, TokenError};
use crate::identity::{IdentityRecord, Role, UserId};

/// The only signing algorithm tokens may declare
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Identity facts copied from an [`IdentityRecord`] at issuance time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsSnapshot {
    pub subject: UserId,
    pub email: String,
    pub role: Role,
}

impl From<&IdentityRecord> for ClaimsSnapshot {
    fn from(record: &IdentityRecord) -> Self {
        Self {
            subject: record.id,
            email: record.email.clone(),
            role: record.role,
        }
    }
}

/// Claims carried inside a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionClaims {
    #[serde(rename = "sub")]
    pub subject: UserId,
    pub email: String,
    pub role: Role,
    /// Issued at (unix seconds)
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiration time (unix seconds)
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl SessionClaims {
    pub fn snapshot(&self) -> ClaimsSnapshot {
        ClaimsSnapshot {
            subject: self.subject,
            email: self.email.clone(),
            role: self.role,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now.timestamp()
    }
}

/// Issues and parses signed tokens with a fixed secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign `snapshot` with `iat = now` and `exp = now + ttl`.
    ///
    /// Deterministic: the same snapshot, secret and `now` give the same token.
    pub fn issue(
        &self,
        snapshot: &ClaimsSnapshot,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> AuthResult<(String, SessionClaims)> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::TokenCreation("token expiry out of range".to_string()))?;

        let claims = SessionClaims {
            subject: snapshot.subject,
            email: snapshot.email.clone(),
            role: snapshot.role,
            issued_at: now.timestamp(),
            expires_at: expires_at.timestamp(),
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok((token, claims))
    }

    /// Full verification, including expiry against `now`
    pub fn parse(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let claims = self.parse_verified(token)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Structure, algorithm and signature checks only; the token may be stale
    pub fn parse_verified(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("Token verification failed: {}", e);
            match e.kind() {
                JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
                JwtErrorKind::InvalidAlgorithm | JwtErrorKind::MissingAlgorithm => {
                    TokenError::malformed("unexpected signing algorithm")
                }
                _ => TokenError::malformed(e.to_string()),
            }
        })?;

        let claims = data.claims;
        if claims.expires_at < claims.issued_at {
            return Err(TokenError::malformed("expiry precedes issuance"));
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}
