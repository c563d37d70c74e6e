//! Configuration management
//!
//! Loaded once before first use and never written afterwards; the signing
//! secret is handed to the codec and gate explicitly at construction.

use chrono::Duration;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

use crate::error::{AuthError, AuthResult};

const MIN_RECOMMENDED_SECRET_LEN: usize = 32;
const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Symmetric key used to sign and verify session tokens
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SigningSecret {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningSecret(<{} bytes>)", self.0.len())
    }
}

/// How a refresh treats the identity facts carried by the old token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    /// Re-issue the old snapshot unchanged
    #[default]
    Snapshot,
    /// Re-fetch the identity; inactive or missing identities cannot refresh
    Revalidate,
}

impl std::str::FromStr for RefreshPolicy {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "revalidate" => Ok(Self::Revalidate),
            other => Err(AuthError::config(format!("unknown refresh policy '{}'", other))),
        }
    }
}

/// Argon2id cost parameters and password rules
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
            min_length: 6,
        }
    }
}

impl PasswordPolicy {
    /// Cheap parameters for tests and local development only
    pub fn low_cost() -> Self {
        Self {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
            min_length: 6,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: SigningSecret,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// How long after expiry a validly signed token may still be refreshed
    #[serde(default = "default_refresh_window_secs")]
    pub refresh_window_secs: u64,
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
    #[serde(default)]
    pub password: PasswordPolicy,
}

fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_refresh_window_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl AuthConfig {
    pub fn new(jwt_secret: SigningSecret) -> Self {
        Self {
            jwt_secret,
            token_ttl_secs: default_token_ttl_secs(),
            refresh_window_secs: default_refresh_window_secs(),
            refresh_policy: RefreshPolicy::default(),
            password: PasswordPolicy::default(),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::seconds(clamp_secs(self.token_ttl_secs))
    }

    pub fn refresh_window(&self) -> Duration {
        Duration::seconds(clamp_secs(self.refresh_window_secs))
    }

    /// Load configuration from `TOLLGATE_*` environment variables
    pub fn from_env() -> AuthResult<Self> {
        let secret = std::env::var("TOLLGATE_JWT_SECRET").map_err(|e| AuthError::Config {
            message: "TOLLGATE_JWT_SECRET must be set".to_string(),
            source: Some(Box::new(e)),
        })?;

        let mut config = Self::new(SigningSecret::from(secret));
        let defaults = PasswordPolicy::default();

        config.token_ttl_secs = env_or("TOLLGATE_TOKEN_TTL_SECS", config.token_ttl_secs)?;
        config.refresh_window_secs =
            env_or("TOLLGATE_REFRESH_WINDOW_SECS", config.refresh_window_secs)?;
        config.refresh_policy = env_or("TOLLGATE_REFRESH_POLICY", config.refresh_policy)?;
        config.password = PasswordPolicy {
            memory_kib: env_or("TOLLGATE_ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: env_or("TOLLGATE_ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: env_or("TOLLGATE_ARGON2_PARALLELISM", defaults.parallelism)?,
            min_length: env_or("TOLLGATE_PASSWORD_MIN_LENGTH", defaults.min_length)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AuthResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AuthError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AuthResult<Self> {
        let config: AuthConfig = toml::from_str(content).map_err(|e| AuthError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AuthResult<()> {
        if self.jwt_secret.is_empty() {
            return Err(AuthError::config("jwt_secret must not be empty"));
        }

        if self.jwt_secret.as_bytes().len() < MIN_RECOMMENDED_SECRET_LEN {
            warn!(
                length = self.jwt_secret.as_bytes().len(),
                recommended = MIN_RECOMMENDED_SECRET_LEN,
                "jwt_secret is shorter than recommended"
            );
        }

        if self.token_ttl_secs == 0 {
            return Err(AuthError::config("token_ttl_secs must be greater than 0"));
        }

        if self.token_ttl_secs > MAX_DURATION_SECS || self.refresh_window_secs > MAX_DURATION_SECS {
            return Err(AuthError::config(
                "token_ttl_secs and refresh_window_secs must not exceed 100 years",
            ));
        }

        argon2::Params::new(
            self.password.memory_kib,
            self.password.iterations,
            self.password.parallelism,
            None,
        )
        .map_err(|e| AuthError::config(format!("invalid argon2 parameters: {}", e)))?;

        Ok(())
    }
}

fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs.min(MAX_DURATION_SECS)).unwrap_or(i64::MAX / 1000)
}

fn env_or<T>(key: &str, default: T) -> AuthResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AuthError::config(format!("invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
