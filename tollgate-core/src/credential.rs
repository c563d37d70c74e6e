//! Password derivation and verification using Argon2id

use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::config::PasswordPolicy;
use crate::error::{AuthError, AuthResult};
use crate::logging::performance;

/// One-way, salted representation of a password in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordProof(String);

impl PasswordProof {
    /// Wrap a PHC string loaded from storage. Integrity is checked on verify.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordProof(<redacted>)")
    }
}

/// Compares plaintext secrets against stored proofs.
///
/// Derivation is slow and memory-hard; the cost comes from
/// [`PasswordPolicy`]. Verification reads the parameters embedded in the
/// proof itself, so proofs derived under an older policy keep working.
#[derive(Clone)]
pub struct CredentialVerifier {
    argon2: Argon2<'static>,
}

impl CredentialVerifier {
    pub fn new(policy: &PasswordPolicy) -> AuthResult<Self> {
        let params = Params::new(
            policy.memory_kib,
            policy.iterations,
            policy.parallelism,
            None,
        )
        .map_err(|e| AuthError::config(format!("invalid argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Derive a fresh proof with a random salt
    pub fn derive(&self, password: &str) -> AuthResult<PasswordProof> {
        performance::measure_sync("derive_password_proof", || {
            let salt = SaltString::generate(&mut OsRng);

            self.argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| PasswordProof(hash.to_string()))
                .map_err(|e| AuthError::Derivation(e.to_string()))
        })
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored proof is unusable
    pub fn verify(&self, password: &str, proof: &PasswordProof) -> AuthResult<bool> {
        let parsed = PasswordHash::new(proof.as_str())
            .map_err(|e| AuthError::CorruptProof(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::CorruptProof(e.to_string())),
        }
    }
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self.argon2.params();
        f.debug_struct("CredentialVerifier")
            .field("memory_kib", &params.m_cost())
            .field("iterations", &params.t_cost())
            .field("parallelism", &params.p_cost())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new(&PasswordPolicy::low_cost()).unwrap()
    }

    #[test]
    fn derive_is_salted() {
        let verifier = verifier();
        let a = verifier.derive("hunter22").unwrap();
        let b = verifier.derive("hunter22").unwrap();

        assert_ne!(a, b);
        assert!(a.as_str().starts_with("$argon2id$"));
        assert!(verifier.verify("hunter22", &a).unwrap());
        assert!(verifier.verify("hunter22", &b).unwrap());
    }

    #[test]
    fn mismatch_is_a_normal_negative_outcome() {
        let verifier = verifier();
        let proof = verifier.derive("correct horse").unwrap();

        assert!(!verifier.verify("battery staple", &proof).unwrap());
        assert!(!verifier.verify("", &proof).unwrap());
    }

    #[test]
    fn corrupt_proof_is_an_integrity_error() {
        let verifier = verifier();
        let err = verifier
            .verify("anything", &PasswordProof::from_phc("plaintext-password"))
            .unwrap_err();

        assert!(matches!(err, AuthError::CorruptProof(_)));
    }

    #[test]
    fn proofs_verify_across_policies() {
        let proof = verifier().derive("portable").unwrap();
        let default_verifier = CredentialVerifier::default();

        assert!(default_verifier.verify("portable", &proof).unwrap());
    }

    #[test]
    fn rejects_unusable_parameters() {
        let policy = PasswordPolicy {
            memory_kib: 1,
            ..PasswordPolicy::low_cost()
        };

        assert!(matches!(
            CredentialVerifier::new(&policy),
            Err(AuthError::Config { .. })
        ));
    }

    #[test]
    fn debug_does_not_leak_proof() {
        let proof = verifier().derive("s3cret").unwrap();
        assert_eq!(format!("{:?}", proof), "PasswordProof(<redacted>)");
    }
}
