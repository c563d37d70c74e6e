//! Role-based gating for requests that already passed authentication

use crate::error::{AuthError, AuthResult};
use crate::identity::Role;
use crate::token::SessionClaims;

/// Admit `claims` only if they carry `expected`.
///
/// No claims means the request never authenticated (`Unauthorized`);
/// the wrong role means it did but may not proceed (`Forbidden`).
pub fn require_role(claims: Option<&SessionClaims>, expected: Role) -> AuthResult<&SessionClaims> {
    let claims = claims.ok_or(AuthError::Unauthorized)?;

    if claims.role != expected {
        return Err(AuthError::Forbidden { required: expected });
    }

    Ok(claims)
}

/// Reusable, composable form of [`require_role`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGuard {
    required: Role,
}

impl RoleGuard {
    pub fn new(required: Role) -> Self {
        Self { required }
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }

    pub fn check<'a>(&self, claims: Option<&'a SessionClaims>) -> AuthResult<&'a SessionClaims> {
        require_role(claims, self.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UserId;

    fn claims(role: Role) -> SessionClaims {
        SessionClaims {
            subject: UserId::new(),
            email: "someone@x.com".to_string(),
            role,
            issued_at: 1_700_000_000,
            expires_at: 1_700_003_600,
        }
    }

    #[test]
    fn missing_claims_are_unauthorized() {
        assert!(matches!(
            require_role(None, Role::User),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn wrong_role_is_forbidden() {
        let user = claims(Role::User);
        let err = RoleGuard::admin().check(Some(&user)).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { required: Role::Admin }));
    }

    #[test]
    fn matching_role_is_admitted() {
        let admin = claims(Role::Admin);
        let admitted = RoleGuard::admin().check(Some(&admin)).unwrap();
        assert_eq!(admitted, &admin);

        let user = claims(Role::User);
        assert!(RoleGuard::new(Role::User).check(Some(&user)).is_ok());
    }
}
