//! End-to-end session flows through the public API

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tollgate_core::{
    AuthConfig, AuthError, Clock, CredentialStore, ErrorKind, IdentityService, ManualClock,
    MemoryCredentialStore, PasswordPolicy, RefreshPolicy, Role, RoleGuard, SessionGate,
    SigningSecret, TokenCodec, TokenError,
};

const TTL_SECS: u64 = 900;

struct Harness {
    gate: SessionGate,
    identities: IdentityService,
    clock: Arc<ManualClock>,
}

fn harness(policy: RefreshPolicy) -> Harness {
    let mut config = AuthConfig::new(SigningSecret::from(
        "integration-secret-integration-secret".to_string(),
    ));
    config.token_ttl_secs = TTL_SECS;
    config.refresh_window_secs = 7 * 24 * 3600;
    config.refresh_policy = policy;
    config.password = PasswordPolicy::low_cost();

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap(),
    ));

    let gate = SessionGate::new(&config, store.clone())
        .unwrap()
        .with_clock(clock.clone());
    let identities = IdentityService::from_config(&config, store).unwrap();

    Harness {
        gate,
        identities,
        clock,
    }
}

/// Change one character in the middle of the signature. Every bit of a
/// middle base64url character is significant, unlike the last one.
fn flip_signature_char(token: &str) -> String {
    let (signed, signature) = token.rsplit_once('.').unwrap();
    let mut chars: Vec<char> = signature.chars().collect();
    let mid = chars.len() / 2;
    chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
    format!("{}.{}", signed, chars.into_iter().collect::<String>())
}

#[tokio::test]
async fn test_alice_session_lifecycle() {
    let h = harness(RefreshPolicy::Snapshot);
    let alice = h
        .identities
        .create("alice@x.com", "secret1", "Alice")
        .await
        .unwrap();

    let issued = h.gate.login("alice@x.com", "secret1").await.unwrap();
    let claims = h.gate.authenticate(&issued.token).unwrap();
    assert_eq!(claims.subject, alice.id);
    assert_eq!(claims.email, alice.email);
    assert_eq!(claims.role, alice.role);

    h.clock.advance(Duration::seconds(TTL_SECS as i64 + 1));
    assert!(matches!(
        h.gate.authenticate(&issued.token),
        Err(AuthError::Unauthorized)
    ));

    let refreshed = h.gate.refresh_token(&issued.token).await.unwrap();
    assert!(refreshed.expires_at > issued.expires_at);

    let renewed = h.gate.authenticate(&refreshed.token).unwrap();
    assert_eq!(renewed.snapshot(), claims.snapshot());
}

#[tokio::test]
async fn test_login_failures_share_one_kind() {
    let h = harness(RefreshPolicy::Snapshot);
    h.identities
        .create("bob@x.com", "correct-horse", "Bob")
        .await
        .unwrap();

    for (email, password) in [
        ("bob@x.com", "wrong-horse"),
        ("bob@x.com", ""),
        ("nobody@x.com", "correct-horse"),
    ] {
        let err = h.gate.login(email, password).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential), "{}", email);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.code(), "invalid_credentials");
    }
}

#[tokio::test]
async fn test_deactivation_keeps_issued_tokens_but_blocks_login() {
    let h = harness(RefreshPolicy::Snapshot);
    let carol = h
        .identities
        .create("carol@x.com", "secret1", "Carol")
        .await
        .unwrap();
    let issued = h.gate.login("carol@x.com", "secret1").await.unwrap();

    h.identities.set_active(carol.id, false).await.unwrap();

    assert!(h.gate.authenticate(&issued.token).is_ok());
    assert!(matches!(
        h.gate.login("carol@x.com", "secret1").await,
        Err(AuthError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_foreign_and_tampered_tokens_never_refresh() {
    let h = harness(RefreshPolicy::Snapshot);
    h.identities
        .create("dave@x.com", "secret1", "Dave")
        .await
        .unwrap();
    let issued = h.gate.login("dave@x.com", "secret1").await.unwrap();

    let foreign = TokenCodec::new(&SigningSecret::from("someone-else".to_string()));
    let claims = h.gate.authenticate(&issued.token).unwrap();
    let (forged, _) = foreign
        .issue(&claims.snapshot(), h.clock.now(), Duration::hours(1))
        .unwrap();

    assert!(matches!(
        h.gate.refresh_token(&forged).await,
        Err(AuthError::InvalidToken(TokenError::InvalidSignature))
    ));

    let tampered = flip_signature_char(&issued.token);
    assert!(matches!(
        h.gate.refresh_token(&tampered).await,
        Err(AuthError::InvalidToken(TokenError::InvalidSignature))
    ));
}

#[tokio::test]
async fn test_role_guard_after_promotion() {
    let h = harness(RefreshPolicy::Snapshot);
    let erin = h
        .identities
        .create("erin@x.com", "secret1", "Erin")
        .await
        .unwrap();

    let user_token = h.gate.login("erin@x.com", "secret1").await.unwrap();
    let user_claims = h.gate.authenticate(&user_token.token).unwrap();
    let err = RoleGuard::admin().check(Some(&user_claims)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    h.identities.update_role(erin.id, "admin").await.unwrap();

    let admin_token = h.gate.login("erin@x.com", "secret1").await.unwrap();
    let admin_claims = h.gate.authenticate(&admin_token.token).unwrap();
    assert_eq!(admin_claims.role, Role::Admin);
    assert!(RoleGuard::admin().check(Some(&admin_claims)).is_ok());
}

#[tokio::test]
async fn test_revalidating_refresh_drops_revoked_privileges() {
    let h = harness(RefreshPolicy::Revalidate);
    let frank = h
        .identities
        .create("frank@x.com", "secret1", "Frank")
        .await
        .unwrap();
    h.identities.update_role(frank.id, "admin").await.unwrap();
    let issued = h.gate.login("frank@x.com", "secret1").await.unwrap();

    h.identities.update_role(frank.id, "user").await.unwrap();
    h.clock.advance(Duration::seconds(60));

    let refreshed = h.gate.refresh_token(&issued.token).await.unwrap();
    let claims = h.gate.authenticate(&refreshed.token).unwrap();
    assert_eq!(claims.role, Role::User);
}

#[tokio::test]
async fn test_changed_password_takes_effect_on_next_login() {
    let h = harness(RefreshPolicy::Snapshot);
    let grace = h
        .identities
        .create("grace@x.com", "secret1", "Grace")
        .await
        .unwrap();

    h.identities
        .change_password(grace.id, "secret1", "secret2")
        .await
        .unwrap();

    assert!(matches!(
        h.gate.login("grace@x.com", "secret1").await,
        Err(AuthError::InvalidCredential)
    ));
    assert!(h.gate.login("grace@x.com", "secret2").await.is_ok());
}
