//! Shared setup for the service integration tests.

#![allow(dead_code)]

use sentra_auth::config::{AuthConfig, MfaCipherConfig};
use sentra_auth::mfa::MfaService;
use sentra_auth::service::{AuthService, RegisterInput};
use sentra_auth::token::TokenService;
use sentra_core::models::user::User;
use sentra_store::MemoryStore;
use totp_rs::{Algorithm, Secret, TOTP};

pub fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-jwt-secret".into(),
        mfa_cipher: MfaCipherConfig {
            passphrase: "test-mfa-passphrase".into(),
            ..MfaCipherConfig::default()
        },
        ..AuthConfig::default()
    }
}

pub struct TestEnv {
    pub store: MemoryStore,
    pub auth: AuthService<MemoryStore, MemoryStore>,
    pub mfa: MfaService<MemoryStore, MemoryStore>,
    pub tokens: TokenService<MemoryStore>,
}

pub fn build(config: AuthConfig) -> TestEnv {
    let store = MemoryStore::new();
    let tokens = TokenService::new(store.clone(), config.clone());
    let auth = AuthService::new(store.clone(), tokens.clone(), config.clone());
    let mfa = MfaService::new(store.clone(), tokens.clone(), config).unwrap();
    TestEnv {
        store,
        auth,
        mfa,
        tokens,
    }
}

pub fn setup() -> TestEnv {
    build(test_config())
}

pub async fn register_alice(env: &TestEnv) -> User {
    env.auth
        .register(RegisterInput {
            email: "alice@example.com".into(),
            username: Some("alice".into()),
            password: "password1".into(),
            first_name: None,
            last_name: None,
            company: None,
        })
        .await
        .unwrap()
}

/// Current TOTP code for a base32 seed, the way an authenticator app would
/// compute it.
pub fn totp_code(seed_base32: &str) -> String {
    let secret = Secret::Encoded(seed_base32.to_string()).to_bytes().unwrap();
    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret,
        Some("Sentra".into()),
        "alice@example.com".into(),
    )
    .unwrap()
    .generate_current()
    .unwrap()
}
