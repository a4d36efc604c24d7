//! Integration tests for the authentication service.

mod common;

use std::mem::discriminant;

use common::{build, register_alice, setup, test_config};
use sentra_auth::config::AuthConfig;
use sentra_auth::error::AuthError;
use sentra_auth::service::IssuedTokens;
use sentra_auth::token;
use sentra_core::models::token::TokenType;
use sentra_core::repository::{FederatedCredentialRepository, UserRepository};

#[tokio::test]
async fn register_and_login_happy_path() {
    let env = setup();
    let user = register_alice(&env).await;
    assert_eq!(user.email, "alice@example.com");
    assert!(!user.mfa_enabled);

    let out = env
        .auth
        .login_with_password("alice@example.com", "password1")
        .await
        .unwrap();

    let IssuedTokens::Auth(pair) = out.tokens else {
        panic!("expected a full token pair");
    };

    let claims = token::decode_token(&pair.access.token, &test_config()).unwrap();
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.token_type, TokenType::Access);

    let refresh_claims = token::decode_token(&pair.refresh.token, &test_config()).unwrap();
    assert_eq!(refresh_claims.token_type, TokenType::Refresh);
}

#[tokio::test]
async fn login_email_is_case_insensitive() {
    let env = setup();
    register_alice(&env).await;

    let result = env
        .auth
        .login_with_password("ALICE@example.com", "password1")
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_yield_the_same_kind() {
    let env = setup();
    register_alice(&env).await;

    let wrong_password = env
        .auth
        .login_with_password("alice@example.com", "wrong-password")
        .await
        .unwrap_err();
    let unknown_email = env
        .auth
        .login_with_password("nobody@example.com", "password1")
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidEmailOrPassword));
    assert_eq!(
        discriminant(&wrong_password),
        discriminant(&unknown_email),
        "credential failures must not reveal which part was wrong"
    );
}

#[tokio::test]
async fn username_login_when_enabled() {
    let env = build(AuthConfig {
        allow_username_login: true,
        ..test_config()
    });
    register_alice(&env).await;

    assert!(
        env.auth
            .login_with_password("alice", "password1")
            .await
            .is_ok()
    );

    let err = env
        .auth
        .login_with_password("alice", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidLoginOrPassword));
}

#[tokio::test]
async fn username_login_rejected_when_disabled() {
    let env = setup();
    register_alice(&env).await;

    let err = env
        .auth
        .login_with_password("alice", "password1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidEmailOrPassword));
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let env = setup();
    register_alice(&env).await;

    let err = env
        .auth
        .register(sentra_auth::service::RegisterInput {
            email: "Alice@Example.com".into(),
            username: None,
            password: "password2".into(),
            first_name: None,
            last_name: None,
            company: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));

    let err = env
        .auth
        .register(sentra_auth::service::RegisterInput {
            email: "bob@example.com".into(),
            username: Some("alice".into()),
            password: "password2".into(),
            first_name: None,
            last_name: None,
            company: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UsernameTaken));
}

#[tokio::test]
async fn logout_deletes_the_refresh_row() {
    let env = setup();
    register_alice(&env).await;

    let out = env
        .auth
        .login_with_password("alice@example.com", "password1")
        .await
        .unwrap();
    let IssuedTokens::Auth(pair) = out.tokens else {
        panic!("expected a full pair");
    };

    env.auth.logout(&pair.refresh.token).await.unwrap();

    // Second logout finds nothing: revocation was deletion.
    let err = env.auth.logout(&pair.refresh.token).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenNotFound));

    // And the rotated-away token cannot refresh.
    let err = env.auth.refresh_auth(&pair.refresh.token).await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshTokenInvalid));
}

#[tokio::test]
async fn refresh_rotates_and_replay_fails() {
    let env = setup();
    register_alice(&env).await;

    let out = env
        .auth
        .login_with_password("alice@example.com", "password1")
        .await
        .unwrap();
    let IssuedTokens::Auth(first) = out.tokens else {
        panic!("expected a full pair");
    };

    let second = env.auth.refresh_auth(&first.refresh.token).await.unwrap();
    assert_ne!(second.refresh.token, first.refresh.token);

    // The consumed token is gone; replay collapses to one kind.
    let err = env.auth.refresh_auth(&first.refresh.token).await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshTokenInvalid));

    // The rotated-in token still works.
    assert!(env.auth.refresh_auth(&second.refresh.token).await.is_ok());
}

#[tokio::test]
async fn refresh_rejects_foreign_token_types() {
    let env = setup();
    register_alice(&env).await;

    let out = env
        .auth
        .login_with_password("alice@example.com", "password1")
        .await
        .unwrap();
    let IssuedTokens::Auth(pair) = out.tokens else {
        panic!("expected a full pair");
    };

    // An access token is not a refresh token, and garbage is garbage; both
    // collapse to the same kind.
    let err = env.auth.refresh_auth(&pair.access.token).await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshTokenInvalid));

    let err = env.auth.refresh_auth("totally-bogus").await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshTokenInvalid));
}

#[tokio::test]
async fn forgot_password_is_silent_for_unknown_emails_by_default() {
    let env = setup();
    register_alice(&env).await;

    let result = env
        .auth
        .generate_reset_password_token("nobody@example.com")
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn forgot_password_reveals_unknown_emails_when_configured() {
    let env = build(AuthConfig {
        reveal_unknown_reset_email: true,
        ..test_config()
    });
    register_alice(&env).await;

    let err = env
        .auth
        .generate_reset_password_token("nobody@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ResetPasswordInvalidEmail));
}

#[tokio::test]
async fn reset_password_overwrites_the_hash() {
    let env = setup();
    register_alice(&env).await;

    let reset_token = env
        .auth
        .generate_reset_password_token("alice@example.com")
        .await
        .unwrap()
        .expect("known email yields a token");

    env.auth
        .reset_password(&reset_token, "brand-new-pass1")
        .await
        .unwrap();

    assert!(
        env.auth
            .login_with_password("alice@example.com", "brand-new-pass1")
            .await
            .is_ok()
    );
    assert!(
        env.auth
            .login_with_password("alice@example.com", "password1")
            .await
            .is_err()
    );

    // The consumed link is dead.
    let err = env
        .auth
        .reset_password(&reset_token, "yet-another-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ResetPasswordFailed));
}

#[tokio::test]
async fn only_the_newest_reset_link_is_live() {
    let env = setup();
    register_alice(&env).await;

    let first = env
        .auth
        .generate_reset_password_token("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    let second = env
        .auth
        .generate_reset_password_token("alice@example.com")
        .await
        .unwrap()
        .unwrap();

    // Issuing the second invalidated the first.
    let err = env
        .auth
        .reset_password(&first, "new-password1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ResetPasswordFailed));

    assert!(env.auth.reset_password(&second, "new-password1").await.is_ok());
}

#[tokio::test]
async fn verify_email_sets_the_flag_once() {
    let env = setup();
    let user = register_alice(&env).await;
    assert!(!user.is_email_verified);

    let verify_token = env.auth.generate_verify_email_token(&user).await.unwrap();
    env.auth.verify_email(&verify_token).await.unwrap();

    let user = env.store.get_by_id(user.id).await.unwrap();
    assert!(user.is_email_verified);

    let err = env.auth.verify_email(&verify_token).await.unwrap_err();
    assert!(matches!(err, AuthError::EmailVerificationFailed));
}

#[tokio::test]
async fn authenticate_accepts_only_access_tokens() {
    let env = setup();
    let user = register_alice(&env).await;

    let out = env
        .auth
        .login_with_password("alice@example.com", "password1")
        .await
        .unwrap();
    let IssuedTokens::Auth(pair) = out.tokens else {
        panic!("expected a full pair");
    };

    let resolved = env.auth.authenticate(&pair.access.token).await.unwrap();
    assert_eq!(resolved.id, user.id);

    let err = env.auth.authenticate(&pair.refresh.token).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));

    let err = env.auth.authenticate("nonsense").await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn federated_login_creates_once_and_reuses() {
    let env = setup();

    let first = env
        .auth
        .login_federated(&env.store, "facebook", "fb-42", "carol@example.com")
        .await
        .unwrap();
    let second = env
        .auth
        .login_federated(&env.store, "facebook", "fb-42", "carol@example.com")
        .await
        .unwrap();
    assert_eq!(first.user.id, second.user.id);

    let link = FederatedCredentialRepository::find(&env.store, "facebook", "fb-42")
        .await
        .unwrap();
    assert_eq!(link.user_id, first.user.id);
}

#[tokio::test]
async fn federated_login_rejects_locally_registered_emails() {
    let env = setup();
    register_alice(&env).await;

    let err = env
        .auth
        .login_federated(&env.store, "facebook", "fb-7", "alice@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
}

#[tokio::test]
async fn delete_account_revokes_outstanding_tokens() {
    let env = setup();
    let user = register_alice(&env).await;

    let out = env
        .auth
        .login_with_password("alice@example.com", "password1")
        .await
        .unwrap();
    let IssuedTokens::Auth(pair) = out.tokens else {
        panic!("expected a full pair");
    };

    env.auth.delete_account(user.id).await.unwrap();

    assert!(env.store.get_by_id(user.id).await.is_err());
    let err = env.auth.refresh_auth(&pair.refresh.token).await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshTokenInvalid));
}
