//! MFA service — TOTP enrollment, verification, and disable transitions.
//!
//! Per-user states: OFF (`mfa_enabled` false, no secret) → PENDING (secret
//! stored encrypted, `mfa_enabled` still false) → ON (`mfa_enabled` true).
//! Verification is dual purpose: an ACCESS token confirms a pending
//! enrollment, a VERIFY_MFA token completes a login.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use sentra_core::models::token::TokenType;
use sentra_core::models::user::{UpdateUser, User};
use sentra_core::repository::{TokenRepository, UserRepository};

use crate::cipher::SecretCipher;
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::token::{self, AuthTokenPair, TokenService};
use crate::totp;

/// Result of a TOTP enrollment. The plaintext seed leaves the service here
/// and nowhere else.
#[derive(Debug, Clone, Serialize)]
pub struct MfaEnrollment {
    /// Base32 seed for manual entry.
    #[serde(rename = "mfaSecret")]
    pub mfa_secret: String,
    /// otpauth:// URI for QR provisioning.
    pub otpauth: String,
}

/// Outcome of an MFA code verification.
#[derive(Debug)]
pub enum MfaVerification {
    /// A VERIFY_MFA challenge was completed; login finishes with full
    /// tokens.
    LoginCompleted { user: User, tokens: AuthTokenPair },
    /// An ACCESS-token holder confirmed enrollment; nothing to return.
    EnrollmentConfirmed,
}

pub struct MfaService<U: UserRepository, T: TokenRepository> {
    users: U,
    tokens: TokenService<T>,
    cipher: SecretCipher,
    config: AuthConfig,
}

impl<U: UserRepository, T: TokenRepository> MfaService<U, T> {
    /// Build the service, deriving the seed-encryption key once up front.
    pub fn new(users: U, tokens: TokenService<T>, config: AuthConfig) -> AuthResult<Self> {
        let cipher = SecretCipher::new(&config.mfa_cipher)?;
        Ok(Self {
            users,
            tokens,
            cipher,
            config,
        })
    }

    /// Decode a bearer token and require one of `allowed` types.
    fn claims_of(&self, bearer: &str, allowed: &[TokenType]) -> AuthResult<(Uuid, TokenType)> {
        let claims =
            token::decode_token(bearer, &self.config).map_err(|_| AuthError::Unauthorized)?;
        if !allowed.contains(&claims.token_type) {
            return Err(AuthError::Unauthorized);
        }
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Unauthorized)?;
        Ok((user_id, claims.token_type))
    }

    fn check_code(&self, email: &str, encrypted: &str, code: &str) -> AuthResult<()> {
        let seed = self.cipher.decrypt(encrypted)?;
        if !totp::check_code(&seed, code, &self.config.mfa_service_name, email)? {
            return Err(AuthError::InvalidMfaCode);
        }
        Ok(())
    }

    /// Enroll: generate a seed, store it encrypted, hand the plaintext back
    /// exactly once. The account stays PENDING until a code is verified.
    pub async fn enable_totp(&self, access_token: &str) -> AuthResult<MfaEnrollment> {
        self.try_enable_totp(access_token)
            .await
            .map_err(|e| e.or_domain(AuthError::Unknown))
    }

    async fn try_enable_totp(&self, access_token: &str) -> AuthResult<MfaEnrollment> {
        let (user_id, _) = self.claims_of(access_token, &[TokenType::Access])?;
        let user = self.users.get_by_id(user_id).await?;

        if user.mfa_enabled {
            return Err(AuthError::MfaAlreadyEnabled);
        }

        let seed = totp::generate_seed();
        let encrypted = self.cipher.encrypt(&seed)?;
        self.users
            .update(
                user.id,
                UpdateUser {
                    mfa_secret: Some(Some(encrypted)),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %user.id, "TOTP enrollment started");

        let otpauth = totp::provisioning_uri(&seed, &self.config.mfa_service_name, &user.email)?;
        Ok(MfaEnrollment {
            mfa_secret: seed,
            otpauth,
        })
    }

    /// Verify a submitted code. PENDING flips to ON on first success; a
    /// VERIFY_MFA bearer additionally gets the full token pair.
    pub async fn verify_login(&self, bearer: &str, code: &str) -> AuthResult<MfaVerification> {
        self.try_verify_login(bearer, code)
            .await
            .map_err(|e| e.or_domain(AuthError::Unknown))
    }

    async fn try_verify_login(&self, bearer: &str, code: &str) -> AuthResult<MfaVerification> {
        let (user_id, token_type) =
            self.claims_of(bearer, &[TokenType::Access, TokenType::VerifyMfa])?;
        let user = self.users.get_by_id(user_id).await?;

        let Some(encrypted) = user.mfa_secret.as_deref() else {
            return Err(AuthError::MfaNotEnabled);
        };
        self.check_code(&user.email, encrypted, code)?;

        let user = if user.mfa_enabled {
            user
        } else {
            let updated = self
                .users
                .update(
                    user.id,
                    UpdateUser {
                        mfa_enabled: Some(true),
                        ..Default::default()
                    },
                )
                .await?;
            info!(user_id = %updated.id, "TOTP MFA enabled");
            updated
        };

        if token_type == TokenType::VerifyMfa {
            let tokens = self.tokens.generate_auth_tokens(&user).await?;
            Ok(MfaVerification::LoginCompleted { user, tokens })
        } else {
            Ok(MfaVerification::EnrollmentConfirmed)
        }
    }

    /// Disable: requires the holder's current code; clears the encrypted
    /// seed and returns the account to OFF.
    pub async fn disable(&self, access_token: &str, code: &str) -> AuthResult<()> {
        self.try_disable(access_token, code)
            .await
            .map_err(|e| e.or_domain(AuthError::MfaDisableFailed))
    }

    async fn try_disable(&self, access_token: &str, code: &str) -> AuthResult<()> {
        let (user_id, _) = self.claims_of(access_token, &[TokenType::Access])?;
        let user = self.users.get_by_id(user_id).await?;

        let Some(encrypted) = user.mfa_secret.as_deref() else {
            return Err(AuthError::MfaNotEnabled);
        };
        if !user.mfa_enabled {
            return Err(AuthError::MfaNotEnabled);
        }
        self.check_code(&user.email, encrypted, code)?;

        self.users
            .update(
                user.id,
                UpdateUser {
                    mfa_enabled: Some(false),
                    mfa_secret: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        info!(user_id = %user.id, "TOTP MFA disabled");
        Ok(())
    }
}
