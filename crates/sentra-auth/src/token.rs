//! JWT issuance and verification, plus persistence of the revocable token
//! types.
//!
//! ACCESS and VERIFY_MFA tokens are short-lived bearer tokens trusted on
//! signature and expiry alone; REFRESH, RESET_PASSWORD, and VERIFY_EMAIL are
//! longer-lived or single-use and additionally require a live store row.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sentra_core::StoreError;
use sentra_core::models::token::{CreateTokenRecord, TokenRecord, TokenType};
use sentra_core::models::user::User;
use sentra_core::repository::TokenRepository;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// JWT claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Purpose of the token.
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// A signed token together with its expiry, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct TokenWithExpiry {
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// ACCESS + REFRESH pair issued on successful authentication.
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokenPair {
    pub access: TokenWithExpiry,
    pub refresh: TokenWithExpiry,
}

/// Sign a token for `user_id` with the global secret.
pub fn sign_token(
    user_id: Uuid,
    expires: DateTime<Utc>,
    token_type: TokenType,
    config: &AuthConfig,
) -> AuthResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        iat: Utc::now().timestamp(),
        exp: expires.timestamp(),
        token_type,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Jwt(format!("JWT encode: {e}")))
}

/// Decode a token, verifying signature and expiry, and return its claims.
pub fn decode_token(token: &str, config: &AuthConfig) -> AuthResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["sub", "exp", "iat"]);

    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AuthError::Jwt(e.to_string()))
}

fn parse_subject(sub: &str) -> AuthResult<Uuid> {
    Uuid::parse_str(sub).map_err(|e| AuthError::Jwt(format!("bad subject: {e}")))
}

/// Token issuance and verification against the store.
///
/// Generic over the repository implementation so the auth layer has no
/// dependency on the storage crate.
#[derive(Clone)]
pub struct TokenService<T: TokenRepository> {
    repo: T,
    config: AuthConfig,
}

impl<T: TokenRepository> TokenService<T> {
    pub fn new(repo: T, config: AuthConfig) -> Self {
        Self { repo, config }
    }

    /// Issue a token, persisting a row for the revocable types.
    async fn issue(
        &self,
        user_id: Uuid,
        expires: DateTime<Utc>,
        token_type: TokenType,
    ) -> AuthResult<String> {
        let token = sign_token(user_id, expires, token_type, &self.config)?;
        if token_type.is_persisted() {
            self.repo
                .create(CreateTokenRecord {
                    token: token.clone(),
                    user_id,
                    token_type,
                    expires,
                    blacklisted: false,
                })
                .await?;
        }
        Ok(token)
    }

    /// Verify signature and expiry, then require a matching non-blacklisted
    /// store row for `(token, type, subject)`.
    ///
    /// Returns the row; deleting or mutating it is the caller's
    /// responsibility.
    pub async fn verify(&self, token: &str, token_type: TokenType) -> AuthResult<TokenRecord> {
        let claims = decode_token(token, &self.config)?;
        if claims.token_type != token_type {
            return Err(AuthError::TokenNotFound);
        }
        let user_id = parse_subject(&claims.sub)?;

        self.repo
            .find(token, token_type, user_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => AuthError::TokenNotFound,
                other => other.into(),
            })
    }

    /// Verify like [`TokenService::verify`] but remove the row in the same
    /// store operation, so the token is consumed at most once even under
    /// concurrent duplicate submission.
    pub async fn consume(&self, token: &str, token_type: TokenType) -> AuthResult<TokenRecord> {
        let claims = decode_token(token, &self.config)?;
        if claims.token_type != token_type {
            return Err(AuthError::TokenNotFound);
        }
        let user_id = parse_subject(&claims.sub)?;

        let record = self
            .repo
            .take(token, token_type)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => AuthError::TokenNotFound,
                other => other.into(),
            })?;
        if record.user_id != user_id {
            return Err(AuthError::TokenNotFound);
        }
        Ok(record)
    }

    /// Remove the row for a raw token string without checking its signature;
    /// logout accepts tokens the clock has already expired.
    pub async fn revoke(&self, token: &str, token_type: TokenType) -> AuthResult<TokenRecord> {
        self.repo.take(token, token_type).await.map_err(|e| match e {
            StoreError::NotFound { .. } => AuthError::TokenNotFound,
            other => other.into(),
        })
    }

    /// Delete every persisted row of one type for a user.
    pub async fn delete_for_user(&self, user_id: Uuid, token_type: TokenType) -> AuthResult<u64> {
        self.repo
            .delete_for_user(user_id, token_type)
            .await
            .map_err(Into::into)
    }

    /// ACCESS + REFRESH pair; only the refresh half gets a store row.
    pub async fn generate_auth_tokens(&self, user: &User) -> AuthResult<AuthTokenPair> {
        let access_expires = Utc::now() + Duration::minutes(self.config.access_expiration_minutes);
        let access = sign_token(user.id, access_expires, TokenType::Access, &self.config)?;

        let refresh_expires = Utc::now() + Duration::days(self.config.refresh_expiration_days);
        let refresh = self
            .issue(user.id, refresh_expires, TokenType::Refresh)
            .await?;

        Ok(AuthTokenPair {
            access: TokenWithExpiry {
                token: access,
                expires: access_expires,
            },
            refresh: TokenWithExpiry {
                token: refresh,
                expires: refresh_expires,
            },
        })
    }

    /// Short-lived MFA challenge, signed only — never stored.
    pub async fn generate_verify_mfa_token(&self, user: &User) -> AuthResult<TokenWithExpiry> {
        let expires = Utc::now() + Duration::minutes(self.config.verify_mfa_expiration_minutes);
        let token = sign_token(user.id, expires, TokenType::VerifyMfa, &self.config)?;
        Ok(TokenWithExpiry { token, expires })
    }

    /// Single-use reset-password token. Outstanding reset rows for the user
    /// are dropped first so only the newest link stays live.
    pub async fn generate_reset_password_token(&self, user: &User) -> AuthResult<String> {
        self.delete_for_user(user.id, TokenType::ResetPassword)
            .await?;
        let expires =
            Utc::now() + Duration::minutes(self.config.reset_password_expiration_minutes);
        self.issue(user.id, expires, TokenType::ResetPassword).await
    }

    /// Single-use verify-email token; same newest-wins rule.
    pub async fn generate_verify_email_token(&self, user: &User) -> AuthResult<String> {
        self.delete_for_user(user.id, TokenType::VerifyEmail).await?;
        let expires = Utc::now() + Duration::minutes(self.config.verify_email_expiration_minutes);
        self.issue(user.id, expires, TokenType::VerifyEmail).await
    }
}
