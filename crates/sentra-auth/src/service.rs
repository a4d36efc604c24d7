//! Authentication service — registration, login, logout, token rotation,
//! password reset, and email verification.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use sentra_core::StoreError;
use sentra_core::models::token::TokenType;
use sentra_core::models::user::{CreateUser, UpdateUser, User, UserRole};
use sentra_core::repository::{FederatedCredentialRepository, TokenRepository, UserRepository};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::password;
use crate::token::{self, AuthTokenPair, TokenService, TokenWithExpiry};

/// Input for the registration flow.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
}

/// Tokens returned from a credential check: the full pair, or only an MFA
/// challenge when the account has MFA enabled.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum IssuedTokens {
    Auth(AuthTokenPair),
    MfaChallenge {
        #[serde(rename = "verifyMfa")]
        verify_mfa: TokenWithExpiry,
    },
}

/// Successful login result.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutput {
    pub user: User,
    pub tokens: IssuedTokens,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer has no
/// dependency on the storage crate.
pub struct AuthService<U: UserRepository, T: TokenRepository> {
    users: U,
    tokens: TokenService<T>,
    config: AuthConfig,
}

impl<U: UserRepository, T: TokenRepository> AuthService<U, T> {
    pub fn new(users: U, tokens: TokenService<T>, config: AuthConfig) -> Self {
        Self {
            users,
            tokens,
            config,
        }
    }

    /// The generic credential failure for the configured login mode. Neither
    /// message reveals whether the identifier or the password was wrong.
    fn invalid_credentials(&self) -> AuthError {
        if self.config.allow_username_login {
            AuthError::InvalidLoginOrPassword
        } else {
            AuthError::InvalidEmailOrPassword
        }
    }

    /// Issue tokens for a checked user: a full pair, or only a VERIFY_MFA
    /// challenge when the account requires a second factor.
    async fn issue_login_tokens(&self, user: &User) -> AuthResult<IssuedTokens> {
        if user.mfa_enabled {
            let challenge = self.tokens.generate_verify_mfa_token(user).await?;
            Ok(IssuedTokens::MfaChallenge {
                verify_mfa: challenge,
            })
        } else {
            Ok(IssuedTokens::Auth(
                self.tokens.generate_auth_tokens(user).await?,
            ))
        }
    }

    /// Register a new account. Email and username must be unique.
    pub async fn register(&self, input: RegisterInput) -> AuthResult<User> {
        let email = input.email.to_lowercase();
        if self.users.email_taken(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let username = match input.username {
            Some(name) if self.config.append_uuid_to_usernames => {
                let suffix = Uuid::new_v4().simple().to_string();
                Some(format!("{name}_{}", &suffix[..8]))
            }
            other => other,
        };
        if let Some(name) = &username {
            if self.users.username_taken(name).await? {
                return Err(AuthError::UsernameTaken);
            }
        }

        let password_hash = password::hash_password(&input.password)?;
        let user = self
            .users
            .create(CreateUser {
                email,
                username,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                company: input.company,
                role: UserRole::User,
            })
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists { .. } => AuthError::EmailTaken,
                other => other.into(),
            })?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Validate credentials and issue tokens.
    ///
    /// The identifier is an email, or an email-or-username when username
    /// login is enabled.
    pub async fn login_with_password(
        &self,
        identifier: &str,
        password: &str,
    ) -> AuthResult<LoginOutput> {
        let lookup = if self.config.allow_username_login {
            self.users.get_by_email_or_username(identifier).await
        } else {
            self.users.get_by_email(identifier).await
        };

        let user = match lookup {
            Ok(user) => user,
            Err(StoreError::NotFound { .. }) => return Err(self.invalid_credentials()),
            Err(e) => return Err(e.into()),
        };

        if !password::verify_password(password, &user.password_hash)? {
            return Err(self.invalid_credentials());
        }

        let tokens = self.issue_login_tokens(&user).await?;
        info!(user_id = %user.id, mfa = user.mfa_enabled, "password login");
        Ok(LoginOutput { user, tokens })
    }

    /// Federated login decision point: reuse the linked account, or create
    /// user + credential link in one atomic store operation.
    ///
    /// An email already registered with a different authentication method is
    /// rejected rather than silently linked.
    pub async fn login_federated<F: FederatedCredentialRepository>(
        &self,
        credentials: &F,
        provider: &str,
        federated_id: &str,
        email: &str,
    ) -> AuthResult<LoginOutput> {
        let user = match credentials.find(provider, federated_id).await {
            Ok(link) => self.users.get_by_id(link.user_id).await?,
            Err(StoreError::NotFound { .. }) => {
                let email = email.to_lowercase();
                if self.users.email_taken(&email).await? {
                    return Err(AuthError::EmailTaken);
                }

                // Provider-created accounts get no usable password.
                let password_hash = password::hash_password(&Uuid::new_v4().to_string())?;
                let user = credentials
                    .create_with_user(
                        CreateUser {
                            email,
                            username: None,
                            password_hash,
                            first_name: None,
                            last_name: None,
                            company: None,
                            role: UserRole::User,
                        },
                        provider,
                        federated_id,
                    )
                    .await?;
                info!(user_id = %user.id, provider, "federated account created");
                user
            }
            Err(e) => return Err(e.into()),
        };

        let tokens = self.issue_login_tokens(&user).await?;
        Ok(LoginOutput { user, tokens })
    }

    /// Logout: revocation is deletion of the refresh row, not flagging.
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<()> {
        self.tokens
            .revoke(refresh_token, TokenType::Refresh)
            .await?;
        Ok(())
    }

    /// Rotate: consume the presented refresh token and issue a fresh pair.
    /// Every failure in the chain collapses to one kind.
    pub async fn refresh_auth(&self, refresh_token: &str) -> AuthResult<AuthTokenPair> {
        self.try_refresh(refresh_token)
            .await
            .map_err(|_| AuthError::RefreshTokenInvalid)
    }

    async fn try_refresh(&self, refresh_token: &str) -> AuthResult<AuthTokenPair> {
        let record = self.tokens.consume(refresh_token, TokenType::Refresh).await?;
        let user = self.users.get_by_id(record.user_id).await?;
        self.tokens.generate_auth_tokens(&user).await
    }

    /// Overwrite the password and drop every outstanding reset link, not
    /// just the consumed one.
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> AuthResult<()> {
        self.try_reset_password(reset_token, new_password)
            .await
            .map_err(|_| AuthError::ResetPasswordFailed)
    }

    async fn try_reset_password(&self, reset_token: &str, new_password: &str) -> AuthResult<()> {
        let record = self
            .tokens
            .consume(reset_token, TokenType::ResetPassword)
            .await?;
        let user = self.users.get_by_id(record.user_id).await?;

        let password_hash = password::hash_password(new_password)?;
        self.users
            .update(
                user.id,
                UpdateUser {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;
        self.tokens
            .delete_for_user(user.id, TokenType::ResetPassword)
            .await?;

        info!(user_id = %user.id, "password reset");
        Ok(())
    }

    /// Mark the account's email verified and drop all verify-email tokens.
    pub async fn verify_email(&self, verify_token: &str) -> AuthResult<()> {
        self.try_verify_email(verify_token)
            .await
            .map_err(|_| AuthError::EmailVerificationFailed)
    }

    async fn try_verify_email(&self, verify_token: &str) -> AuthResult<()> {
        let record = self
            .tokens
            .consume(verify_token, TokenType::VerifyEmail)
            .await?;
        let user = self.users.get_by_id(record.user_id).await?;

        self.tokens
            .delete_for_user(user.id, TokenType::VerifyEmail)
            .await?;
        self.users
            .update(
                user.id,
                UpdateUser {
                    is_email_verified: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        info!(user_id = %user.id, "email verified");
        Ok(())
    }

    /// Forgot-password entry point. Configuration decides whether an unknown
    /// email errors or silently no-ops (`None`), so the endpoint cannot be
    /// used to enumerate accounts.
    pub async fn generate_reset_password_token(&self, email: &str) -> AuthResult<Option<String>> {
        let user = match self.users.get_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound { .. }) => {
                return if self.config.reveal_unknown_reset_email {
                    Err(AuthError::ResetPasswordInvalidEmail)
                } else {
                    Ok(None)
                };
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.tokens.generate_reset_password_token(&user).await?;
        Ok(Some(token))
    }

    /// Issue a verify-email token for an authenticated user.
    pub async fn generate_verify_email_token(&self, user: &User) -> AuthResult<String> {
        self.tokens.generate_verify_email_token(user).await
    }

    /// Resolve the user behind a bearer ACCESS token. Stateless: signature
    /// and expiry only, no store row involved.
    pub async fn authenticate(&self, access_token: &str) -> AuthResult<User> {
        let claims =
            token::decode_token(access_token, &self.config).map_err(|_| AuthError::Unauthorized)?;
        if claims.token_type != TokenType::Access {
            return Err(AuthError::Unauthorized);
        }
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Unauthorized)?;
        self.users
            .get_by_id(user_id)
            .await
            .map_err(|_| AuthError::Unauthorized)
    }

    /// Delete the account. Token revocation does not cascade from user
    /// deletion, so the persisted types are dropped explicitly.
    pub async fn delete_account(&self, user_id: Uuid) -> AuthResult<()> {
        self.users.delete(user_id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => AuthError::UserNotFound,
            other => other.into(),
        })?;

        for token_type in [
            TokenType::Refresh,
            TokenType::ResetPassword,
            TokenType::VerifyEmail,
        ] {
            self.tokens.delete_for_user(user_id, token_type).await?;
        }

        info!(%user_id, "account deleted");
        Ok(())
    }
}
