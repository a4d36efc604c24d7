//! Authentication error taxonomy.
//!
//! Every operation fails with one named kind from a fixed set. Internal
//! causes (store, crypto, JWT) are carried as non-domain variants and
//! re-mapped to the nearest domain kind before they leave a service.

use sentra_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidEmailOrPassword,

    #[error("Incorrect login or password")]
    InvalidLoginOrPassword,

    #[error("Please authenticate")]
    Unauthorized,

    #[error("Not found")]
    TokenNotFound,

    #[error("Refresh token invalid")]
    RefreshTokenInvalid,

    #[error("Password reset failed")]
    ResetPasswordFailed,

    #[error("No users found with this email")]
    ResetPasswordInvalidEmail,

    #[error("Email verification failed")]
    EmailVerificationFailed,

    #[error("TOTP MFA has not been enabled for this account.")]
    MfaNotEnabled,

    #[error("MFA already enabled. To update MFA you must disable and then enable MFA again.")]
    MfaAlreadyEnabled,

    #[error("TOTP MFA token invalid or expired.")]
    InvalidMfaCode,

    #[error("Disable MFA failed")]
    MfaDisableFailed,

    #[error("Email already taken")]
    EmailTaken,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("invalid token: {0}")]
    Jwt(String),

    #[error("An unknown error has occured.")]
    Unknown,
}

impl AuthError {
    /// Whether this is a recognized domain kind, which passes through
    /// service boundaries unchanged, rather than an internal cause.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            AuthError::Store(_) | AuthError::Crypto(_) | AuthError::Jwt(_) | AuthError::Unknown
        )
    }

    /// Keep a domain kind as-is; re-map anything else to `fallback`.
    pub(crate) fn or_domain(self, fallback: AuthError) -> AuthError {
        if self.is_domain() { self } else { fallback }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_causes_are_not_domain_kinds() {
        assert!(AuthError::InvalidMfaCode.is_domain());
        assert!(AuthError::Unauthorized.is_domain());
        assert!(!AuthError::Unknown.is_domain());
        assert!(!AuthError::Crypto("bad key".into()).is_domain());
        assert!(
            !AuthError::Store(StoreError::Backend("down".into())).is_domain()
        );
    }

    #[test]
    fn or_domain_collapses_only_internal_causes() {
        let wrapped = AuthError::Crypto("oops".into()).or_domain(AuthError::MfaDisableFailed);
        assert!(matches!(wrapped, AuthError::MfaDisableFailed));

        let passed = AuthError::MfaNotEnabled.or_domain(AuthError::MfaDisableFailed);
        assert!(matches!(passed, AuthError::MfaNotEnabled));
    }
}
