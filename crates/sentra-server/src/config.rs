//! Environment-based configuration, resolved once at process start.
//!
//! The resolved structs are injected into the service constructors; nothing
//! reads the environment after startup.

use std::env;
use std::str::FromStr;

use sentra_auth::config::{AuthConfig, MfaCipherConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Registration policy beyond the always-required email and password.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// Comma-separated `REGISTRATION_REQUIRED_FIELDS`: any of `userName`,
    /// `firstName`, `lastName`, `company`.
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub auth: AuthConfig,
    pub registration: RegistrationConfig,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    /// Read and validate the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AuthConfig::default();
        let cipher_defaults = MfaCipherConfig::default();

        let mfa_cipher = MfaCipherConfig {
            passphrase: required("MFA_ENCRYPTION_SECRET")?,
            iv_hex: env::var("MFA_ENCRYPTION_IV").unwrap_or(cipher_defaults.iv_hex),
            algo: parsed("MFA_ENCRYPTION_ALGO", cipher_defaults.algo)?,
            key_iterations: parsed(
                "MFA_ENCRYPTION_KEY_ITERATIONS",
                cipher_defaults.key_iterations,
            )?,
            key_length: parsed("MFA_ENCRYPTION_KEY_LENGTH", cipher_defaults.key_length)?,
        };

        let auth = AuthConfig {
            jwt_secret: required("JWT_SECRET")?,
            access_expiration_minutes: parsed(
                "JWT_ACCESS_EXPIRATION_MINUTES",
                defaults.access_expiration_minutes,
            )?,
            refresh_expiration_days: parsed(
                "JWT_REFRESH_EXPIRATION_DAYS",
                defaults.refresh_expiration_days,
            )?,
            reset_password_expiration_minutes: parsed(
                "JWT_RESET_PASSWORD_EXPIRATION_MINUTES",
                defaults.reset_password_expiration_minutes,
            )?,
            verify_email_expiration_minutes: parsed(
                "JWT_VERIFY_EMAIL_EXPIRATION_MINUTES",
                defaults.verify_email_expiration_minutes,
            )?,
            verify_mfa_expiration_minutes: parsed(
                "JWT_VERIFY_MFA_EXPIRATION_MINUTES",
                defaults.verify_mfa_expiration_minutes,
            )?,
            allow_username_login: parsed("LOGIN_ALLOW_USERNAME", false)?,
            reveal_unknown_reset_email: parsed(
                "FORGOT_PASSWORD_SEND_INVALID_USER_RESPONSE",
                false,
            )?,
            append_uuid_to_usernames: parsed("REGISTRATION_APPEND_UUID_TO_USERNAMES", false)?,
            mfa_service_name: env::var("MFA_SERVICE_NAME").unwrap_or(defaults.mfa_service_name),
            mfa_cipher,
        };

        let registration = RegistrationConfig {
            required_fields: env::var("REGISTRATION_REQUIRED_FIELDS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        };

        Ok(Self {
            port: parsed("PORT", 3000)?,
            auth,
            registration,
        })
    }
}
