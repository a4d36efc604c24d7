//! Authentication configuration.

use std::str::FromStr;

/// Block cipher used to encrypt stored TOTP seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgo {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl CipherAlgo {
    /// Key size in bytes the derived key must match.
    pub fn key_len(self) -> usize {
        match self {
            CipherAlgo::Aes128Cbc => 16,
            CipherAlgo::Aes192Cbc => 24,
            CipherAlgo::Aes256Cbc => 32,
        }
    }
}

impl FromStr for CipherAlgo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes-128-cbc" => Ok(CipherAlgo::Aes128Cbc),
            "aes-192-cbc" => Ok(CipherAlgo::Aes192Cbc),
            "aes-256-cbc" => Ok(CipherAlgo::Aes256Cbc),
            other => Err(format!("{other} is not a supported cipher algorithm")),
        }
    }
}

/// Parameters for the MFA seed cipher.
#[derive(Debug, Clone)]
pub struct MfaCipherConfig {
    /// Passphrase stretched into the symmetric key.
    pub passphrase: String,
    /// Hex-encoded initialization vector, fixed per deployment and shared by
    /// every stored secret. Changing it makes existing ciphertexts
    /// undecryptable.
    pub iv_hex: String,
    pub algo: CipherAlgo,
    /// PBKDF2 iteration count.
    pub key_iterations: u32,
    /// Derived key length in bytes; must match the algorithm's key size.
    pub key_length: usize,
}

impl Default for MfaCipherConfig {
    fn default() -> Self {
        Self {
            passphrase: String::new(),
            iv_hex: "fb1f4b0a7daaada6cae678df32fad0f0".into(),
            algo: CipherAlgo::Aes256Cbc,
            key_iterations: 10,
            key_length: 32,
        }
    }
}

/// Configuration for the authentication services.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for JWT signing.
    pub jwt_secret: String,
    /// Access token lifetime in minutes (default: 30).
    pub access_expiration_minutes: i64,
    /// Refresh token lifetime in days (default: 30).
    pub refresh_expiration_days: i64,
    /// Reset-password token lifetime in minutes (default: 10).
    pub reset_password_expiration_minutes: i64,
    /// Verify-email token lifetime in minutes (default: 10).
    pub verify_email_expiration_minutes: i64,
    /// MFA challenge token lifetime in minutes (default: 10).
    pub verify_mfa_expiration_minutes: i64,
    /// Allow login with username as well as email.
    pub allow_username_login: bool,
    /// Report "no users found" on forgot-password for unknown emails instead
    /// of a silent no-op. Leaving this off prevents account enumeration.
    pub reveal_unknown_reset_email: bool,
    /// Append a short UUID fragment to registered usernames.
    pub append_uuid_to_usernames: bool,
    /// Service name shown in authenticator apps.
    pub mfa_service_name: String,
    pub mfa_cipher: MfaCipherConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_expiration_minutes: 30,
            refresh_expiration_days: 30,
            reset_password_expiration_minutes: 10,
            verify_email_expiration_minutes: 10,
            verify_mfa_expiration_minutes: 10,
            allow_username_login: false,
            reveal_unknown_reset_email: false,
            append_uuid_to_usernames: false,
            mfa_service_name: "Sentra".into(),
            mfa_cipher: MfaCipherConfig::default(),
        }
    }
}
