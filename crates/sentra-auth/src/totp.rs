//! TOTP seed generation and code verification.
//!
//! RFC 6238 parameters fixed for every enrollment: SHA-1, 6 digits, 30 s
//! step, ±1 step skew.

use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::AuthError;

fn totp_for(seed_base32: &str, service_name: &str, account: &str) -> Result<TOTP, AuthError> {
    let secret_bytes = Secret::Encoded(seed_base32.to_string())
        .to_bytes()
        .map_err(|e| AuthError::Crypto(format!("secret bytes: {e}")))?;

    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret_bytes,
        Some(service_name.to_string()),
        account.to_string(),
    )
    .map_err(|e| AuthError::Crypto(format!("TOTP init: {e}")))
}

/// Generate a fresh random seed, base32-encoded.
pub fn generate_seed() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

/// otpauth:// provisioning URI for QR display in authenticator apps.
pub fn provisioning_uri(
    seed_base32: &str,
    service_name: &str,
    account: &str,
) -> Result<String, AuthError> {
    Ok(totp_for(seed_base32, service_name, account)?.get_url())
}

/// Check a submitted code against the current and adjacent time windows.
pub fn check_code(
    seed_base32: &str,
    code: &str,
    service_name: &str,
    account: &str,
) -> Result<bool, AuthError> {
    totp_for(seed_base32, service_name, account)?
        .check_current(code)
        .map_err(|e| AuthError::Crypto(format!("TOTP check: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_seeds_are_base32_and_unique() {
        let s1 = generate_seed();
        let s2 = generate_seed();
        assert!(!s1.is_empty());
        assert_ne!(s1, s2);
        assert!(
            s1.chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        );
    }

    #[test]
    fn provisioning_uri_names_service_and_account() {
        let seed = generate_seed();
        let uri = provisioning_uri(&seed, "Sentra", "alice@example.com").unwrap();
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("Sentra"));
        assert!(uri.contains("alice"));
    }

    #[test]
    fn current_code_verifies() {
        let seed = generate_seed();
        let totp = totp_for(&seed, "Sentra", "alice@example.com").unwrap();
        let code = totp.generate_current().unwrap();
        assert!(check_code(&seed, &code, "Sentra", "alice@example.com").unwrap());
    }

    #[test]
    fn wrong_code_fails() {
        let seed = generate_seed();
        assert!(!check_code(&seed, "000000", "Sentra", "alice@example.com").unwrap());
    }

    #[test]
    fn malformed_seed_is_an_error() {
        assert!(check_code("not base32!!", "123456", "Sentra", "a@b.com").is_err());
    }
}
