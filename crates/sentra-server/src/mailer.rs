//! Logging mailer.
//!
//! Records outbound email triggers instead of delivering them; an SMTP
//! implementation plugs in behind the same port.

use sentra_core::Mailer;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send_reset_password_email(&self, recipient: &str, token: &str) -> Result<(), String> {
        info!(recipient, "reset password email queued");
        debug!(token, "reset password token");
        Ok(())
    }

    async fn send_verification_email(&self, recipient: &str, token: &str) -> Result<(), String> {
        info!(recipient, "verification email queued");
        debug!(token, "verify email token");
        Ok(())
    }
}
