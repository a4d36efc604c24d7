//! Outbound email port.
//!
//! The services only produce tokens; formatting and transport live behind
//! this trait.

pub trait Mailer: Send + Sync {
    fn send_reset_password_email(
        &self,
        recipient: &str,
        token: &str,
    ) -> impl Future<Output = Result<(), String>> + Send;

    fn send_verification_email(
        &self,
        recipient: &str,
        token: &str,
    ) -> impl Future<Output = Result<(), String>> + Send;
}
