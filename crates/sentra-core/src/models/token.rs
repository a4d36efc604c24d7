//! Persisted token model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purpose of an issued token. The serialized names are the wire values
/// carried in the JWT `type` claim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Access,
    Refresh,
    ResetPassword,
    VerifyEmail,
    VerifyMfa,
}

impl TokenType {
    /// Types that get a store row and are revocable server-side. ACCESS and
    /// VERIFY_MFA are short-lived bearer tokens, trusted on signature alone.
    pub fn is_persisted(self) -> bool {
        matches!(
            self,
            TokenType::Refresh | TokenType::ResetPassword | TokenType::VerifyEmail
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub id: Uuid,
    /// The signed JWT string itself.
    pub token: String,
    pub user_id: Uuid,
    pub token_type: TokenType,
    pub expires: DateTime<Utc>,
    pub blacklisted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub token_type: TokenType,
    pub expires: DateTime<Utc>,
    pub blacklisted: bool,
}
