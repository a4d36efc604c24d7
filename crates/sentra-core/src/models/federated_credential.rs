//! Federated credential domain model — links a third-party identity
//! provider's user id to a local account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederatedCredential {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Provider name, e.g. `facebook`.
    pub provider: String,
    /// The provider's unique id for this user.
    pub federated_id: String,
    pub created_at: DateTime<Utc>,
}
