//! In-memory implementation of the credential store.
//!
//! All tables live behind a single `RwLock`, so each repository call is one
//! atomic operation — including [`TokenRepository::take`]'s find-and-delete
//! and the combined user + federated-credential insert.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use sentra_core::error::{StoreError, StoreResult};
use sentra_core::models::federated_credential::FederatedCredential;
use sentra_core::models::token::{CreateTokenRecord, TokenRecord, TokenType};
use sentra_core::models::user::{CreateUser, MfaType, UpdateUser, User};
use sentra_core::repository::{FederatedCredentialRepository, TokenRepository, UserRepository};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    tokens: Vec<TokenRecord>,
    federated: Vec<FederatedCredential>,
}

impl Tables {
    fn email_in_use(&self, email: &str) -> bool {
        self.users.values().any(|u| u.email == email)
    }

    fn username_in_use(&self, username: &str) -> bool {
        self.users
            .values()
            .any(|u| u.username.as_deref() == Some(username))
    }

    fn insert_user(&mut self, input: CreateUser) -> StoreResult<User> {
        let email = input.email.to_lowercase();
        if self.email_in_use(&email) {
            return Err(StoreError::AlreadyExists { entity: "user" });
        }
        if let Some(name) = &input.username {
            if self.username_in_use(name) {
                return Err(StoreError::AlreadyExists { entity: "user" });
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            username: input.username,
            password_hash: input.password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            company: input.company,
            role: input.role,
            is_email_verified: false,
            mfa_enabled: false,
            mfa_type: MfaType::Totp,
            mfa_secret: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        debug!(user_id = %user.id, "user created");
        Ok(user)
    }
}

/// Process-local credential store. Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for MemoryStore {
    async fn create(&self, input: CreateUser) -> StoreResult<User> {
        self.tables.write().await.insert_user(input)
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<User> {
        self.tables
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                id: id.to_string(),
            })
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<User> {
        let email = email.to_lowercase();
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                id: email,
            })
    }

    async fn get_by_email_or_username(&self, login: &str) -> StoreResult<User> {
        let email = login.to_lowercase();
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email || u.username.as_deref() == Some(login))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                id: login.to_string(),
            })
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "user",
            id: id.to_string(),
        })?;

        if let Some(email) = input.email {
            user.email = email.to_lowercase();
        }
        if let Some(username) = input.username {
            user.username = Some(username);
        }
        if let Some(password_hash) = input.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_email_verified) = input.is_email_verified {
            user.is_email_verified = is_email_verified;
        }
        if let Some(mfa_enabled) = input.mfa_enabled {
            user.mfa_enabled = mfa_enabled;
        }
        if let Some(mfa_secret) = input.mfa_secret {
            user.mfa_secret = mfa_secret;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                id: id.to_string(),
            })
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        Ok(self.tables.read().await.email_in_use(&email.to_lowercase()))
    }

    async fn username_taken(&self, username: &str) -> StoreResult<bool> {
        Ok(self.tables.read().await.username_in_use(username))
    }
}

impl TokenRepository for MemoryStore {
    async fn create(&self, input: CreateTokenRecord) -> StoreResult<TokenRecord> {
        let record = TokenRecord {
            id: Uuid::new_v4(),
            token: input.token,
            user_id: input.user_id,
            token_type: input.token_type,
            expires: input.expires,
            blacklisted: input.blacklisted,
            created_at: Utc::now(),
        };
        self.tables.write().await.tokens.push(record.clone());
        debug!(user_id = %record.user_id, token_type = ?record.token_type, "token persisted");
        Ok(record)
    }

    async fn find(
        &self,
        token: &str,
        token_type: TokenType,
        user_id: Uuid,
    ) -> StoreResult<TokenRecord> {
        self.tables
            .read()
            .await
            .tokens
            .iter()
            .find(|t| {
                t.token == token
                    && t.token_type == token_type
                    && t.user_id == user_id
                    && !t.blacklisted
            })
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "token",
                id: token.to_string(),
            })
    }

    async fn take(&self, token: &str, token_type: TokenType) -> StoreResult<TokenRecord> {
        let mut tables = self.tables.write().await;
        let index = tables
            .tokens
            .iter()
            .position(|t| t.token == token && t.token_type == token_type && !t.blacklisted)
            .ok_or(StoreError::NotFound {
                entity: "token",
                id: token.to_string(),
            })?;
        Ok(tables.tokens.remove(index))
    }

    async fn delete_for_user(&self, user_id: Uuid, token_type: TokenType) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.tokens.len();
        tables
            .tokens
            .retain(|t| !(t.user_id == user_id && t.token_type == token_type));
        Ok((before - tables.tokens.len()) as u64)
    }
}

impl FederatedCredentialRepository for MemoryStore {
    async fn find(&self, provider: &str, federated_id: &str) -> StoreResult<FederatedCredential> {
        self.tables
            .read()
            .await
            .federated
            .iter()
            .find(|c| c.provider == provider && c.federated_id == federated_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "federated credential",
                id: format!("{provider}/{federated_id}"),
            })
    }

    async fn create_with_user(
        &self,
        user: CreateUser,
        provider: &str,
        federated_id: &str,
    ) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .federated
            .iter()
            .any(|c| c.provider == provider && c.federated_id == federated_id)
        {
            return Err(StoreError::AlreadyExists {
                entity: "federated credential",
            });
        }

        let user = tables.insert_user(user)?;
        tables.federated.push(FederatedCredential {
            id: Uuid::new_v4(),
            user_id: user.id,
            provider: provider.to_string(),
            federated_id: federated_id.to_string(),
            created_at: Utc::now(),
        });
        Ok(user)
    }
}
