//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and atomic per call. Services hold no
//! state between calls, so correctness relies on the store performing each
//! operation as a single unit.

use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{
    federated_credential::FederatedCredential,
    token::{CreateTokenRecord, TokenRecord, TokenType},
    user::{CreateUser, UpdateUser, User},
};

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = StoreResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StoreResult<User>> + Send;
    /// Case-insensitive email lookup.
    fn get_by_email(&self, email: &str) -> impl Future<Output = StoreResult<User>> + Send;
    /// Lookup by email or username, for deployments that allow username
    /// login.
    fn get_by_email_or_username(
        &self,
        login: &str,
    ) -> impl Future<Output = StoreResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = StoreResult<User>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = StoreResult<()>> + Send;
    fn email_taken(&self, email: &str) -> impl Future<Output = StoreResult<bool>> + Send;
    fn username_taken(&self, username: &str) -> impl Future<Output = StoreResult<bool>> + Send;
}

pub trait TokenRepository: Send + Sync {
    fn create(
        &self,
        input: CreateTokenRecord,
    ) -> impl Future<Output = StoreResult<TokenRecord>> + Send;

    /// Find the non-blacklisted row matching `(token, type, user)`.
    fn find(
        &self,
        token: &str,
        token_type: TokenType,
        user_id: Uuid,
    ) -> impl Future<Output = StoreResult<TokenRecord>> + Send;

    /// Find-and-delete in one store operation, so concurrent duplicate
    /// submissions of the same token consume it at most once.
    fn take(
        &self,
        token: &str,
        token_type: TokenType,
    ) -> impl Future<Output = StoreResult<TokenRecord>> + Send;

    /// Delete every row of one type for a user. Returns the removed count.
    fn delete_for_user(
        &self,
        user_id: Uuid,
        token_type: TokenType,
    ) -> impl Future<Output = StoreResult<u64>> + Send;
}

pub trait FederatedCredentialRepository: Send + Sync {
    fn find(
        &self,
        provider: &str,
        federated_id: &str,
    ) -> impl Future<Output = StoreResult<FederatedCredential>> + Send;

    /// Create the user and its credential link in one atomic operation, so a
    /// crash between the two never leaves an orphan user.
    fn create_with_user(
        &self,
        user: CreateUser,
        provider: &str,
        federated_id: &str,
    ) -> impl Future<Output = StoreResult<User>> + Send;
}
