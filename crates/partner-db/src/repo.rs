//! Repository traits
//!
//! Define async repository interfaces for database operations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Insert a user, or return the existing row if the email is taken.
    ///
    /// Concurrent first logins for one email resolve to a single row.
    async fn create_or_get(&self, user: CreateUser) -> DbResult<UserRow>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Refresh token registry trait
///
/// Every operation touches a single key; implementations must make each one
/// atomic on its own. There are no multi-key transactions.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Register a token hash. Fails with `Conflict` if it is already live.
    async fn insert(&self, token: NewRefreshToken) -> DbResult<()>;

    /// Owner of a live (unexpired) token hash
    async fn find_owner(&self, token_hash: &str) -> DbResult<Option<Uuid>>;

    /// Remove a token hash. Returns whether a row was removed.
    async fn delete(&self, token_hash: &str) -> DbResult<bool>;

    /// Atomically remove a live token hash and return its owner.
    ///
    /// For any hash, at most one caller ever observes `Some`.
    async fn take(&self, token_hash: &str) -> DbResult<Option<Uuid>>;

    /// Point an existing record at a different owner
    async fn repoint(&self, token_hash: &str, user_id: Uuid) -> DbResult<()>;

    /// Delete records whose TTL has elapsed
    async fn delete_expired(&self) -> DbResult<u64>;
}

/// Refresh token registration input
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
impl<T: UserRepository + ?Sized> UserRepository for Arc<T> {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        (**self).find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        (**self).find_by_email(email).await
    }

    async fn create_or_get(&self, user: CreateUser) -> DbResult<UserRow> {
        (**self).create_or_get(user).await
    }
}

#[async_trait]
impl<T: RefreshTokenRepository + ?Sized> RefreshTokenRepository for Arc<T> {
    async fn insert(&self, token: NewRefreshToken) -> DbResult<()> {
        (**self).insert(token).await
    }

    async fn find_owner(&self, token_hash: &str) -> DbResult<Option<Uuid>> {
        (**self).find_owner(token_hash).await
    }

    async fn delete(&self, token_hash: &str) -> DbResult<bool> {
        (**self).delete(token_hash).await
    }

    async fn take(&self, token_hash: &str) -> DbResult<Option<Uuid>> {
        (**self).take(token_hash).await
    }

    async fn repoint(&self, token_hash: &str, user_id: Uuid) -> DbResult<()> {
        (**self).repoint(token_hash, user_id).await
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        (**self).delete_expired().await
    }
}
