//! Refresh token registry
//!
//! Maps a refresh token to the user that owns it for as long as the token is
//! redeemable. Records are keyed by the token's SHA-256 hash.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use partner_db::{NewRefreshToken, RefreshTokenRepository};
use partner_types::UserId;

use crate::crypto::hash_token;
use crate::RegistryError;

/// Registry of live refresh tokens
pub struct RefreshTokenRegistry<R: RefreshTokenRepository> {
    repo: Arc<R>,
}

impl<R: RefreshTokenRepository> Clone for RefreshTokenRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: RefreshTokenRepository> RefreshTokenRegistry<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Register `token` for `subject` until `expiry`.
    ///
    /// An expiry that is not in the future is rejected before the store is
    /// touched.
    pub async fn save(
        &self,
        token: &str,
        subject: UserId,
        expiry: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let ttl = expiry - Utc::now();
        if ttl <= chrono::Duration::zero() {
            tracing::warn!(user_id = %subject, "Refusing to register an expired refresh token");
            return Err(RegistryError::AlreadyExpired);
        }

        self.repo
            .insert(NewRefreshToken {
                token_hash: hash_token(token),
                user_id: subject.0,
                expires_at: expiry,
            })
            .await?;

        tracing::debug!(user_id = %subject, ttl_secs = ttl.num_seconds(), "Refresh token registered");
        Ok(())
    }

    /// Owner of a live token
    pub async fn lookup(&self, token: &str) -> Result<UserId, RegistryError> {
        self.repo
            .find_owner(&hash_token(token))
            .await?
            .map(UserId)
            .ok_or(RegistryError::NotFound)
    }

    /// Remove a token. Absent tokens are not an error.
    pub async fn delete(&self, token: &str) -> Result<(), RegistryError> {
        let removed = self.repo.delete(&hash_token(token)).await?;
        tracing::debug!(removed, "Refresh token delete");
        Ok(())
    }

    /// Atomically remove a live token and return its owner.
    ///
    /// Concurrent callers presenting the same token: at most one succeeds,
    /// the rest see `NotFound`.
    pub async fn consume(&self, token: &str) -> Result<UserId, RegistryError> {
        self.repo
            .take(&hash_token(token))
            .await?
            .map(UserId)
            .ok_or(RegistryError::NotFound)
    }

    /// Drop records whose TTL has elapsed
    pub async fn purge_expired(&self) -> Result<u64, RegistryError> {
        Ok(self.repo.delete_expired().await?)
    }
}

impl<R: RefreshTokenRepository> std::fmt::Debug for RefreshTokenRegistry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenRegistry").finish_non_exhaustive()
    }
}
