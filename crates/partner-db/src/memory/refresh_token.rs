//! In-memory refresh token registry

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::RefreshTokenRow;
use crate::repo::{NewRefreshToken, RefreshTokenRepository};

/// In-memory refresh token repository with lazy TTL eviction
#[derive(Default, Clone)]
pub struct MemoryRefreshTokenRepository {
    tokens: Arc<DashMap<String, RefreshTokenRow>>,
}

impl MemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Raw record lookup, ignoring expiry
    pub fn get(&self, token_hash: &str) -> Option<RefreshTokenRow> {
        self.tokens.get(token_hash).map(|r| r.value().clone())
    }

    /// Number of live records owned by a user
    pub fn live_count_for(&self, user_id: Uuid) -> usize {
        self.tokens
            .iter()
            .filter(|r| r.user_id == user_id && !r.is_expired())
            .count()
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn insert(&self, token: NewRefreshToken) -> DbResult<()> {
        let row = RefreshTokenRow {
            token_hash: token.token_hash.clone(),
            user_id: token.user_id,
            expires_at: token.expires_at,
            created_at: Utc::now(),
        };

        match self.tokens.entry(token.token_hash) {
            Entry::Occupied(mut existing) => {
                if !existing.get().is_expired() {
                    return Err(DbError::Conflict(
                        "refresh token already registered".to_string(),
                    ));
                }
                existing.insert(row);
            }
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
        }

        Ok(())
    }

    async fn find_owner(&self, token_hash: &str) -> DbResult<Option<Uuid>> {
        let Some(row) = self.get(token_hash) else {
            return Ok(None);
        };

        if row.is_expired() {
            self.tokens.remove_if(token_hash, |_, r| r.is_expired());
            return Ok(None);
        }

        Ok(Some(row.user_id))
    }

    async fn delete(&self, token_hash: &str) -> DbResult<bool> {
        Ok(self.tokens.remove(token_hash).is_some())
    }

    async fn take(&self, token_hash: &str) -> DbResult<Option<Uuid>> {
        Ok(self
            .tokens
            .remove_if(token_hash, |_, row| !row.is_expired())
            .map(|(_, row)| row.user_id))
    }

    async fn repoint(&self, token_hash: &str, user_id: Uuid) -> DbResult<()> {
        let mut row = self.tokens.get_mut(token_hash).ok_or(DbError::NotFound)?;
        row.user_id = user_id;
        Ok(())
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        let mut removed = 0u64;
        self.tokens.retain(|_, row| {
            let keep = !row.is_expired();
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
