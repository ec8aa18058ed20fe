//! In-memory user repository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::UserRow;
use crate::repo::{CreateUser, UserRepository};

/// In-memory user repository
#[derive(Default, Clone)]
pub struct MemoryUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let Some(id) = self.by_email.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn create_or_get(&self, user: CreateUser) -> DbResult<UserRow> {
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(existing) => self
                .users
                .get(existing.get())
                .map(|r| r.value().clone())
                .ok_or(DbError::NotFound),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let row = UserRow {
                    id: user.id,
                    email: user.email,
                    name: user.name,
                    diamonds: 0,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(row.id, row.clone());
                slot.insert(row.id);
                Ok(row)
            }
        }
    }
}
