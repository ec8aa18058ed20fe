//! Repositories with failure injection
//!
//! Thin wrappers over the in-memory stores that can be told to fail a given
//! operation and that record what they were asked to do.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use partner_db::memory::{MemoryRefreshTokenRepository, MemoryUserRepository};
use partner_db::{
    CreateUser, DbError, DbResult, NewRefreshToken, RefreshTokenRepository, UserRepository,
    UserRow,
};
use uuid::Uuid;

fn unavailable() -> DbError {
    DbError::Unavailable("injected failure".to_string())
}

/// User repository that records create requests
#[derive(Default, Clone)]
pub struct RecordingUserRepository {
    pub inner: Arc<MemoryUserRepository>,
    created: Arc<Mutex<Vec<CreateUser>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every create request seen so far
    pub fn created(&self) -> Vec<CreateUser> {
        self.created.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> DbResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for RecordingUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        self.check()?;
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        self.check()?;
        self.inner.find_by_email(email).await
    }

    async fn create_or_get(&self, user: CreateUser) -> DbResult<UserRow> {
        self.check()?;
        self.created.lock().unwrap().push(user.clone());
        self.inner.create_or_get(user).await
    }
}

/// Refresh token repository with switchable failures
#[derive(Default, Clone)]
pub struct FlakyRefreshTokenRepository {
    pub inner: Arc<MemoryRefreshTokenRepository>,
    fail_insert: Arc<AtomicBool>,
    fail_take: Arc<AtomicBool>,
    fail_delete: Arc<AtomicBool>,
    hang_insert: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl FlakyRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_take(&self, fail: bool) {
        self.fail_take.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Make inserts never complete, so callers can be cancelled mid-call
    pub fn hang_insert(&self, hang: bool) {
        self.hang_insert.store(hang, Ordering::SeqCst);
    }

    /// Number of insert, delete, take and repoint calls that reached the store
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn write(&self, flag: &AtomicBool) -> DbResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for FlakyRefreshTokenRepository {
    async fn insert(&self, token: NewRefreshToken) -> DbResult<()> {
        if self.hang_insert.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.write(&self.fail_insert)?;
        self.inner.insert(token).await
    }

    async fn find_owner(&self, token_hash: &str) -> DbResult<Option<Uuid>> {
        self.inner.find_owner(token_hash).await
    }

    async fn delete(&self, token_hash: &str) -> DbResult<bool> {
        self.write(&self.fail_delete)?;
        self.inner.delete(token_hash).await
    }

    async fn take(&self, token_hash: &str) -> DbResult<Option<Uuid>> {
        self.write(&self.fail_take)?;
        self.inner.take(token_hash).await
    }

    async fn repoint(&self, token_hash: &str, user_id: Uuid) -> DbResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.repoint(token_hash, user_id).await
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        self.inner.delete_expired().await
    }
}
