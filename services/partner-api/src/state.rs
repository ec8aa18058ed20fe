//! Application state

use std::sync::Arc;

use partner_auth_core::AuthSessionOrchestrator;
use partner_db::memory::{MemoryRefreshTokenRepository, MemoryUserRepository};
use partner_db::pg::{PgRefreshTokenRepository, PgUserRepository};
use partner_db::{DbError, DbPool, RefreshTokenRepository, UserRepository};

use crate::config::{Config, StoreBackend};

/// Auth orchestrator over whichever store backend was selected at startup
pub type Orchestrator =
    AuthSessionOrchestrator<Arc<dyn UserRepository>, Arc<dyn RefreshTokenRepository>>;

/// Backing store for users and refresh tokens
#[derive(Clone)]
pub enum Store {
    Postgres(DbPool),
    Memory {
        users: Arc<MemoryUserRepository>,
        refresh_tokens: Arc<MemoryRefreshTokenRepository>,
    },
}

impl Store {
    /// Open the configured backend, running migrations for Postgres
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres"))?;
                let pool = partner_db::create_pool(url).await?;
                partner_db::run_migrations(&pool).await?;
                tracing::info!("Database pool created and migrated");
                Ok(Self::Postgres(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; sessions will not survive a restart");
                Ok(Self::memory())
            }
        }
    }

    pub fn memory() -> Self {
        Self::Memory {
            users: Arc::new(MemoryUserRepository::new()),
            refresh_tokens: Arc::new(MemoryRefreshTokenRepository::new()),
        }
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        match self {
            Self::Postgres(pool) => Arc::new(PgUserRepository::new(pool.clone())),
            Self::Memory { users, .. } => Arc::clone(users) as Arc<dyn UserRepository>,
        }
    }

    pub fn refresh_token_repository(&self) -> Arc<dyn RefreshTokenRepository> {
        match self {
            Self::Postgres(pool) => Arc::new(PgRefreshTokenRepository::new(pool.clone())),
            Self::Memory { refresh_tokens, .. } => {
                Arc::clone(refresh_tokens) as Arc<dyn RefreshTokenRepository>
            }
        }
    }

    /// Check the store is reachable
    pub async fn ping(&self) -> Result<(), DbError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").fetch_one(pool).await?;
                Ok(())
            }
            Self::Memory { .. } => Ok(()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory { .. } => "memory",
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Session lifecycle: login, refresh, logout, bearer authentication
    pub auth: Arc<Orchestrator>,
    pub store: Store,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: Orchestrator, store: Store, config: Config) -> Self {
        Self {
            auth: Arc::new(auth),
            store,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.kind())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
