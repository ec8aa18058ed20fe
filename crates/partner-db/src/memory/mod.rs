//! In-memory repository implementations
//!
//! Used by the development store backend and by tests. Single-key operations
//! are atomic per DashMap shard, matching what the PostgreSQL stores guarantee.

mod refresh_token;
mod user;

pub use refresh_token::MemoryRefreshTokenRepository;
pub use user::MemoryUserRepository;
