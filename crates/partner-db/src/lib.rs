//! Partner DB - Database abstractions
//!
//! SQLx-based persistence for Partner services, plus in-memory stores for
//! development mode and tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use partner_db::{create_pool, run_migrations, pg::PgUserRepository, UserRepository};
//!
//! let pool = create_pool("postgres://localhost/partner").await?;
//! run_migrations(&pool).await?;
//! let users = PgUserRepository::new(pool);
//!
//! let user = users.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pool::{create_pool, run_migrations, DbPool};
pub use repo::*;
