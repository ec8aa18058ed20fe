//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A unique key is already taken
    #[error("conflict: {0}")]
    Conflict(String),

    /// Backing store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Database result type
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Map a sqlx error, turning unique violations into `Conflict`
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            _ => Self::Sqlx(err),
        }
    }
}
