//! PostgreSQL refresh token registry implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repo::{NewRefreshToken, RefreshTokenRepository};

/// PostgreSQL refresh token repository
#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    /// Create a new refresh token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, token: NewRefreshToken) -> DbResult<()> {
        // An expired row that the sweeper has not reached yet may be overwritten.
        let result = sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (token_hash) DO UPDATE
                SET user_id = EXCLUDED.user_id,
                    expires_at = EXCLUDED.expires_at,
                    created_at = NOW()
                WHERE refresh_tokens.expires_at <= NOW()
            "#,
        )
        .bind(&token.token_hash)
        .bind(token.user_id)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_insert)?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict("refresh token already registered".to_string()));
        }

        Ok(())
    }

    async fn find_owner(&self, token_hash: &str) -> DbResult<Option<Uuid>> {
        let owner = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM refresh_tokens
            WHERE token_hash = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn delete(&self, token_hash: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn take(&self, token_hash: &str) -> DbResult<Option<Uuid>> {
        // Row-level locking serialises concurrent deletes of the same hash;
        // the loser re-evaluates the predicate and returns no row.
        let owner = sqlx::query_scalar::<_, Uuid>(
            r#"
            DELETE FROM refresh_tokens
            WHERE token_hash = $1 AND expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn repoint(&self, token_hash: &str, user_id: Uuid) -> DbResult<()> {
        let result = sqlx::query("UPDATE refresh_tokens SET user_id = $2 WHERE token_hash = $1")
            .bind(token_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
