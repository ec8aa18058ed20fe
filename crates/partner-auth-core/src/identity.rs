//! Local identity resolution

use std::sync::Arc;

use partner_db::{CreateUser, DbError, UserRepository};
use partner_types::{User, UserId};
use uuid::Uuid;

/// Maps a federated email to a durable local user, creating one on first sight
pub struct IdentityResolver<U: UserRepository> {
    repo: Arc<U>,
}

impl<U: UserRepository> IdentityResolver<U> {
    pub fn new(repo: Arc<U>) -> Self {
        Self { repo }
    }

    pub async fn resolve_or_create(&self, email: &str, name: &str) -> Result<User, DbError> {
        if let Some(row) = self.repo.find_by_email(email).await? {
            return Ok(row.into());
        }

        let row = self
            .repo
            .create_or_get(CreateUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
                name: name.to_string(),
            })
            .await?;
        tracing::info!(user_id = %row.id, "Resolved new user");
        Ok(row.into())
    }

    pub async fn find(&self, id: UserId) -> Result<Option<User>, DbError> {
        Ok(self.repo.find_by_id(id.0).await?.map(User::from))
    }
}
