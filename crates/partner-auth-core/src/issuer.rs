//! Session pair issuance

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use partner_db::RefreshTokenRepository;
use partner_types::{TokenPair, TokenUse, UserId};

use crate::codec::ClaimsCodec;
use crate::config::{AuthConfig, AuthConfigError, MAX_TOKEN_TTL};
use crate::registry::RefreshTokenRegistry;
use crate::IssuanceError;

/// An access/refresh pair whose refresh token is already registered
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl IssuedSession {
    /// Whole seconds until the access token expires, measured now
    pub fn expires_in(&self) -> i64 {
        (self.access_expires_at - Utc::now()).num_seconds().max(0)
    }

    pub fn into_token_pair(self) -> TokenPair {
        let expires_in = self.expires_in();
        TokenPair::new(self.access_token, self.refresh_token, expires_in)
    }
}

/// Mints access/refresh pairs and registers the refresh half
pub struct SessionIssuer<R: RefreshTokenRepository> {
    codec: Arc<ClaimsCodec>,
    registry: RefreshTokenRegistry<R>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl<R: RefreshTokenRepository> SessionIssuer<R> {
    pub fn new(
        codec: Arc<ClaimsCodec>,
        registry: RefreshTokenRegistry<R>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            registry,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Build an issuer with the lifetimes from `config`
    pub fn from_config(
        config: &AuthConfig,
        codec: Arc<ClaimsCodec>,
        registry: RefreshTokenRegistry<R>,
    ) -> Result<Self, AuthConfigError> {
        config.validate()?;
        let too_long = |name: &'static str| AuthConfigError::TtlTooLong {
            name,
            maximum: MAX_TOKEN_TTL,
        };
        let access_ttl = Duration::from_std(config.access_token_ttl)
            .map_err(|_| too_long("access token TTL"))?;
        let refresh_ttl = Duration::from_std(config.refresh_token_ttl)
            .map_err(|_| too_long("refresh token TTL"))?;
        Ok(Self::new(codec, registry, access_ttl, refresh_ttl))
    }

    /// Mint a pair for `subject`.
    ///
    /// The pair counts as issued only once the refresh token is registered;
    /// a registry failure fails the whole call.
    pub async fn issue_pair(
        &self,
        subject: UserId,
        email: &str,
    ) -> Result<IssuedSession, IssuanceError> {
        let access = self
            .codec
            .issue(subject, email, TokenUse::Access, self.access_ttl)?;
        let refresh = self
            .codec
            .issue(subject, email, TokenUse::Refresh, self.refresh_ttl)?;

        self.registry
            .save(&refresh.token, subject, refresh.expires_at)
            .await?;

        Ok(IssuedSession {
            access_token: access.token,
            refresh_token: refresh.token,
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        })
    }
}

impl<R: RefreshTokenRepository> std::fmt::Debug for SessionIssuer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
