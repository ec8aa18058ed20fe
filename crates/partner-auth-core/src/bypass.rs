//! Bypass mode
//!
//! Non-production environments can accept a fixed pre-agreed credential in
//! place of a federated token. The bypass path never touches the codec or
//! the registry and always resolves to the same identity.

use chrono::{DateTime, Utc};
use partner_types::{Principal, TokenPair, User, UserId};
use uuid::Uuid;

use crate::config::{AuthConfig, BypassConfig};
use crate::crypto::constant_time_str_eq;

/// Fixed identity returned for bypass credentials
pub const BYPASS_USER_ID: Uuid = Uuid::from_u128(1);
pub const BYPASS_USER_EMAIL: &str = "bypass@example.com";
pub const BYPASS_USER_NAME: &str = "Bypass User";
const BYPASS_USER_DIAMONDS: i64 = 1000;

/// Answers whether a presented string is one of the bypass credentials
#[derive(Clone)]
pub struct BypassSessionProvider {
    token: String,
    refresh_token: String,
    expires_in: i64,
    created_at: DateTime<Utc>,
}

impl BypassSessionProvider {
    pub fn new(config: &BypassConfig, access_ttl: std::time::Duration) -> Self {
        Self {
            token: config.token.clone(),
            refresh_token: config.refresh_token.clone(),
            expires_in: i64::try_from(access_ttl.as_secs()).unwrap_or(i64::MAX),
            created_at: Utc::now(),
        }
    }

    /// Accepted at login in place of a federated token
    pub fn is_login_credential(&self, presented: &str) -> bool {
        constant_time_str_eq(presented, &self.token)
    }

    pub fn is_refresh_credential(&self, presented: &str) -> bool {
        constant_time_str_eq(presented, &self.refresh_token)
    }

    /// Accepted as a bearer token on authenticated routes
    pub fn is_access_credential(&self, presented: &str) -> bool {
        constant_time_str_eq(presented, &self.token)
    }

    pub fn user(&self) -> User {
        User {
            id: UserId(BYPASS_USER_ID),
            email: BYPASS_USER_EMAIL.to_string(),
            name: BYPASS_USER_NAME.to_string(),
            diamonds: BYPASS_USER_DIAMONDS,
            created_at: self.created_at,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: UserId(BYPASS_USER_ID),
            email: BYPASS_USER_EMAIL.to_string(),
        }
    }

    /// The fixed pair handed out for bypass login and refresh
    pub fn session(&self) -> TokenPair {
        TokenPair::new(
            self.token.clone(),
            self.refresh_token.clone(),
            self.expires_in,
        )
    }
}

impl std::fmt::Debug for BypassSessionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BypassSessionProvider")
            .field("user_id", &BYPASS_USER_ID)
            .finish_non_exhaustive()
    }
}

/// How presented credentials are verified, fixed at startup
#[derive(Debug, Clone)]
pub enum VerificationStrategy {
    /// Federated tokens and signed session tokens only
    Federated,
    /// Bypass credentials are accepted alongside the federated path
    Bypass(BypassSessionProvider),
}

impl VerificationStrategy {
    pub fn from_config(config: &AuthConfig) -> Self {
        match &config.bypass {
            Some(bypass) => {
                tracing::warn!("Bypass mode enabled; fixed credentials are accepted");
                Self::Bypass(BypassSessionProvider::new(bypass, config.access_token_ttl))
            }
            None => Self::Federated,
        }
    }

    pub fn bypass(&self) -> Option<&BypassSessionProvider> {
        match self {
            Self::Bypass(provider) => Some(provider),
            Self::Federated => None,
        }
    }
}
