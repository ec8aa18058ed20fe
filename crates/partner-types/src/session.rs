//! Session token types

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::UserId;

/// What a signed token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    /// Short-lived bearer credential for API calls
    Access,
    /// Long-lived credential redeemable for a new pair
    Refresh,
}

impl std::fmt::Display for TokenUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried inside an access or refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (local user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    /// Unique token ID; keeps two tokens minted in the same second distinct
    pub jti: String,
    pub token_use: TokenUse,
}

impl SessionClaims {
    /// Get the user ID from the subject claim
    pub fn user_id(&self) -> Option<UserId> {
        UserId::parse(&self.sub).ok()
    }

    /// Check if the claims are expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Token pair returned after login or refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived)
    pub access_token: String,
    /// Refresh token (long-lived)
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    /// Token type (always "Bearer")
    pub token_type: String,
}

impl TokenPair {
    pub const TOKEN_TYPE: &'static str = "Bearer";

    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: Self::TOKEN_TYPE.to_string(),
        }
    }
}

/// The authenticated caller of a request, derived from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
}
