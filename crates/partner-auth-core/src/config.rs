//! Configuration types for the session lifecycle

use std::time::Duration;

/// Google's public keys for Firebase ID tokens
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Minimum signing secret length in bytes (256 bits)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Longest accepted access or refresh token lifetime (10 years)
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Auth configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 secret for access and refresh tokens
    pub signing_secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (also the registry record TTL)
    pub refresh_token_ttl: Duration,
    /// Firebase project ID (issuer suffix and expected audience)
    pub firebase_project_id: String,
    /// Replaces the Google JWKS endpoint (tests, emulators)
    pub jwks_url_override: Option<String>,
    /// JWKS cache duration
    pub jwks_cache_duration: Duration,
    /// Fixed credentials accepted in non-production environments
    pub bypass: Option<BypassConfig>,
}

/// Bypass credentials
#[derive(Clone, PartialEq, Eq)]
pub struct BypassConfig {
    pub token: String,
    pub refresh_token: String,
}

impl BypassConfig {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl std::fmt::Debug for BypassConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BypassConfig").finish_non_exhaustive()
    }
}

/// Errors raised while validating an [`AuthConfig`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthConfigError {
    #[error("signing secret too short: got {actual} bytes, need at least {minimum}")]
    SecretTooShort { actual: usize, minimum: usize },

    #[error("{0} must be greater than zero")]
    ZeroTtl(&'static str),

    #[error("{name} exceeds the maximum of {maximum:?}")]
    TtlTooLong {
        name: &'static str,
        maximum: Duration,
    },

    #[error("bypass tokens must not be empty")]
    EmptyBypassToken,

    #[error("bypass access and refresh tokens must differ")]
    BypassTokensIdentical,
}

impl AuthConfig {
    /// Create a config with default lifetimes, validating the secret
    pub fn try_new(
        signing_secret: impl Into<String>,
        firebase_project_id: impl Into<String>,
    ) -> Result<Self, AuthConfigError> {
        let config = Self {
            signing_secret: signing_secret.into(),
            access_token_ttl: Duration::from_secs(60 * 60), // 1 hour
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            firebase_project_id: firebase_project_id.into(),
            jwks_url_override: None,
            jwks_cache_duration: Duration::from_secs(60 * 60),
            bypass: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the builder methods cannot enforce on their own
    pub fn validate(&self) -> Result<(), AuthConfigError> {
        if self.signing_secret.len() < MIN_SECRET_LENGTH {
            return Err(AuthConfigError::SecretTooShort {
                actual: self.signing_secret.len(),
                minimum: MIN_SECRET_LENGTH,
            });
        }
        check_ttl("access token TTL", self.access_token_ttl)?;
        check_ttl("refresh token TTL", self.refresh_token_ttl)?;
        if let Some(bypass) = &self.bypass {
            if bypass.token.is_empty() || bypass.refresh_token.is_empty() {
                return Err(AuthConfigError::EmptyBypassToken);
            }
            // Otherwise the refresh credential would also pass as a bearer token
            if bypass.token == bypass.refresh_token {
                return Err(AuthConfigError::BypassTokensIdentical);
            }
        }
        Ok(())
    }

    /// Expected `iss` of Firebase ID tokens
    pub fn firebase_issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.firebase_project_id)
    }

    /// Get the JWKS URL
    pub fn jwks_url(&self) -> String {
        self.jwks_url_override
            .clone()
            .unwrap_or_else(|| FIREBASE_JWKS_URL.to_string())
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Point the federated verifier at another JWKS endpoint
    pub fn with_jwks_url_override(mut self, url: impl Into<String>) -> Self {
        self.jwks_url_override = Some(url.into());
        self
    }

    /// Enable bypass mode
    pub fn with_bypass(mut self, bypass: BypassConfig) -> Self {
        self.bypass = Some(bypass);
        self
    }
}

fn check_ttl(name: &'static str, ttl: Duration) -> Result<(), AuthConfigError> {
    if ttl.is_zero() {
        return Err(AuthConfigError::ZeroTtl(name));
    }
    if ttl > MAX_TOKEN_TTL {
        return Err(AuthConfigError::TtlTooLong {
            name,
            maximum: MAX_TOKEN_TTL,
        });
    }
    Ok(())
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret_length", &self.signing_secret.len())
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("firebase_project_id", &self.firebase_project_id)
            .field("jwks_url_override", &self.jwks_url_override)
            .field("bypass_enabled", &self.bypass.is_some())
            .finish_non_exhaustive()
    }
}
