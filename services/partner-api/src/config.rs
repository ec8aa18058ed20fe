//! Configuration for the Partner API service.

use std::time::Duration;

use partner_auth_core::{AuthConfig, AuthConfigError, BypassConfig};

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Staging,
    Production,
}

/// Where users and refresh tokens live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local; everything is lost on restart
    Memory,
}

/// Partner API configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    /// HTTP server port
    pub http_port: u16,
    pub store_backend: StoreBackend,
    /// Database URL (postgres backend only)
    pub database_url: Option<String>,
    /// Session lifecycle configuration
    pub auth: AuthConfig,
    /// Request timeout; bounds every store and JWKS call beneath a handler
    pub request_timeout: Duration,
    /// How often expired refresh tokens are swept
    pub refresh_sweep_interval: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = match var("APP_ENV").as_deref() {
            None | Some("development") => AppEnv::Development,
            Some("staging") => AppEnv::Staging,
            Some("production") => AppEnv::Production,
            Some(_) => return Err(ConfigError::Invalid("APP_ENV")),
        };

        let http_port = parse_or(&var, "HTTP_PORT", 8080)?;

        let store_backend = match var("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(_) => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        let database_url = var("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        // Session tokens
        let signing_secret = var("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;
        let access_secs: u64 = parse_or(&var, "JWT_ACCESS_EXPIRY_SECS", 3600)?;
        let refresh_secs: u64 = parse_or(&var, "JWT_REFRESH_EXPIRY_SECS", 604_800)?;

        // Bypass mode
        let bypass_enabled = parse_or(&var, "BYPASS_ENABLED", false)?;
        let bypass = if bypass_enabled {
            if app_env == AppEnv::Production {
                return Err(ConfigError::BypassInProduction);
            }
            let token = var("BYPASS_TOKEN").ok_or(ConfigError::Missing("BYPASS_TOKEN"))?;
            let refresh_token =
                var("BYPASS_REFRESH_TOKEN").ok_or(ConfigError::Missing("BYPASS_REFRESH_TOKEN"))?;
            Some(BypassConfig::new(token, refresh_token))
        } else {
            None
        };

        // Firebase
        let firebase_project_id = match var("FIREBASE_PROJECT_ID") {
            Some(id) => id,
            None if bypass.is_some() => String::new(),
            None => return Err(ConfigError::Missing("FIREBASE_PROJECT_ID")),
        };

        let mut auth = AuthConfig::try_new(signing_secret, firebase_project_id)?
            .with_access_token_ttl(Duration::from_secs(access_secs))
            .with_refresh_token_ttl(Duration::from_secs(refresh_secs));
        if let Some(url) = var("FIREBASE_JWKS_URL") {
            auth = auth.with_jwks_url_override(url);
        }
        if let Some(bypass) = bypass {
            auth = auth.with_bypass(bypass);
        }
        auth.validate()?;

        let request_timeout_secs: u64 = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;
        let sweep_secs: u64 = parse_or(&var, "REFRESH_SWEEP_INTERVAL_SECS", 300)?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid("REFRESH_SWEEP_INTERVAL_SECS"));
        }

        // Metrics
        let metrics_enabled = parse_or(&var, "METRICS_ENABLED", true)?;

        Ok(Self {
            app_env,
            http_port,
            store_backend,
            database_url,
            auth,
            request_timeout: Duration::from_secs(request_timeout_secs),
            refresh_sweep_interval: Duration::from_secs(sweep_secs),
            metrics_enabled,
        })
    }
}

fn parse_or<F, T>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid auth configuration: {0}")]
    AuthConfig(#[from] AuthConfigError),

    #[error("BYPASS_ENABLED must not be set in production")]
    BypassInProduction,
}
