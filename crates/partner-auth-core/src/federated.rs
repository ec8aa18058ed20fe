//! Federated identity verification
//!
//! Login trades a Firebase ID token for a local session. The verifier checks
//! the token against Google's published keys and yields the identity claims
//! the rest of the flow needs.

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{AuthConfig, VerifierError};

/// Identity claims extracted from a verified federated token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedClaims {
    /// Provider-side user ID
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Verifies an external identity token
#[async_trait]
pub trait FederatedVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<FederatedClaims, VerifierError>;
}

#[async_trait]
impl<T: FederatedVerifier + ?Sized> FederatedVerifier for Arc<T> {
    async fn verify(&self, token: &str) -> Result<FederatedClaims, VerifierError> {
        (**self).verify(token).await
    }
}

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Individual JWK (JSON Web Key)
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    pub alg: Option<String>,
    pub n: String,
    pub e: String,
}

/// Claims of a Firebase ID token
#[derive(Debug, Clone, Deserialize)]
struct FirebaseIdClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

/// Firebase ID token verifier with JWKS caching
///
/// Unknown key IDs are rejected from the cached key list without triggering
/// another JWKS fetch, so garbage tokens cannot be used to flood Google.
#[derive(Clone)]
pub struct FirebaseVerifier {
    config: AuthConfig,
    http_client: reqwest::Client,
    /// Cache of kid -> DecodingKey
    key_cache: Cache<String, Arc<DecodingKey>>,
    /// "jwks" -> list of known kids
    jwks_kids_cache: Cache<String, Arc<Vec<String>>>,
}

impl FirebaseVerifier {
    pub fn new(config: AuthConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(config, http_client)
    }

    /// Create a verifier with custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: reqwest::Client) -> Self {
        let cache_duration = config.jwks_cache_duration;
        Self {
            config,
            http_client,
            key_cache: Cache::builder()
                .time_to_live(cache_duration)
                .max_capacity(100)
                .build(),
            jwks_kids_cache: Cache::builder()
                .time_to_live(cache_duration)
                .max_capacity(1)
                .build(),
        }
    }

    /// Get a decoding key for the given kid
    async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, VerifierError> {
        if let Some(key) = self.key_cache.get(kid).await {
            return Ok(key);
        }

        if let Some(known_kids) = self.jwks_kids_cache.get("jwks").await {
            if !known_kids.iter().any(|k| k == kid) {
                tracing::debug!(kid, "Unknown key ID not in cached JWKS");
                return Err(VerifierError::InvalidToken);
            }
        }

        let jwks = self.fetch_jwks().await?;

        let kids: Vec<String> = jwks.keys.iter().map(|k| k.kid.clone()).collect();
        self.jwks_kids_cache
            .insert("jwks".to_string(), Arc::new(kids))
            .await;

        let mut found = None;
        for k in &jwks.keys {
            match DecodingKey::from_rsa_components(&k.n, &k.e) {
                Ok(dk) => {
                    let dk = Arc::new(dk);
                    if k.kid == kid {
                        found = Some(Arc::clone(&dk));
                    }
                    self.key_cache.insert(k.kid.clone(), dk).await;
                }
                Err(e) => tracing::warn!(kid = %k.kid, error = %e, "Skipping unusable JWK"),
            }
        }

        found.ok_or_else(|| {
            tracing::debug!(kid, "Key not found in JWKS");
            VerifierError::InvalidToken
        })
    }

    async fn fetch_jwks(&self) -> Result<Jwks, VerifierError> {
        let url = self.config.jwks_url();
        tracing::debug!(%url, "Fetching JWKS");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch JWKS");
            VerifierError::KeyFetch(e.to_string())
        })?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "JWKS fetch failed");
            return Err(VerifierError::KeyFetch(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        response.json::<Jwks>().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse JWKS");
            VerifierError::KeyFetch(e.to_string())
        })
    }
}

#[async_trait]
impl FederatedVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<FederatedClaims, VerifierError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode federated token header");
            VerifierError::InvalidToken
        })?;

        let kid = header.kid.ok_or_else(|| {
            tracing::debug!("Federated token missing kid");
            VerifierError::InvalidToken
        })?;

        let decoding_key = self.get_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.config.firebase_issuer()]);
        validation.set_audience(&[&self.config.firebase_project_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data =
            decode::<FirebaseIdClaims>(token, &decoding_key, &validation).map_err(|e| {
                tracing::debug!(error = %e, "Federated token validation failed");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        VerifierError::TokenExpired
                    }
                    _ => VerifierError::InvalidToken,
                }
            })?;

        let claims = token_data.claims;
        if claims.sub.is_empty() {
            return Err(VerifierError::InvalidToken);
        }

        Ok(FederatedClaims {
            uid: claims.sub,
            email: claims.email,
            name: claims.name,
        })
    }
}

impl std::fmt::Debug for FirebaseVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseVerifier")
            .field("project_id", &self.config.firebase_project_id)
            .finish_non_exhaustive()
    }
}
