//! Auth session orchestrator - login, refresh rotation and logout

use std::sync::Arc;

use partner_db::{DbError, RefreshTokenRepository, UserRepository};
use partner_types::{Principal, TokenPair, TokenUse, User, UserId};
use tracing::{Instrument, Span};

use crate::{
    bypass::{VerificationStrategy, BYPASS_USER_ID},
    codec::ClaimsCodec,
    config::{AuthConfig, AuthConfigError},
    federated::FederatedVerifier,
    identity::IdentityResolver,
    issuer::SessionIssuer,
    registry::RefreshTokenRegistry,
    AuthError, RegistryError, TokenError,
};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub user: User,
}

/// Session lifecycle coordinator
///
/// The only component that touches more than one collaborator per call:
/// - Login: federated verification, identity resolution, pair issuance
/// - Refresh: codec verification, atomic consume of the presented token,
///   ownership check, issuance of the successor pair
/// - Logout: registry delete
///
/// Every call is terminal on failure; nothing is retried.
pub struct AuthSessionOrchestrator<U: UserRepository, R: RefreshTokenRepository> {
    verifier: Arc<dyn FederatedVerifier>,
    identities: IdentityResolver<U>,
    codec: Arc<ClaimsCodec>,
    registry: RefreshTokenRegistry<R>,
    issuer: SessionIssuer<R>,
    strategy: VerificationStrategy,
    span: Span,
}

impl<U: UserRepository, R: RefreshTokenRepository> AuthSessionOrchestrator<U, R> {
    /// Create a new orchestrator.
    ///
    /// `span` parents every operation span this orchestrator opens.
    pub fn new(
        config: AuthConfig,
        verifier: Arc<dyn FederatedVerifier>,
        user_repo: Arc<U>,
        token_repo: Arc<R>,
        span: Span,
    ) -> Result<Self, AuthConfigError> {
        config.validate()?;

        let codec = Arc::new(ClaimsCodec::new(&config.signing_secret)?);
        let registry = RefreshTokenRegistry::new(token_repo);
        let issuer = SessionIssuer::from_config(&config, Arc::clone(&codec), registry.clone())?;

        Ok(Self {
            verifier,
            identities: IdentityResolver::new(user_repo),
            codec,
            registry,
            issuer,
            strategy: VerificationStrategy::from_config(&config),
            span,
        })
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Exchange a federated token for a session pair
    pub async fn login(&self, federated_token: &str) -> Result<LoginOutcome, AuthError> {
        let span = tracing::info_span!(parent: &self.span, "login");
        let result = self.login_inner(federated_token).instrument(span).await;
        record_outcome("auth_login_total", &result);
        result
    }

    async fn login_inner(&self, federated_token: &str) -> Result<LoginOutcome, AuthError> {
        if let Some(bypass) = self.strategy.bypass() {
            if bypass.is_login_credential(federated_token) {
                tracing::info!("Login with bypass credential");
                return Ok(LoginOutcome {
                    tokens: bypass.session(),
                    user: bypass.user(),
                });
            }
        }

        let claims = self.verifier.verify(federated_token).await.map_err(|e| {
            tracing::warn!(error = %e, "Federated token rejected");
            AuthError::InvalidFederatedToken(e)
        })?;

        let email = claims
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                tracing::warn!(uid = %claims.uid, "Federated claims carry no email");
                AuthError::EmailMissing
            })?;
        let name = claims
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.clone());

        let user = self
            .identities
            .resolve_or_create(&email, &name)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Identity resolution failed");
                AuthError::IdentityResolutionFailed(e)
            })?;

        let session = self.issuer.issue_pair(user.id, &email).await.map_err(|e| {
            tracing::error!(user_id = %user.id, error = %e, "Session issuance failed");
            AuthError::TokenIssuanceFailed(e)
        })?;

        tracing::info!(user_id = %user.id, "Login succeeded");
        Ok(LoginOutcome {
            tokens: session.into_token_pair(),
            user,
        })
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Rotate a refresh token into a new pair.
    ///
    /// The presented token is consumed before the successor is minted. If
    /// issuance fails or the call is cancelled after the consume, the caller
    /// holds no live refresh token and must log in again.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let span = tracing::info_span!(parent: &self.span, "refresh");
        let result = self.refresh_inner(refresh_token).instrument(span).await;
        record_outcome("auth_refresh_total", &result);
        result
    }

    async fn refresh_inner(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        if let Some(bypass) = self.strategy.bypass() {
            if bypass.is_refresh_credential(refresh_token) {
                tracing::info!("Refresh with bypass credential");
                return Ok(bypass.session());
            }
        }

        let claims = self
            .codec
            .verify_as(refresh_token, TokenUse::Refresh)
            .map_err(|e| {
                tracing::warn!(error = %e, "Refresh token failed verification");
                AuthError::InvalidRefreshToken(e)
            })?;
        let subject = claims
            .user_id()
            .ok_or(AuthError::InvalidRefreshToken(TokenError::Malformed))?;

        let owner = match self.registry.consume(refresh_token).await {
            Ok(owner) => owner,
            Err(RegistryError::NotFound) => {
                tracing::warn!(user_id = %subject, "Refresh token not registered");
                return Err(AuthError::RefreshTokenNotFound);
            }
            Err(e) => {
                tracing::error!(user_id = %subject, error = %e, "Failed to consume refresh token");
                return Err(AuthError::RevocationFailed(e));
            }
        };

        if owner != subject {
            tracing::warn!(
                user_id = %subject,
                registered_owner = %owner,
                "Refresh token owner mismatch"
            );
            return Err(AuthError::OwnershipMismatch);
        }

        let session = self
            .issuer
            .issue_pair(subject, &claims.email)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %subject, error = %e, "Successor issuance failed");
                AuthError::TokenIssuanceFailed(e)
            })?;

        tracing::info!(user_id = %subject, "Refresh token rotated");
        Ok(session.into_token_pair())
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// Revoke a refresh token. Unknown tokens succeed.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let span = tracing::info_span!(parent: &self.span, "logout");
        let result = async {
            self.registry.delete(refresh_token).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to delete refresh token");
                AuthError::LogoutFailed(e)
            })
        }
        .instrument(span)
        .await;
        record_outcome("auth_logout_total", &result);
        result
    }

    // =========================================================================
    // Request authentication
    // =========================================================================

    /// Resolve the principal behind a bearer access token.
    ///
    /// Signature and expiry only; access tokens are not tracked.
    pub fn authenticate(&self, access_token: &str) -> Result<Principal, AuthError> {
        if let Some(bypass) = self.strategy.bypass() {
            if bypass.is_access_credential(access_token) {
                return Ok(bypass.principal());
            }
        }

        let claims = self
            .codec
            .verify_as(access_token, TokenUse::Access)
            .map_err(AuthError::InvalidAccessToken)?;
        let user_id = claims
            .user_id()
            .ok_or(AuthError::InvalidAccessToken(TokenError::Malformed))?;

        Ok(Principal {
            user_id,
            email: claims.email,
        })
    }

    /// Load the profile of an authenticated user
    pub async fn user(&self, id: UserId) -> Result<Option<User>, DbError> {
        if let Some(bypass) = self.strategy.bypass() {
            if id.0 == BYPASS_USER_ID {
                return Ok(Some(bypass.user()));
            }
        }
        self.identities.find(id).await
    }

    /// Sweep refresh token records whose TTL elapsed
    pub async fn purge_expired_refresh_tokens(&self) -> Result<u64, RegistryError> {
        let purged = self.registry.purge_expired().await?;
        if purged > 0 {
            tracing::info!(purged, "Purged expired refresh tokens");
        }
        Ok(purged)
    }
}

impl<U: UserRepository, R: RefreshTokenRepository> std::fmt::Debug
    for AuthSessionOrchestrator<U, R>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionOrchestrator")
            .field("strategy", &self.strategy)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

fn record_outcome<T>(counter: &'static str, result: &Result<T, AuthError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.error_code(),
    };
    metrics::counter!(counter, "outcome" => outcome).increment(1);
}
