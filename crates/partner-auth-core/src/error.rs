//! Auth errors
//!
//! Each stage of the lifecycle has its own error type; [`AuthError`] wraps
//! them with the stage that failed and is what the orchestrator returns.

use partner_db::DbError;
use partner_types::TokenUse;
use thiserror::Error;

/// Session token codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token could not be parsed or is missing required claims
    #[error("malformed token")]
    Malformed,

    /// Signature or algorithm does not match
    #[error("token signature invalid")]
    SignatureInvalid,

    /// Token has expired
    #[error("token expired")]
    Expired,

    /// A refresh token presented as an access token, or vice versa
    #[error("token is not a {expected} token")]
    WrongUse { expected: TokenUse },

    /// Encoding failed
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Refresh token registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No live record for the token
    #[error("refresh token not registered")]
    NotFound,

    /// The requested expiry is not in the future
    #[error("refresh token expiry is not in the future")]
    AlreadyExpired,

    /// The backing store failed
    #[error("registry store error: {0}")]
    Store(#[from] DbError),
}

/// Federated identity verifier errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("invalid federated token")]
    InvalidToken,

    #[error("federated token expired")]
    TokenExpired,

    /// Signing keys could not be fetched or parsed
    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(String),
}

/// Failure while minting a session pair
#[derive(Error, Debug)]
pub enum IssuanceError {
    #[error("signing failed: {0}")]
    Signing(#[from] TokenError),

    #[error("refresh token registration failed: {0}")]
    Registration(#[from] RegistryError),
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("login: federated token rejected: {0}")]
    InvalidFederatedToken(#[source] VerifierError),

    #[error("login: email missing from federated claims")]
    EmailMissing,

    #[error("login: failed to resolve user: {0}")]
    IdentityResolutionFailed(#[source] DbError),

    #[error("failed to issue session tokens: {0}")]
    TokenIssuanceFailed(#[source] IssuanceError),

    #[error("refresh: invalid refresh token: {0}")]
    InvalidRefreshToken(#[source] TokenError),

    #[error("refresh: refresh token not found")]
    RefreshTokenNotFound,

    #[error("refresh: refresh token owner does not match its subject")]
    OwnershipMismatch,

    #[error("refresh: failed to retire refresh token: {0}")]
    RevocationFailed(#[source] RegistryError),

    #[error("logout: failed to delete refresh token: {0}")]
    LogoutFailed(#[source] RegistryError),

    #[error("invalid access token: {0}")]
    InvalidAccessToken(#[source] TokenError),
}

impl AuthError {
    /// Get HTTP status code for this error.
    ///
    /// Every login and refresh failure is a 401; the kind is never exposed.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::LogoutFailed(_) => 500,
            _ => 401,
        }
    }

    /// Stable identifier for logs and metric labels
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFederatedToken(_) => "INVALID_FEDERATED_TOKEN",
            Self::EmailMissing => "EMAIL_MISSING",
            Self::IdentityResolutionFailed(_) => "IDENTITY_RESOLUTION_FAILED",
            Self::TokenIssuanceFailed(_) => "TOKEN_ISSUANCE_FAILED",
            Self::InvalidRefreshToken(_) => "INVALID_REFRESH_TOKEN",
            Self::RefreshTokenNotFound => "REFRESH_TOKEN_NOT_FOUND",
            Self::OwnershipMismatch => "OWNERSHIP_MISMATCH",
            Self::RevocationFailed(_) => "REVOCATION_FAILED",
            Self::LogoutFailed(_) => "LOGOUT_FAILED",
            Self::InvalidAccessToken(_) => "INVALID_ACCESS_TOKEN",
        }
    }
}
