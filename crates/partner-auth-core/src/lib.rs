//! Partner Auth Core - Session token lifecycle
//!
//! Exchanges a federated (Firebase) identity token for a first-party
//! access/refresh pair, rotates refresh tokens, and revokes them on logout.
//!
//! # Example
//!
//! ```rust,ignore
//! use partner_auth_core::{AuthConfig, AuthSessionOrchestrator, FirebaseVerifier};
//!
//! let config = AuthConfig::try_new(secret, "partner-prod")?;
//! let verifier = Arc::new(FirebaseVerifier::new(config.clone()));
//! let auth = AuthSessionOrchestrator::new(config, verifier, users, tokens, span)?;
//!
//! let outcome = auth.login(&firebase_token).await?;
//! let rotated = auth.refresh(&outcome.tokens.refresh_token).await?;
//! auth.logout(&rotated.refresh_token).await?;
//! ```

pub mod bypass;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod federated;
pub mod identity;
pub mod issuer;
pub mod registry;
pub mod service;

pub use bypass::{BypassSessionProvider, VerificationStrategy};
pub use codec::{ClaimsCodec, IssuedToken};
pub use config::{AuthConfig, AuthConfigError, BypassConfig};
pub use error::*;
pub use federated::{FederatedClaims, FederatedVerifier, FirebaseVerifier};
pub use identity::IdentityResolver;
pub use issuer::{IssuedSession, SessionIssuer};
pub use registry::RefreshTokenRegistry;
pub use service::*;
