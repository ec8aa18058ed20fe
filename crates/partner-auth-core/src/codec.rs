//! Signed session tokens
//!
//! Access and refresh tokens are HS256 JWTs carrying [`SessionClaims`].
//! Verification is self-contained: it checks signature, algorithm and expiry
//! but never consults the refresh token registry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use partner_types::{SessionClaims, TokenUse, UserId};
use uuid::Uuid;

use crate::config::{AuthConfigError, MIN_SECRET_LENGTH};
use crate::TokenError;

/// A freshly signed token and the instant it stops verifying
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 encoder/verifier for session claims
#[derive(Clone)]
pub struct ClaimsCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl ClaimsCodec {
    /// Create a codec from a shared secret.
    ///
    /// # Errors
    /// Returns error if the secret is shorter than 32 bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthConfigError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AuthConfigError::SecretTooShort {
                actual: secret.len(),
                minimum: MIN_SECRET_LENGTH,
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Sign claims for `subject` valid for `ttl` from now.
    ///
    /// A negative `ttl` yields an already-expired token.
    pub fn issue(
        &self,
        subject: UserId,
        email: &str,
        token_use: TokenUse,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            tracing::error!(ttl_secs = ttl.num_seconds(), "Token expiry out of range");
            TokenError::Signing("token expiry out of range".to_string())
        })?;
        let claims = SessionClaims {
            sub: subject.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_use,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to sign session token");
                TokenError::Signing(e.to_string())
            })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Decode and verify a token of either use
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data =
            decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        TokenError::SignatureInvalid
                    }
                    _ => TokenError::Malformed,
                }
            })?;

        if data.claims.user_id().is_none() {
            tracing::debug!("Session token subject is not a user ID");
            return Err(TokenError::Malformed);
        }

        Ok(data.claims)
    }

    /// Verify a token and require it to be of the given use
    pub fn verify_as(&self, token: &str, expected: TokenUse) -> Result<SessionClaims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_use != expected {
            return Err(TokenError::WrongUse { expected });
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for ClaimsCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}
