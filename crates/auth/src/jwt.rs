//! Signed session tokens (HS256 JWT).
//!
//! Tokens are stateless: nothing is persisted at issuance and there is no
//! revocation list. A token stays valid until `expires_at`, even if the
//! identity's stored role changes in the meantime (see
//! [`crate::RoleFreshness`] for how the resolver treats that).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use issuetrack_core::UserId;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};
use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, or not a JWT at all.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Signature fine, but the time window is not satisfied.
    #[error("invalid token: {0}")]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// What a successful login hands back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn bearer(access_token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_at,
        }
    }
}

/// Issue and verify identity tokens.
pub trait TokenCodec: Send + Sync {
    /// Sign a token for `subject` valid from `now` for `ttl`.
    fn issue(&self, subject: UserId, role: Role, ttl: Duration, now: DateTime<Utc>) -> Result<String, TokenError>;

    /// Verify the signature and time window, returning the embedded claims.
    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

impl<T> TokenCodec for std::sync::Arc<T>
where
    T: TokenCodec + ?Sized,
{
    fn issue(&self, subject: UserId, role: Role, ttl: Duration, now: DateTime<Utc>) -> Result<String, TokenError> {
        (**self).issue(subject, role, ttl, now)
    }

    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        (**self).decode(token, now)
    }
}

/// HMAC-SHA256 codec keyed by a process-wide secret.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Expiry lives in our own `expires_at` claim and is checked against the
        // injected clock, not the library's wall-clock `exp` handling.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec").field("secret", &"<redacted>").finish()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(&self, subject: UserId, role: Role, ttl: Duration, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = JwtClaims::new(subject, role, now, now + ttl);
        validate_claims(&claims, now)?;

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
