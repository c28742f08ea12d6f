//! HS256 token issuance and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use lendgate_core::UserId;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encode(String),

    #[error("malformed or tampered token: {0}")]
    Malformed(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verify a bearer token and return its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Mint a bearer token for an account.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, subject: UserId, now: DateTime<Utc>) -> Result<String, TokenError>;
}

/// Shared-secret HS256 implementation of both sides.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256Jwt {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer for Hs256Jwt {
    fn issue(&self, subject: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = JwtClaims::new(subject, now, self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        // Time checks run against the injected clock in `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
