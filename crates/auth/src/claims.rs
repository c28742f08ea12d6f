use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lendgate_core::UserId;

/// JWT claims model (transport-agnostic).
///
/// Tokens carry identity only. The caller's role is looked up per request so tier
/// changes take effect without re-issuing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the account the token was issued to.
    pub sub: UserId,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Expiration, unix seconds.
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(sub: UserId, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::jwt`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
