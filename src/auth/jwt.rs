//! JWT Token Codec
//! Mission: Issue and verify signed bearer tokens

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Token verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// Signature does not match the shared secret (or the token is garbage)
    InvalidSignature,
    /// Signature is fine but the embedded expiry has elapsed
    Expired,
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyError::InvalidSignature => write!(f, "invalid token signature"),
            VerifyError::Expired => write!(f, "token expired"),
        }
    }
}

impl std::error::Error for VerifyError {}

/// Codec for issuing and verifying HS256 tokens.
///
/// Pure over the shared secret: no I/O, no stored state beyond configuration.
pub struct TokenCodec {
    secret: String,
    ttl_hours: i64,
}

impl TokenCodec {
    pub fn new(secret: String, ttl_hours: i64) -> Self {
        Self { secret, ttl_hours }
    }

    /// Issue a signed token for a user, expiring `ttl_hours` from now.
    pub fn issue(&self, user_id: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        self.issue_at(user_id, now, now + self.ttl_hours * 3600)
    }

    fn issue_at(&self, user_id: i64, iat: i64, exp: i64) -> Result<String> {
        let claims = Claims {
            sub: user_id,
            iat,
            exp,
        };

        debug!(user_id, exp, "issuing token");

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("failed to sign token")
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            _ => VerifyError::InvalidSignature,
        })?;

        // The decoder already rejects expired tokens (with leeway); re-check the
        // embedded expiry explicitly so a stale token can never slip through.
        if decoded.claims.exp <= Utc::now().timestamp() {
            return Err(VerifyError::Expired);
        }

        Ok(decoded.claims)
    }
}
