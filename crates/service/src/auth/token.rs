//! Signed, time-bounded bearer tokens carrying subject identity.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::AuthError;

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Stateless token issuer/validator backed by a server-held HMAC secret.
/// Validity is determined purely by signature and expiry at validation time.
pub struct TokenService {
    secret: String,
    algorithm: Algorithm,
    lifetime_minutes: i64,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, algorithm: Algorithm, lifetime_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            algorithm,
            lifetime_minutes,
        }
    }

    /// Mint a token bound to the subject's id and username. Returns the
    /// encoded token together with its lifetime in seconds.
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<(String, i64), AuthError> {
        let now = Utc::now();
        let expire = now + Duration::minutes(self.lifetime_minutes);

        let claims = TokenClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expire.timestamp(),
        };

        let token = encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenError(e.to_string()))?;

        Ok((token, self.lifetime_secs()))
    }

    /// Verify signature and expiry. Malformed input, a forged signature, and
    /// an expired token are indistinguishable to the caller.
    pub fn validate(&self, token: &str) -> Option<TokenClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;

        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .ok()
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_minutes * 60
    }
}
