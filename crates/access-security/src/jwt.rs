//! Access token claim inspection
//!
//! The console never holds the signing key, so claims are read without
//! signature verification. The remote store remains the authority on
//! whether a token is valid.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use access_shared::constants::TOKEN_TYPE_ACCESS;
use access_shared::UserId;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token is not a readable JWT: {0}")]
    InvalidToken(String),
    #[error("Token expired")]
    TokenExpired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub iat: Option<i64>,
    pub exp: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl Claims {
    /// Reads the claims of `token` without checking its signature or expiry.
    pub fn inspect(token: &str) -> Result<Self, JwtError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }

    /// User the token was issued for, from `user_id` or a numeric `sub`.
    pub fn subject_user_id(&self) -> Option<UserId> {
        self.user_id
            .or_else(|| self.sub.as_deref().and_then(|s| s.parse().ok()))
    }

    /// Tokens without a `token_type` claim are assumed to be access tokens.
    pub fn is_access_token(&self) -> bool {
        self.token_type
            .as_deref()
            .map_or(true, |kind| kind == TOKEN_TYPE_ACCESS)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    pub fn ensure_not_expired(&self, now: DateTime<Utc>) -> Result<(), JwtError> {
        if self.exp <= now.timestamp() {
            return Err(JwtError::TokenExpired);
        }
        Ok(())
    }
}
