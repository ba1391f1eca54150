// security/src/lib.rs

//! Caller verification. Requests carry an HS256 JWT whose `sub` is the user
//! id and whose `role_id` selects patient, doctor or admin. A verified token
//! becomes a `CallerIdentity`; every failure is the same "unauthenticated"
//! outcome to the client, while `AuthError` keeps the detail for the logs.

pub mod roles;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use models::{CallerIdentity, UserId};

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Claims for JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
    pub iat: u64,
    pub role_id: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token supplied")]
    MissingToken,
    #[error("malformed authorization header")]
    MalformedHeader,
    #[error("token rejected: {0}")]
    InvalidToken(String),
    #[error("token subject is not a valid user id: {0}")]
    InvalidSubject(String),
    #[error("unknown role id {0}")]
    UnknownRole(u32),
    #[error("signing secret must be at least 32 bytes")]
    WeakSecret,
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Issues and verifies tokens with one shared HS256 secret.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority").field("ttl_secs", &self.ttl_secs).finish_non_exhaustive()
    }
}

impl TokenAuthority {
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret);
        }
        Ok(TokenAuthority {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        })
    }

    /// Signs a token for `identity`. The booking API never logs anyone in;
    /// this serves local tooling and tests.
    pub fn issue_token(&self, identity: &CallerIdentity) -> Result<String, AuthError> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: identity.user_id.to_string(),
            exp: now + self.ttl_secs,
            iat: now,
            role_id: roles::role_id(identity.role),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Decodes and validates a token, including its expiry.
    pub fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user_id = UserId::new(claims.sub.as_str()).map_err(|_| AuthError::InvalidSubject(claims.sub.clone()))?;
        let role = roles::role_from_id(claims.role_id)?;
        debug!("Verified token for {} as {:?}", user_id, role);
        Ok(CallerIdentity { user_id, role })
    }
}

/// Picks the raw token out of the request headers: `Authorization: Bearer`
/// first, then the bare `token` header older clients send.
pub fn extract_token<'a>(authorization: Option<&'a str>, legacy_token: Option<&'a str>) -> Result<&'a str, AuthError> {
    if let Some(value) = authorization {
        let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::MalformedHeader)?;
        if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
            return Err(AuthError::MalformedHeader);
        }
        return Ok(token.trim());
    }
    match legacy_token.map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}
