//! JWT access tokens.
//!
//! Supports:
//! - HS256, HS384, HS512 (shared secret)
//! - `sub` (username) and `exp` claims

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Error types for token handling.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Token has no subject")]
    MissingSubject,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the token owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (seconds since the epoch).
    pub exp: i64,
}

/// Signing and verification keys derived from the auth settings.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .ok()
            .filter(|alg| matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512))
            .ok_or_else(|| AuthError::UnsupportedAlgorithm(config.algorithm.clone()))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret_key.as_bytes()),
            algorithm,
            default_ttl: Duration::minutes(config.access_token_expire_minutes),
        })
    }

    /// Lifetime applied when the caller passes no explicit expiry.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `subject`.
    pub fn create_access_token(
        &self,
        subject: &str,
        expires_in: Option<Duration>,
    ) -> Result<String, AuthError> {
        let exp = Utc::now() + expires_in.unwrap_or(self.default_ttl);
        let claims = Claims {
            sub: Some(subject.to_string()),
            exp: exp.timestamp(),
        };
        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding)?)
    }

    /// Verify signature and expiry, returning the claims.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// Username carried by a valid token.
    pub fn subject_of(&self, token: &str) -> Result<String, AuthError> {
        self.decode_access_token(token)?
            .sub
            .ok_or(AuthError::MissingSubject)
    }

    /// Sign arbitrary claims with the configured key.
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::new(self.algorithm), claims, &self.encoding)?)
    }
}
