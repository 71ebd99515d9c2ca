//! Locally signed JWT access tokens.
//!
//! Tokens are HS256-signed with a shared secret. The subject claim carries
//! the user id; `iat` and `exp` are Unix seconds.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, Timestamp, UserId};
use crate::ports::{AccessToken, TokenIssuer};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Subject (user id)
    sub: String,
    /// Issued at (Unix seconds)
    iat: i64,
    /// Expiration (Unix seconds)
    exp: i64,
}

/// Issues and validates HS256 access tokens.
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.token_secret, config.token_ttl())
    }

    fn sign(&self, claims: &Claims) -> Result<AccessToken, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map(AccessToken::new)
            .map_err(|e| AuthError::backend(format!("Token signing failed: {}", e)))
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenIssuer {
    async fn issue(&self, user_id: &UserId) -> Result<AccessToken, AuthError> {
        let issued_at = Timestamp::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.as_unix_secs(),
            exp: issued_at.plus_secs(self.ttl.as_secs()).as_unix_secs(),
        };
        self.sign(&claims)
    }

    async fn validate(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::debug!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })?;

        data.claims.sub.parse::<UserId>().map_err(|e| {
            tracing::warn!("Token subject is not a user id: {}", e);
            AuthError::InvalidToken
        })
    }
}
