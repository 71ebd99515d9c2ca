//! Credential ports: password hashing and access token issuance.
//!
//! # When to Use
//!
//! - **PasswordHasher**: registration and login in the user service
//! - **TokenIssuer**: issuing tokens after login, and resolving a bearer
//!   token into a [`Caller`] at the transport boundary

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, Caller, UserId};

/// Produces and checks password hashes.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; errors are reserved for unreadable
    /// hashes and backend failures.
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError>;
}

/// A signed access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Issues and validates access tokens.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Issue a token whose subject is `user_id`.
    async fn issue(&self, user_id: &UserId) -> Result<AccessToken, AuthError>;

    /// Validate a token and return its subject.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenExpired` if the token is past its expiry
    /// - `AuthError::InvalidToken` for anything else that fails validation
    async fn validate(&self, token: &str) -> Result<UserId, AuthError>;

    /// Resolve an optional `Authorization` header value into a caller.
    ///
    /// Anything other than a well-formed, valid `Bearer <token>` header
    /// yields an anonymous caller.
    async fn resolve_caller(&self, authorization: Option<&str>) -> Caller {
        let Some(token) = authorization.and_then(bearer_token) else {
            return Caller::Anonymous;
        };

        match self.validate(token).await {
            Ok(user_id) => Caller::User(user_id),
            Err(e) => {
                tracing::debug!("Ignoring unusable bearer token: {}", e);
                Caller::Anonymous
            }
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}
