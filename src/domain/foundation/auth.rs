//! Authentication types for the domain layer.
//!
//! A request reaches the services with an already-resolved [`Caller`].
//! Transport adapters build it from a bearer token through the
//! `TokenIssuer` port; a missing or invalid token yields an anonymous caller
//! rather than a rejected request.

use thiserror::Error;

use super::UserId;

/// The identity a request is executed on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Caller {
    /// No credentials were presented, or they did not validate.
    #[default]
    Anonymous,

    /// A user whose token was validated.
    User(UserId),
}

impl Caller {
    /// Returns the user id, or `AuthError::Unauthenticated` for anonymous callers.
    pub fn require_user(&self) -> Result<UserId, AuthError> {
        match self {
            Caller::User(id) => Ok(*id),
            Caller::Anonymous => Err(AuthError::Unauthenticated),
        }
    }

    /// Returns the user id if the caller is authenticated.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Caller::User(id) => Some(*id),
            Caller::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Caller::Anonymous)
    }
}

impl From<UserId> for Caller {
    fn from(id: UserId) -> Self {
        Caller::User(id)
    }
}

/// Authentication errors that can occur during credential handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The operation needs an identity but the caller is anonymous.
    #[error("Authentication required")]
    Unauthenticated,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid token")]
    InvalidToken,

    /// The token signature is valid but it has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Hashing, verification or signing failed for a non-credential reason.
    #[error("Credential backend failure: {0}")]
    Backend(String),
}

impl AuthError {
    /// Creates a backend error with a message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Returns true if this error indicates the user should re-authenticate.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::Unauthenticated | AuthError::InvalidToken | AuthError::TokenExpired
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_caller_yields_user_id() {
        let id = UserId::new();
        let caller = Caller::from(id);
        assert_eq!(caller.require_user(), Ok(id));
        assert_eq!(caller.user_id(), Some(id));
        assert!(!caller.is_anonymous());
    }

    #[test]
    fn anonymous_caller_is_unauthenticated() {
        let caller = Caller::default();
        assert!(caller.is_anonymous());
        assert_eq!(caller.require_user(), Err(AuthError::Unauthenticated));
        assert_eq!(caller.user_id(), None);
    }

    #[test]
    fn token_errors_require_reauthentication() {
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(!AuthError::backend("boom").requires_reauthentication());
    }

    #[test]
    fn backend_error_displays_message() {
        let err = AuthError::backend("hash failed");
        assert_eq!(err.to_string(), "Credential backend failure: hash failed");
    }
}
