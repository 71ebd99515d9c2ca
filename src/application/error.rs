//! Errors surfaced by the application services.

use thiserror::Error;

use crate::domain::foundation::{AuthError, DomainError, ErrorCode};

/// Failure of a service operation, as seen by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Only the post owner may do this")]
    Unauthorized,

    #[error("Comments are disabled for this post")]
    CommentsNotAllowed,

    #[error("Reply target belongs to a different post")]
    PostAndReplyMismatch,

    /// Storage or infrastructure failure. The cause has already been logged.
    #[error("Internal error")]
    Internal,
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Log `cause` and hide it behind `Internal`.
    pub(crate) fn internal(context: &str, cause: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "{}", context);
        Self::Internal
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err.code {
            code if code.is_not_found() => ServiceError::NotFound(err.message),
            ErrorCode::AlreadyExists => ServiceError::AlreadyExists(err.message),
            _ => ServiceError::internal("Storage operation failed", &err),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated | AuthError::InvalidToken | AuthError::TokenExpired => {
                ServiceError::Unauthenticated
            }
            AuthError::Backend(_) => ServiceError::internal("Credential backend failed", &err),
        }
    }
}
