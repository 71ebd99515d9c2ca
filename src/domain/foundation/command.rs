//! Command infrastructure for service operations.
//!
//! Every service method that acts on behalf of someone receives a
//! `CommandMetadata` next to its command. It carries:
//! - the resolved [`Caller`]
//! - a correlation id for log stitching
//! - an optional deadline bounding transactional work

use std::time::{Duration, Instant};

use uuid::Uuid;

use super::{AuthError, Caller, UserId};

/// Metadata context for service operations.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// Who is executing this command.
    pub caller: Caller,

    /// Links related operations across a single user request.
    /// Generated lazily if not provided.
    correlation_id: Option<String>,

    /// Point in time after which the enclosing transaction is abandoned.
    deadline: Option<Instant>,

    /// Source of this command (e.g., "graphql", "subscription").
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates metadata for the given caller.
    pub fn new(caller: Caller) -> Self {
        Self {
            caller,
            correlation_id: None,
            deadline: None,
            source: None,
        }
    }

    /// Creates metadata for an anonymous caller.
    pub fn anonymous() -> Self {
        Self::new(Caller::Anonymous)
    }

    /// Creates metadata for an authenticated user.
    pub fn for_user(user_id: UserId) -> Self {
        Self::new(Caller::User(user_id))
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: Set an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Builder: Set a deadline relative to now.
    ///
    /// A timeout too large to represent as an `Instant` leaves the deadline
    /// unset.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the caller's user id, or `Unauthenticated` for anonymous callers.
    pub fn require_user(&self) -> Result<UserId, AuthError> {
        self.caller.require_user()
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Returns the deadline if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the source if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl Default for CommandMetadata {
    fn default() -> Self {
        Self::anonymous()
    }
}
