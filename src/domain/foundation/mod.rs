//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, caller identity and error types
//! that form the vocabulary of the discussion domain.

mod auth;
mod command;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, Caller};
pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode};
pub use ids::{CommentId, PostId, UserId};
pub use timestamp::Timestamp;
