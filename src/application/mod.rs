//! Application layer - Services and the transaction boundary.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Every operation that touches more than one repository runs through
//! [`run_in_transaction`], which decides between commit and rollback.

mod error;
pub mod services;
mod transaction;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::ServiceError;
pub use services::{
    CommentService, CreateCommentCommand, CreatePostCommand, PostService, UserService,
};
pub use transaction::run_in_transaction;
