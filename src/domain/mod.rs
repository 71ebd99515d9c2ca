//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, caller identity, errors)
//! - `user` - Registered accounts
//! - `post` - Posts and the comments-allowed switch
//! - `comment` - Comments, thread invariants and reply tree assembly

pub mod comment;
pub mod foundation;
pub mod post;
pub mod user;
