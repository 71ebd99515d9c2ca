//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `UserRepository`, `PostRepository`, `CommentRepository` - one per entity
//! - `TransactionManager` / `UnitOfWork` - atomic groups of repository calls
//!
//! ## Live Update Ports
//!
//! - `CommentFeed` - per-post fan-out of newly created comments
//!
//! ## Credential Ports
//!
//! - `PasswordHasher` - password hashing and verification
//! - `TokenIssuer` - access token issuance and validation

mod comment_feed;
mod comment_repository;
mod credentials;
mod post_repository;
mod transaction;
mod user_repository;

pub use comment_feed::{CommentFeed, CommentSubscription, SubscriptionId};
pub use comment_repository::{CommentPage, CommentRepository, DEFAULT_ROOT_PAGE_SIZE};
pub use credentials::{AccessToken, PasswordHasher, TokenIssuer};
pub use post_repository::PostRepository;
pub use transaction::{LockMode, TransactionManager, UnitOfWork};
pub use user_repository::UserRepository;
