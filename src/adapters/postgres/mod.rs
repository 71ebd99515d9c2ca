//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresUserRepository`, `PostgresPostRepository`,
//!   `PostgresCommentRepository` - one per repository port
//! - `PostgresTransactionManager` - units of work backed by real transactions
//! - `connect` / `run_migrations` - pool creation and schema setup

mod comment_repository;
mod executor;
mod pool;
mod post_repository;
mod transaction;
mod user_repository;

#[cfg(test)]
mod testing;

pub use comment_repository::PostgresCommentRepository;
pub use pool::{connect, run_migrations};
pub use post_repository::PostgresPostRepository;
pub use transaction::{PostgresTransactionManager, PostgresUnitOfWork};
pub use user_repository::PostgresUserRepository;
