//! In-memory storage backend.
//!
//! Implements every repository port plus `TransactionManager` on top of one
//! shared [`InMemoryStorage`]. Useful for tests and single-process
//! deployments; data does not survive a restart.

mod comments;
mod posts;
mod storage;
mod transaction;
mod users;

pub use comments::InMemoryCommentRepository;
pub use posts::InMemoryPostRepository;
pub use storage::InMemoryStorage;
pub use transaction::{InMemoryTransactionManager, InMemoryUnitOfWork};
pub use users::InMemoryUserRepository;
