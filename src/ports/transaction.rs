//! Unit-of-work port.
//!
//! A `TransactionManager` opens a [`UnitOfWork`]. The unit of work hands out
//! repository handles whose calls all run inside the same transaction, and
//! is consumed by exactly one of `commit` or `rollback`.
//!
//! ```ignore
//! let uow = manager.begin().await?;
//! let post = uow.posts().get_by_id(&id, LockMode::ForUpdate).await?;
//! uow.posts().disable_comments(&post.id).await?;
//! uow.commit().await?;
//! ```
//!
//! Repository handles obtained outside a unit of work run directly against
//! the backend, one statement at a time.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

use super::{CommentRepository, PostRepository, UserRepository};

/// Row locking requested by a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Plain read.
    #[default]
    None,

    /// Write-intent lock held until the enclosing unit of work ends.
    /// Outside a unit of work this is a plain read.
    ForUpdate,
}

impl LockMode {
    pub fn is_for_update(&self) -> bool {
        matches!(self, LockMode::ForUpdate)
    }
}

/// Opens units of work against the active storage backend.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Begin a new unit of work.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` if the backend cannot start a transaction
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError>;
}

/// A transaction in progress.
///
/// Dropping a unit of work without finishing it discards its writes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> &dyn UserRepository;

    fn posts(&self) -> &dyn PostRepository;

    fn comments(&self) -> &dyn CommentRepository;

    /// Make every write of this unit of work durable and release its locks.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discard every write of this unit of work and release its locks.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
