//! In-memory units of work.
//!
//! Writes are applied to the shared tables immediately and recorded in an
//! undo journal. Commit discards the journal; rollback replays it backwards.
//! `LockMode::ForUpdate` reads take a per-row async mutex that stays held
//! until the unit of work ends, which serializes units of work touching the
//! same post or comment.
//!
//! Uncommitted inserts are visible to other readers. Rows guarded by a
//! write-intent lock are only changed by the holder of that lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::domain::foundation::{CommentId, DomainError, PostId, UserId};
use crate::ports::{
    CommentRepository, PostRepository, TransactionManager, UnitOfWork, UserRepository,
};

use super::storage::{InMemoryStorage, RowKey};
use super::{InMemoryCommentRepository, InMemoryPostRepository, InMemoryUserRepository};

/// A reversible write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Undo {
    UserAdded(UserId),
    PostAdded(PostId),
    CommentAdded(CommentId),
    CommentsAllowedChanged { post_id: PostId, previous: bool },
}

/// Which execution context a repository handle runs in.
#[derive(Clone)]
pub(super) enum Scope {
    /// Each call stands alone.
    Direct,
    /// Calls belong to an open unit of work.
    Transaction(Arc<TransactionState>),
}

impl Scope {
    /// Journal a write, if running inside a unit of work.
    pub(super) fn record(&self, undo: Undo) {
        if let Scope::Transaction(state) = self {
            state.record(undo);
        }
    }

    /// Take a write-intent lock on `key` for the rest of the unit of work.
    ///
    /// Returns a guard only for direct calls, which hold the lock just for
    /// the duration of a single write.
    pub(super) async fn lock_row(
        &self,
        storage: &InMemoryStorage,
        key: RowKey,
    ) -> Option<OwnedMutexGuard<()>> {
        match self {
            Scope::Direct => Some(storage.row_lock(key).lock_owned().await),
            Scope::Transaction(state) => {
                state.hold(storage, key).await;
                None
            }
        }
    }

    pub(super) fn is_transaction(&self) -> bool {
        matches!(self, Scope::Transaction(_))
    }
}

/// Bookkeeping for one open unit of work.
#[derive(Default)]
pub(super) struct TransactionState {
    journal: Mutex<Vec<Undo>>,
    held: Mutex<HashMap<RowKey, OwnedMutexGuard<()>>>,
}

impl TransactionState {
    fn record(&self, undo: Undo) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(undo);
    }

    fn holds(&self, key: &RowKey) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    async fn hold(&self, storage: &InMemoryStorage, key: RowKey) {
        if self.holds(&key) {
            return;
        }
        let guard = storage.row_lock(key).lock_owned().await;
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, guard);
    }

    fn take_journal(&self) -> Vec<Undo> {
        std::mem::take(&mut *self.journal.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn release(&self) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Opens in-memory units of work.
#[derive(Clone)]
pub struct InMemoryTransactionManager {
    storage: Arc<InMemoryStorage>,
}

impl InMemoryTransactionManager {
    pub fn new(storage: Arc<InMemoryStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        Ok(Box::new(InMemoryUnitOfWork::new(self.storage.clone())))
    }
}

/// An open in-memory unit of work.
pub struct InMemoryUnitOfWork {
    storage: Arc<InMemoryStorage>,
    state: Arc<TransactionState>,
    users: InMemoryUserRepository,
    posts: InMemoryPostRepository,
    comments: InMemoryCommentRepository,
    finished: bool,
}

impl InMemoryUnitOfWork {
    fn new(storage: Arc<InMemoryStorage>) -> Self {
        let state = Arc::new(TransactionState::default());
        let scope = Scope::Transaction(state.clone());
        Self {
            users: InMemoryUserRepository::scoped(storage.clone(), scope.clone()),
            posts: InMemoryPostRepository::scoped(storage.clone(), scope.clone()),
            comments: InMemoryCommentRepository::scoped(storage.clone(), scope),
            storage,
            state,
            finished: false,
        }
    }

    fn finish(&mut self, keep_writes: bool) {
        let journal = self.state.take_journal();
        if !keep_writes {
            self.storage.undo(journal);
        }
        self.state.release();
        self.storage.prune_row_locks();
        self.finished = true;
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn posts(&self) -> &dyn PostRepository {
        &self.posts
    }

    fn comments(&self) -> &dyn CommentRepository {
        &self.comments
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let mut this = self;
        this.finish(true);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        let mut this = self;
        this.finish(false);
        Ok(())
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("In-memory unit of work dropped without commit or rollback, discarding writes");
            self.finish(false);
        }
    }
}
