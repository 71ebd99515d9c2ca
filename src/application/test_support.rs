//! Test doubles shared by the service tests.
//!
//! [`RecordingTransactionManager`] runs on the in-memory backend, counts
//! commits and rollbacks, and can be told to fail at chosen points.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::adapters::memory::{
    InMemoryCommentRepository, InMemoryPostRepository, InMemoryStorage,
    InMemoryTransactionManager, InMemoryUserRepository,
};
use crate::domain::comment::{Comment, NewComment};
use crate::domain::foundation::{CommentId, DomainError, ErrorCode, PostId};
use crate::domain::post::{NewPost, Post};
use crate::ports::{
    CommentFeed, CommentPage, CommentRepository, CommentSubscription, LockMode, PostRepository,
    TransactionManager, UnitOfWork, UserRepository,
};

#[derive(Default)]
struct Counters {
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

#[derive(Default, Clone, Copy)]
struct Failures {
    begin: bool,
    commit: bool,
    rollback: bool,
    writes: bool,
}

pub(crate) struct RecordingTransactionManager {
    storage: Arc<InMemoryStorage>,
    inner: InMemoryTransactionManager,
    counters: Arc<Counters>,
    failures: Failures,
}

impl RecordingTransactionManager {
    pub(crate) fn new() -> Self {
        Self::with_storage(Arc::new(InMemoryStorage::new()))
    }

    pub(crate) fn with_storage(storage: Arc<InMemoryStorage>) -> Self {
        Self {
            inner: InMemoryTransactionManager::new(storage.clone()),
            storage,
            counters: Arc::new(Counters::default()),
            failures: Failures::default(),
        }
    }

    pub(crate) fn failing_begin(mut self) -> Self {
        self.failures.begin = true;
        self
    }

    pub(crate) fn failing_commit(mut self) -> Self {
        self.failures.commit = true;
        self
    }

    pub(crate) fn failing_rollback(mut self) -> Self {
        self.failures.rollback = true;
        self
    }

    /// Comment inserts and post toggles inside a unit of work fail; reads
    /// and locks still succeed.
    pub(crate) fn failing_writes(mut self) -> Self {
        self.failures.writes = true;
        self
    }

    pub(crate) fn commits(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    pub(crate) fn rollbacks(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }

    pub(crate) fn storage(&self) -> Arc<InMemoryStorage> {
        self.storage.clone()
    }

    pub(crate) fn user_repository(&self) -> InMemoryUserRepository {
        InMemoryUserRepository::new(self.storage.clone())
    }

    pub(crate) fn post_repository(&self) -> InMemoryPostRepository {
        InMemoryPostRepository::new(self.storage.clone())
    }

    pub(crate) fn comment_repository(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository::new(self.storage.clone())
    }
}

#[async_trait]
impl TransactionManager for RecordingTransactionManager {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        if self.failures.begin {
            return Err(injected("begin"));
        }
        Ok(Box::new(RecordingUnitOfWork {
            inner: self.inner.begin().await?,
            counters: self.counters.clone(),
            failures: self.failures,
        }))
    }
}

struct RecordingUnitOfWork {
    inner: Box<dyn UnitOfWork>,
    counters: Arc<Counters>,
    failures: Failures,
}

#[async_trait]
impl UnitOfWork for RecordingUnitOfWork {
    fn users(&self) -> &dyn UserRepository {
        self.inner.users()
    }

    fn posts(&self) -> &dyn PostRepository {
        self
    }

    fn comments(&self) -> &dyn CommentRepository {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        if self.failures.commit {
            // Discard the writes the way a failed database commit would
            self.inner.rollback().await?;
            return Err(injected("commit"));
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        if self.failures.rollback {
            // Dropping the inner unit of work still discards its writes
            return Err(injected("rollback"));
        }
        self.inner.rollback().await
    }
}

#[async_trait]
impl PostRepository for RecordingUnitOfWork {
    async fn add(&self, post: NewPost) -> Result<Post, DomainError> {
        self.inner.posts().add(post).await
    }

    async fn get_by_id(&self, id: &PostId, lock: LockMode) -> Result<Post, DomainError> {
        self.inner.posts().get_by_id(id, lock).await
    }

    async fn get_all(&self) -> Result<Vec<Post>, DomainError> {
        self.inner.posts().get_all().await
    }

    async fn disable_comments(&self, id: &PostId) -> Result<Post, DomainError> {
        if self.failures.writes {
            return Err(injected("disable comments"));
        }
        self.inner.posts().disable_comments(id).await
    }

    async fn enable_comments(&self, id: &PostId) -> Result<Post, DomainError> {
        if self.failures.writes {
            return Err(injected("enable comments"));
        }
        self.inner.posts().enable_comments(id).await
    }
}

#[async_trait]
impl CommentRepository for RecordingUnitOfWork {
    async fn add(&self, comment: NewComment) -> Result<Comment, DomainError> {
        if self.failures.writes {
            return Err(injected("insert comment"));
        }
        self.inner.comments().add(comment).await
    }

    async fn get_by_id(&self, id: &CommentId, lock: LockMode) -> Result<Comment, DomainError> {
        self.inner.comments().get_by_id(id, lock).await
    }

    async fn get_root_comments_by_post_id(
        &self,
        post_id: &PostId,
        page: CommentPage,
    ) -> Result<Vec<Comment>, DomainError> {
        self.inner
            .comments()
            .get_root_comments_by_post_id(post_id, page)
            .await
    }

    async fn get_children_comments_by_root_ids(
        &self,
        root_ids: &[CommentId],
    ) -> Result<Vec<Comment>, DomainError> {
        self.inner
            .comments()
            .get_children_comments_by_root_ids(root_ids)
            .await
    }
}

fn injected(action: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Injected failure: {}", action),
    )
}

/// Records every published comment instead of delivering it.
#[derive(Default)]
pub(crate) struct RecordingFeed {
    published: Mutex<Vec<(PostId, Comment)>>,
}

impl RecordingFeed {
    pub(crate) fn published(&self) -> Vec<(PostId, Comment)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentFeed for RecordingFeed {
    async fn subscribe(&self, post_id: PostId) -> CommentSubscription {
        let (_sender, receiver) = tokio::sync::mpsc::channel(1);
        CommentSubscription::new(Default::default(), post_id, receiver)
    }

    async fn unsubscribe(&self, _post_id: PostId, _subscription: &CommentSubscription) {}

    async fn publish(&self, post_id: PostId, comment: &Comment) {
        self.published
            .lock()
            .unwrap()
            .push((post_id, comment.clone()));
    }
}
