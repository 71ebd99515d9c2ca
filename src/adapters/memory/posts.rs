//! In-memory implementation of PostRepository.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, PostId};
use crate::domain::post::{NewPost, Post};
use crate::ports::{LockMode, PostRepository};

use super::storage::{InMemoryStorage, RowKey};
use super::transaction::{Scope, Undo};

/// In-memory post repository.
#[derive(Clone)]
pub struct InMemoryPostRepository {
    storage: Arc<InMemoryStorage>,
    scope: Scope,
}

impl InMemoryPostRepository {
    /// Creates a repository whose calls run outside any unit of work.
    pub fn new(storage: Arc<InMemoryStorage>) -> Self {
        Self::scoped(storage, Scope::Direct)
    }

    pub(super) fn scoped(storage: Arc<InMemoryStorage>, scope: Scope) -> Self {
        Self { storage, scope }
    }

    async fn set_comments_allowed(&self, id: &PostId, allowed: bool) -> Result<Post, DomainError> {
        let _row = self.scope.lock_row(&self.storage, RowKey::Post(*id)).await;

        let mut posts = self.storage.posts_write();
        let post = posts.get_mut(id).ok_or_else(|| not_found(id))?;

        let previous = post.comments_allowed;
        post.comments_allowed = allowed;
        let updated = post.clone();
        drop(posts);

        self.scope.record(Undo::CommentsAllowedChanged {
            post_id: *id,
            previous,
        });

        Ok(updated)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn add(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut posts = self.storage.posts_write();
        let (seq, created_at) = self.storage.stamp();

        let post = post.into_post(PostId::new(), created_at);
        posts.insert(seq, post.id, post.clone());
        drop(posts);

        self.scope.record(Undo::PostAdded(post.id));
        Ok(post)
    }

    async fn get_by_id(&self, id: &PostId, lock: LockMode) -> Result<Post, DomainError> {
        if lock.is_for_update() && self.scope.is_transaction() {
            self.scope.lock_row(&self.storage, RowKey::Post(*id)).await;
        }

        self.storage
            .posts_read()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn get_all(&self) -> Result<Vec<Post>, DomainError> {
        let mut posts: Vec<Post> = self.storage.posts_read().newest_first().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn disable_comments(&self, id: &PostId) -> Result<Post, DomainError> {
        self.set_comments_allowed(id, false).await
    }

    async fn enable_comments(&self, id: &PostId) -> Result<Post, DomainError> {
        self.set_comments_allowed(id, true).await
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn not_found(id: &PostId) -> DomainError {
    DomainError::new(ErrorCode::PostNotFound, format!("Post not found: {}", id))
}
