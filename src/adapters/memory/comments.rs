//! In-memory implementation of CommentRepository.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::comment::{Comment, NewComment};
use crate::domain::foundation::{CommentId, DomainError, ErrorCode, PostId};
use crate::ports::{CommentPage, CommentRepository, LockMode};

use super::storage::{InMemoryStorage, RowKey};
use super::transaction::{Scope, Undo};

/// In-memory comment repository.
#[derive(Clone)]
pub struct InMemoryCommentRepository {
    storage: Arc<InMemoryStorage>,
    scope: Scope,
}

impl InMemoryCommentRepository {
    /// Creates a repository whose calls run outside any unit of work.
    pub fn new(storage: Arc<InMemoryStorage>) -> Self {
        Self::scoped(storage, Scope::Direct)
    }

    pub(super) fn scoped(storage: Arc<InMemoryStorage>, scope: Scope) -> Self {
        Self { storage, scope }
    }

    /// Matching comments, newest first. Equal creation times keep the
    /// most recently inserted first.
    fn newest_first_where(&self, predicate: impl Fn(&Comment) -> bool) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .storage
            .comments_read()
            .newest_first()
            .filter(|c| predicate(*c))
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn add(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let mut comments = self.storage.comments_write();
        let (seq, created_at) = self.storage.stamp();

        let comment = comment.into_comment(CommentId::new(), created_at);
        comments.insert(seq, comment.id, comment.clone());
        drop(comments);

        self.scope.record(Undo::CommentAdded(comment.id));
        Ok(comment)
    }

    async fn get_by_id(&self, id: &CommentId, lock: LockMode) -> Result<Comment, DomainError> {
        if lock.is_for_update() && self.scope.is_transaction() {
            self.scope.lock_row(&self.storage, RowKey::Comment(*id)).await;
        }

        self.storage
            .comments_read()
            .get(id)
            .cloned()
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::CommentNotFound,
                    format!("Comment not found: {}", id),
                )
            })
    }

    async fn get_root_comments_by_post_id(
        &self,
        post_id: &PostId,
        page: CommentPage,
    ) -> Result<Vec<Comment>, DomainError> {
        let roots = self.newest_first_where(|c| c.belongs_to(post_id) && c.is_root());

        Ok(roots
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn get_children_comments_by_root_ids(
        &self,
        root_ids: &[CommentId],
    ) -> Result<Vec<Comment>, DomainError> {
        if root_ids.is_empty() {
            return Ok(Vec::new());
        }

        let wanted: HashSet<&CommentId> = root_ids.iter().collect();
        Ok(self.newest_first_where(|c| wanted.contains(&c.root_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn repo() -> InMemoryCommentRepository {
        InMemoryCommentRepository::new(Arc::new(InMemoryStorage::new()))
    }

    #[tokio::test]
    async fn root_comment_gets_own_id_as_root() {
        let repo = repo();
        let comment = repo
            .add(NewComment::root(PostId::new(), UserId::new(), "hi"))
            .await
            .unwrap();

        assert_eq!(comment.root_id, comment.id);
        assert_eq!(repo.get_by_id(&comment.id, LockMode::None).await.unwrap(), comment);
    }

    #[tokio::test]
    async fn get_missing_comment_is_not_found() {
        let err = repo()
            .get_by_id(&CommentId::new(), LockMode::None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CommentNotFound);
    }

    #[tokio::test]
    async fn root_comments_are_paged_newest_first() {
        let repo = repo();
        let post_id = PostId::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let c = repo
                .add(NewComment::root(post_id, UserId::new(), format!("r{}", i)))
                .await
                .unwrap();
            ids.push(c.id);
        }
        // A reply and a comment on another post must not show up as roots.
        let root = repo.get_by_id(&ids[0], LockMode::None).await.unwrap();
        repo.add(NewComment::reply(&root, UserId::new(), "reply")).await.unwrap();
        repo.add(NewComment::root(PostId::new(), UserId::new(), "elsewhere"))
            .await
            .unwrap();

        let page = repo
            .get_root_comments_by_post_id(&post_id, CommentPage::new(2, 0))
            .await
            .unwrap();
        let got: Vec<CommentId> = page.iter().map(|c| c.id).collect();
        assert_eq!(got, vec![ids[4], ids[3]]);

        let next = repo
            .get_root_comments_by_post_id(&post_id, CommentPage::new(2, 4))
            .await
            .unwrap();
        assert_eq!(next.iter().map(|c| c.id).collect::<Vec<_>>(), vec![ids[0]]);
    }

    #[tokio::test]
    async fn default_page_returns_ten_roots() {
        let repo = repo();
        let post_id = PostId::new();
        for i in 0..12 {
            repo.add(NewComment::root(post_id, UserId::new(), format!("r{}", i)))
                .await
                .unwrap();
        }

        let page = repo
            .get_root_comments_by_post_id(&post_id, CommentPage::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 10);
    }

    #[tokio::test]
    async fn children_by_root_ids_returns_whole_threads() {
        let repo = repo();
        let post_id = PostId::new();
        let root = repo
            .add(NewComment::root(post_id, UserId::new(), "root"))
            .await
            .unwrap();
        let child = repo
            .add(NewComment::reply(&root, UserId::new(), "child"))
            .await
            .unwrap();
        let grandchild = repo
            .add(NewComment::reply(&child, UserId::new(), "grandchild"))
            .await
            .unwrap();
        repo.add(NewComment::root(post_id, UserId::new(), "other"))
            .await
            .unwrap();

        let thread = repo
            .get_children_comments_by_root_ids(&[root.id])
            .await
            .unwrap();
        let ids: Vec<CommentId> = thread.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![grandchild.id, child.id, root.id]);
    }

    #[tokio::test]
    async fn children_by_empty_root_set_is_empty() {
        let repo = repo();
        repo.add(NewComment::root(PostId::new(), UserId::new(), "x"))
            .await
            .unwrap();

        let thread = repo.get_children_comments_by_root_ids(&[]).await.unwrap();
        assert!(thread.is_empty());
    }
}
