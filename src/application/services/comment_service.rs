//! CommentService - Creating comments and replies.

use std::sync::Arc;

use crate::application::{run_in_transaction, ServiceError};
use crate::domain::comment::{Comment, NewComment};
use crate::domain::foundation::{CommandMetadata, CommentId, PostId};
use crate::ports::{CommentFeed, LockMode, TransactionManager};

/// Command to create a comment, optionally as a reply.
#[derive(Debug, Clone)]
pub struct CreateCommentCommand {
    pub post_id: PostId,
    pub reply_to: Option<CommentId>,
    pub content: String,
}

pub struct CommentService {
    transactions: Arc<dyn TransactionManager>,
    feed: Arc<dyn CommentFeed>,
}

impl CommentService {
    pub fn new(transactions: Arc<dyn TransactionManager>, feed: Arc<dyn CommentFeed>) -> Self {
        Self { transactions, feed }
    }

    /// Create a comment on a post.
    ///
    /// The post is locked for the duration of the transaction so a
    /// concurrent `disable_comments` cannot slip in between the check and the
    /// insert. A reply also locks its parent. Live subscribers of the post
    /// are notified only after the commit succeeds.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` for anonymous callers
    /// - `NotFound` if the post or the reply target does not exist
    /// - `CommentsNotAllowed` if the post has comments disabled
    /// - `PostAndReplyMismatch` if the reply target is on another post
    pub async fn create_comment(
        &self,
        cmd: CreateCommentCommand,
        metadata: CommandMetadata,
    ) -> Result<Comment, ServiceError> {
        let author_id = metadata.require_user()?;
        let CreateCommentCommand {
            post_id,
            reply_to,
            content,
        } = cmd;

        let comment = run_in_transaction(self.transactions.as_ref(), &metadata, move |uow| {
            Box::pin(async move {
                // 1. Lock the post and check it accepts comments
                let post = uow.posts().get_by_id(&post_id, LockMode::ForUpdate).await?;
                if !post.accepts_comments() {
                    return Err(ServiceError::CommentsNotAllowed);
                }

                // 2. Resolve the thread: replies inherit the parent's root
                let draft = match reply_to {
                    Some(parent_id) => {
                        let parent = uow
                            .comments()
                            .get_by_id(&parent_id, LockMode::ForUpdate)
                            .await?;
                        if !parent.belongs_to(&post.id) {
                            return Err(ServiceError::PostAndReplyMismatch);
                        }
                        NewComment::reply(&parent, author_id, content)
                    }
                    None => NewComment::root(post.id, author_id, content),
                };

                // 3. Insert
                Ok(uow.comments().add(draft).await?)
            })
        })
        .await?;

        tracing::info!(
            comment_id = %comment.id,
            post_id = %comment.post_id,
            root_id = %comment.root_id,
            "Comment created"
        );

        self.feed.publish(comment.post_id, &comment).await;

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{RecordingFeed, RecordingTransactionManager};
    use crate::domain::foundation::UserId;
    use crate::domain::post::{NewPost, Post};
    use crate::ports::{CommentRepository, PostRepository};

    struct Fixture {
        manager: Arc<RecordingTransactionManager>,
        feed: Arc<RecordingFeed>,
        service: CommentService,
    }

    fn fixture(manager: RecordingTransactionManager) -> Fixture {
        let manager = Arc::new(manager);
        let feed = Arc::new(RecordingFeed::default());
        let service = CommentService::new(manager.clone(), feed.clone());
        Fixture {
            manager,
            feed,
            service,
        }
    }

    async fn seeded_post(manager: &RecordingTransactionManager, comments_allowed: bool) -> Post {
        manager
            .post_repository()
            .add(NewPost::new(UserId::new(), "Post", "Body").with_comments_allowed(comments_allowed))
            .await
            .unwrap()
    }

    fn root_cmd(post_id: PostId) -> CreateCommentCommand {
        CreateCommentCommand {
            post_id,
            reply_to: None,
            content: "First!".to_string(),
        }
    }

    fn reply_cmd(post_id: PostId, parent: CommentId) -> CreateCommentCommand {
        CreateCommentCommand {
            post_id,
            reply_to: Some(parent),
            content: "Reply".to_string(),
        }
    }

    fn author() -> CommandMetadata {
        CommandMetadata::for_user(UserId::new())
    }

    #[tokio::test]
    async fn root_comment_references_itself() {
        let f = fixture(RecordingTransactionManager::new());
        let post = seeded_post(&f.manager, true).await;

        let comment = f.service.create_comment(root_cmd(post.id), author()).await.unwrap();

        assert_eq!(comment.root_id, comment.id);
        assert!(comment.reply_to.is_none());
        assert_eq!(f.manager.commits(), 1);
    }

    #[tokio::test]
    async fn replies_inherit_thread_root_at_every_depth() {
        let f = fixture(RecordingTransactionManager::new());
        let post = seeded_post(&f.manager, true).await;
        let root = f.service.create_comment(root_cmd(post.id), author()).await.unwrap();

        let mut parent = root.clone();
        for _ in 0..5 {
            let reply = f
                .service
                .create_comment(reply_cmd(post.id, parent.id), author())
                .await
                .unwrap();
            assert_eq!(reply.root_id, root.id);
            assert_eq!(reply.reply_to, Some(parent.id));
            parent = reply;
        }
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let f = fixture(RecordingTransactionManager::new());

        let result = f.service.create_comment(root_cmd(PostId::new()), author()).await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(f.manager.rollbacks(), 1);
    }

    #[tokio::test]
    async fn reply_to_missing_comment_is_not_found() {
        let f = fixture(RecordingTransactionManager::new());
        let post = seeded_post(&f.manager, true).await;

        let result = f
            .service
            .create_comment(reply_cmd(post.id, CommentId::new()), author())
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(f.manager.storage().comment_count(), 0);
    }

    #[tokio::test]
    async fn comment_on_closed_post_is_rejected_without_write() {
        let f = fixture(RecordingTransactionManager::new());
        let post = seeded_post(&f.manager, false).await;

        let result = f.service.create_comment(root_cmd(post.id), author()).await;

        assert_eq!(result, Err(ServiceError::CommentsNotAllowed));
        assert_eq!(f.manager.storage().comment_count(), 0);
        assert!(f.feed.published().is_empty());
    }

    #[tokio::test]
    async fn reply_across_posts_is_rejected_without_write() {
        let f = fixture(RecordingTransactionManager::new());
        let post_a = seeded_post(&f.manager, true).await;
        let post_b = seeded_post(&f.manager, true).await;
        let on_a = f.service.create_comment(root_cmd(post_a.id), author()).await.unwrap();

        let result = f
            .service
            .create_comment(reply_cmd(post_b.id, on_a.id), author())
            .await;

        assert_eq!(result, Err(ServiceError::PostAndReplyMismatch));
        assert_eq!(f.manager.storage().comment_count(), 1);
        assert_eq!(f.feed.published().len(), 1);
    }

    #[tokio::test]
    async fn anonymous_caller_is_unauthenticated() {
        let f = fixture(RecordingTransactionManager::new());
        let post = seeded_post(&f.manager, true).await;

        let result = f
            .service
            .create_comment(root_cmd(post.id), CommandMetadata::anonymous())
            .await;

        assert_eq!(result, Err(ServiceError::Unauthenticated));
        assert_eq!(f.manager.commits() + f.manager.rollbacks(), 0);
    }

    #[tokio::test]
    async fn publishes_after_commit() {
        let f = fixture(RecordingTransactionManager::new());
        let post = seeded_post(&f.manager, true).await;

        let comment = f.service.create_comment(root_cmd(post.id), author()).await.unwrap();

        assert_eq!(f.feed.published(), vec![(post.id, comment)]);
    }

    #[tokio::test]
    async fn failed_commit_is_internal_and_not_published() {
        let f = fixture(RecordingTransactionManager::new().failing_commit());
        let post = seeded_post(&f.manager, true).await;

        let result = f.service.create_comment(root_cmd(post.id), author()).await;

        assert_eq!(result, Err(ServiceError::Internal));
        assert_eq!(f.manager.storage().comment_count(), 0);
        assert!(f.feed.published().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_after_lock_leaves_no_partial_write() {
        let f = fixture(RecordingTransactionManager::new().failing_writes());
        let post = seeded_post(&f.manager, true).await;

        let result = f.service.create_comment(root_cmd(post.id), author()).await;

        assert_eq!(result, Err(ServiceError::Internal));
        assert_eq!(f.manager.rollbacks(), 1);
        assert!(f
            .manager
            .comment_repository()
            .get_root_comments_by_post_id(&post.id, Default::default())
            .await
            .unwrap()
            .is_empty());
    }
}
