//! PostService - Posts, the comments-allowed toggle, and threaded reads.

use std::sync::Arc;

use crate::application::{run_in_transaction, ServiceError};
use crate::domain::comment::assemble_threads;
use crate::domain::foundation::{CommandMetadata, CommentId, PostId, UserId};
use crate::domain::post::{NewPost, Post, PostWithComments};
use crate::ports::{
    CommentPage, CommentRepository, LockMode, PostRepository, TransactionManager,
    DEFAULT_ROOT_PAGE_SIZE,
};

/// Command to publish a post.
#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    /// Defaults to `true` when not given.
    pub comments_allowed: Option<bool>,
}

/// Which way to flip a post's comments-allowed flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Enable,
    Disable,
}

pub struct PostService {
    transactions: Arc<dyn TransactionManager>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    default_page_size: u32,
}

impl PostService {
    pub fn new(
        transactions: Arc<dyn TransactionManager>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            transactions,
            posts,
            comments,
            default_page_size: DEFAULT_ROOT_PAGE_SIZE,
        }
    }

    /// Root comments returned by [`get_post_with_comments`](Self::get_post_with_comments)
    /// when the caller gives no limit.
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub async fn create_post(
        &self,
        cmd: CreatePostCommand,
        metadata: CommandMetadata,
    ) -> Result<Post, ServiceError> {
        let owner_id = metadata.require_user()?;

        let draft = NewPost::new(owner_id, cmd.title, cmd.content)
            .with_comments_allowed(cmd.comments_allowed.unwrap_or(true));

        let post = self.posts.add(draft).await?;

        tracing::info!(post_id = %post.id, owner_id = %owner_id, "Post created");
        Ok(post)
    }

    /// All posts, newest first.
    pub async fn get_all_posts(&self) -> Result<Vec<Post>, ServiceError> {
        Ok(self.posts.get_all().await?)
    }

    pub async fn disable_comments(
        &self,
        post_id: PostId,
        metadata: CommandMetadata,
    ) -> Result<Post, ServiceError> {
        self.toggle_comments(post_id, Toggle::Disable, metadata).await
    }

    pub async fn enable_comments(
        &self,
        post_id: PostId,
        metadata: CommandMetadata,
    ) -> Result<Post, ServiceError> {
        self.toggle_comments(post_id, Toggle::Enable, metadata).await
    }

    async fn toggle_comments(
        &self,
        post_id: PostId,
        toggle: Toggle,
        metadata: CommandMetadata,
    ) -> Result<Post, ServiceError> {
        let user_id = metadata.require_user()?;

        let post = run_in_transaction(self.transactions.as_ref(), &metadata, move |uow| {
            Box::pin(async move {
                // 1. Lock the post so the ownership check holds until commit
                let post = uow.posts().get_by_id(&post_id, LockMode::ForUpdate).await?;

                // 2. Authorize - only the owner may toggle
                authorize_owner(&post, &user_id)?;

                // 3. Flip the flag
                let post = match toggle {
                    Toggle::Enable => uow.posts().enable_comments(&post.id).await?,
                    Toggle::Disable => uow.posts().disable_comments(&post.id).await?,
                };
                Ok(post)
            })
        })
        .await?;

        tracing::info!(
            post_id = %post.id,
            comments_allowed = post.comments_allowed,
            "Post comment setting changed"
        );
        Ok(post)
    }

    /// Fetch a post with one page of its comment threads.
    ///
    /// Pagination applies to root comments only, newest first. Every root on
    /// the page carries its complete reply tree, fetched in one batched call.
    pub async fn get_post_with_comments(
        &self,
        post_id: PostId,
        page: CommentPage,
    ) -> Result<PostWithComments, ServiceError> {
        let post = self.posts.get_by_id(&post_id, LockMode::None).await?;

        let page = page.with_default_limit(self.default_page_size);
        let roots = self
            .comments
            .get_root_comments_by_post_id(&post_id, page)
            .await?;

        let root_ids: Vec<CommentId> = roots.iter().map(|c| c.id).collect();
        let thread_comments = self
            .comments
            .get_children_comments_by_root_ids(&root_ids)
            .await?;

        tracing::debug!(
            post_id = %post_id,
            roots = roots.len(),
            thread_comments = thread_comments.len(),
            "Assembling comment threads"
        );

        Ok(PostWithComments {
            post,
            comments: assemble_threads(roots, thread_comments),
        })
    }
}

fn authorize_owner(post: &Post, user_id: &UserId) -> Result<(), ServiceError> {
    if post.is_owned_by(user_id) {
        Ok(())
    } else {
        tracing::warn!(post_id = %post.id, user_id = %user_id, "Rejected toggle by non-owner");
        Err(ServiceError::Unauthorized)
    }
}
