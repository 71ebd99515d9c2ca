//! Post repository port.
//!
//! Posts are never deleted. Besides insertion, the only writes are the two
//! comments-allowed toggles, which return the post as stored afterwards.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PostId};
use crate::domain::post::{NewPost, Post};

use super::LockMode;

/// Repository port for posts.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post and return it with its assigned id and creation time.
    async fn add(&self, post: NewPost) -> Result<Post, DomainError>;

    /// Fetch a post by id.
    ///
    /// With `LockMode::ForUpdate` inside a unit of work, the row stays
    /// write-locked until the unit of work ends.
    ///
    /// # Errors
    ///
    /// - `PostNotFound` if the post doesn't exist
    /// - `DatabaseError` on storage failure
    async fn get_by_id(&self, id: &PostId, lock: LockMode) -> Result<Post, DomainError>;

    /// All posts, newest first.
    async fn get_all(&self) -> Result<Vec<Post>, DomainError>;

    /// Stop accepting new comments on a post.
    ///
    /// # Errors
    ///
    /// - `PostNotFound` if the post doesn't exist
    async fn disable_comments(&self, id: &PostId) -> Result<Post, DomainError>;

    /// Resume accepting new comments on a post.
    ///
    /// # Errors
    ///
    /// - `PostNotFound` if the post doesn't exist
    async fn enable_comments(&self, id: &PostId) -> Result<Post, DomainError>;
}
