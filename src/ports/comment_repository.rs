//! Comment repository port.
//!
//! # Design
//!
//! - **Root pagination only**: pages window root comments; replies are
//!   always fetched whole, per thread
//! - **Thread fetch**: one call returns every comment of a set of threads,
//!   keyed by `root_id`, so reply trees never need a query per level

use async_trait::async_trait;

use crate::domain::comment::{Comment, NewComment};
use crate::domain::foundation::{CommentId, DomainError, PostId};

use super::LockMode;

/// Page size used when a request does not specify one.
pub const DEFAULT_ROOT_PAGE_SIZE: u32 = 10;

/// Window over a post's root comments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentPage {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl CommentPage {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Fills a missing limit with `default`.
    pub fn with_default_limit(self, default: u32) -> Self {
        Self {
            limit: self.limit.or(Some(default)),
            offset: self.offset,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_ROOT_PAGE_SIZE)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// Repository port for comments.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment and return it as stored.
    ///
    /// When `comment.root_id` is `None` the stored comment's `root_id` is
    /// its own freshly assigned id.
    async fn add(&self, comment: NewComment) -> Result<Comment, DomainError>;

    /// Fetch a comment by id.
    ///
    /// # Errors
    ///
    /// - `CommentNotFound` if the comment doesn't exist
    /// - `DatabaseError` on storage failure
    async fn get_by_id(&self, id: &CommentId, lock: LockMode) -> Result<Comment, DomainError>;

    /// One page of a post's root comments, newest first.
    async fn get_root_comments_by_post_id(
        &self,
        post_id: &PostId,
        page: CommentPage,
    ) -> Result<Vec<Comment>, DomainError>;

    /// Every comment whose `root_id` is in `root_ids`, newest first.
    ///
    /// The result includes the roots themselves. An empty id set yields an
    /// empty result.
    async fn get_children_comments_by_root_ids(
        &self,
        root_ids: &[CommentId],
    ) -> Result<Vec<Comment>, DomainError>;
}
