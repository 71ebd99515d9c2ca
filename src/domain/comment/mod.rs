//! Comments and reply threads.
//!
//! Every comment carries the id of its thread's root comment in `root_id`.
//! A root comment points at itself; a reply inherits its parent's `root_id`.
//! This lets a whole thread be fetched with a single `root_id IN (...)`
//! query, which the [`tree`] module then turns back into a nested structure.

mod tree;

pub use tree::{assemble_threads, CommentNode};

use serde::Serialize;

use crate::domain::foundation::{CommentId, PostId, Timestamp, UserId};

/// A stored comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub root_id: CommentId,
    pub reply_to: Option<CommentId>,
    pub content: String,
    pub created_at: Timestamp,
}

impl Comment {
    /// Returns true for comments that start a thread.
    pub fn is_root(&self) -> bool {
        self.reply_to.is_none()
    }

    pub fn belongs_to(&self, post_id: &PostId) -> bool {
        self.post_id == *post_id
    }
}

/// Data needed to insert a comment.
///
/// `root_id` is left empty for root comments; the storage backend fills it
/// with the new comment's own id at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub root_id: Option<CommentId>,
    pub reply_to: Option<CommentId>,
    pub content: String,
}

impl NewComment {
    /// Drafts a comment that starts a new thread.
    pub fn root(post_id: PostId, author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            post_id,
            author_id,
            root_id: None,
            reply_to: None,
            content: content.into(),
        }
    }

    /// Drafts a reply to `parent`, inheriting its thread.
    pub fn reply(parent: &Comment, author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            post_id: parent.post_id,
            author_id,
            root_id: Some(parent.root_id),
            reply_to: Some(parent.id),
            content: content.into(),
        }
    }

    /// Materializes the comment under the given id and creation time.
    pub fn into_comment(self, id: CommentId, created_at: Timestamp) -> Comment {
        Comment {
            id,
            post_id: self.post_id,
            author_id: self.author_id,
            root_id: self.root_id.unwrap_or(id),
            reply_to: self.reply_to,
            content: self.content,
            created_at,
        }
    }
}
