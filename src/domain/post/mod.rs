//! Posts.
//!
//! A post is created once and never deleted. The only mutable field is
//! `comments_allowed`, and only its owner may change it.

use serde::Serialize;

use crate::domain::comment::CommentNode;
use crate::domain::foundation::{PostId, Timestamp, UserId};

/// A published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    pub comments_allowed: bool,
    pub created_at: Timestamp,
}

impl Post {
    /// Returns true if `user_id` owns this post.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.owner_id == *user_id
    }

    /// Returns true if new comments may currently be attached.
    pub fn accepts_comments(&self) -> bool {
        self.comments_allowed
    }
}

/// Data needed to publish a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    pub comments_allowed: bool,
}

impl NewPost {
    /// Creates a post draft that accepts comments.
    pub fn new(owner_id: UserId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            owner_id,
            title: title.into(),
            content: content.into(),
            comments_allowed: true,
        }
    }

    pub fn with_comments_allowed(mut self, allowed: bool) -> Self {
        self.comments_allowed = allowed;
        self
    }

    /// Materializes the post under the given id and creation time.
    pub fn into_post(self, id: PostId, created_at: Timestamp) -> Post {
        Post {
            id,
            owner_id: self.owner_id,
            title: self.title,
            content: self.content,
            comments_allowed: self.comments_allowed,
            created_at,
        }
    }
}

/// A post together with one page of its comment threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Vec<CommentNode>,
}
