//! Comment feed port for live comment notifications.
//!
//! Viewers of a post subscribe to its feed and receive every comment
//! published afterwards. Delivery is best-effort and online-only: each
//! subscription buffers at most one undelivered comment, and a publish that
//! finds the slot occupied is dropped for that subscriber.
//!
//! The in-process implementation lives in `adapters::broadcast`. A broker
//! backed implementation for multi-instance deployments would implement
//! this same trait.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::comment::Comment;
use crate::domain::foundation::PostId;

/// Identifies one subscription within a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live subscription to one post's new comments.
#[derive(Debug)]
pub struct CommentSubscription {
    id: SubscriptionId,
    post_id: PostId,
    receiver: mpsc::Receiver<Comment>,
}

impl CommentSubscription {
    pub fn new(id: SubscriptionId, post_id: PostId, receiver: mpsc::Receiver<Comment>) -> Self {
        Self {
            id,
            post_id,
            receiver,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Wait for the next comment.
    ///
    /// Returns `None` once the subscription has been removed from the feed.
    pub async fn recv(&mut self) -> Option<Comment> {
        self.receiver.recv().await
    }

    /// Take the pending comment without waiting, if there is one.
    pub fn try_recv(&mut self) -> Option<Comment> {
        self.receiver.try_recv().ok()
    }
}

/// Per-post publish/subscribe hub for newly created comments.
#[async_trait]
pub trait CommentFeed: Send + Sync {
    /// Register a new subscription for `post_id`.
    async fn subscribe(&self, post_id: PostId) -> CommentSubscription;

    /// Remove exactly this subscription. Unknown subscriptions are ignored.
    async fn unsubscribe(&self, post_id: PostId, subscription: &CommentSubscription);

    /// Offer `comment` to every current subscriber of `post_id`.
    ///
    /// Never waits for a subscriber.
    async fn publish(&self, post_id: PostId, comment: &Comment);
}
