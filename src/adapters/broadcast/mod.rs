//! In-process comment feed.
//!
//! Subscriptions are organized by post:
//!
//! ```text
//! Post: post-123        Post: post-456
//! ├── subscription-a    └── subscription-d
//! ├── subscription-b
//! └── subscription-c
//! ```
//!
//! A comment published for post-123 is offered to a, b and c only.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use crate::domain::comment::Comment;
use crate::domain::foundation::PostId;
use crate::ports::{CommentFeed, CommentSubscription, SubscriptionId};

/// Undelivered comments a subscription may hold.
const SUBSCRIPTION_CAPACITY: usize = 1;

type Registry = HashMap<PostId, Vec<(SubscriptionId, mpsc::Sender<Comment>)>>;

/// Manages per-post comment subscriptions.
///
/// # Thread Safety
///
/// The registry sits behind a `RwLock`. Subscribing and unsubscribing take
/// the write lock; publishing takes the read lock, so publishes to the same
/// or different posts proceed concurrently.
///
/// Subscriptions dropped without `unsubscribe` are swept from every post
/// whenever the write lock is taken, and are never counted as live.
pub struct CommentBroadcaster {
    /// Map of post_id → senders of every subscription for that post.
    subscribers: RwLock<Registry>,
}

impl CommentBroadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live subscriptions for a post.
    pub async fn subscriber_count(&self, post_id: &PostId) -> usize {
        self.subscribers
            .read()
            .await
            .get(post_id)
            .map(|entry| entry.iter().filter(|(_, sender)| !sender.is_closed()).count())
            .unwrap_or(0)
    }

    /// Number of posts with at least one live subscription.
    pub async fn active_post_count(&self) -> usize {
        self.subscribers
            .read()
            .await
            .values()
            .filter(|entry| entry.iter().any(|(_, sender)| !sender.is_closed()))
            .count()
    }
}

/// Remove senders whose receiver is gone, and posts left without any.
fn prune_closed(subscribers: &mut Registry) -> usize {
    let mut pruned = 0;
    subscribers.retain(|_, entry| {
        let before = entry.len();
        entry.retain(|(_, sender)| !sender.is_closed());
        pruned += before - entry.len();
        !entry.is_empty()
    });
    pruned
}

impl Default for CommentBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentFeed for CommentBroadcaster {
    async fn subscribe(&self, post_id: PostId) -> CommentSubscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_CAPACITY);
        let id = SubscriptionId::new();

        let mut subscribers = self.subscribers.write().await;
        let pruned = prune_closed(&mut subscribers);
        subscribers.entry(post_id).or_default().push((id, tx));

        if pruned > 0 {
            tracing::debug!(pruned, "Pruned abandoned comment feed subscriptions");
        }

        tracing::debug!(post_id = %post_id, subscription_id = %id, "Comment feed subscription added");

        CommentSubscription::new(id, post_id, rx)
    }

    async fn unsubscribe(&self, post_id: PostId, subscription: &CommentSubscription) {
        let mut subscribers = self.subscribers.write().await;

        let mut removed = false;
        if let Some(entry) = subscribers.get_mut(&post_id) {
            let before = entry.len();
            entry.retain(|(id, _)| *id != subscription.id());
            removed = before != entry.len();
            if entry.is_empty() {
                subscribers.remove(&post_id);
            }
        }
        prune_closed(&mut subscribers);

        if removed {
            tracing::debug!(
                post_id = %post_id,
                subscription_id = %subscription.id(),
                "Comment feed subscription removed"
            );
        }
    }

    async fn publish(&self, post_id: PostId, comment: &Comment) {
        let subscribers = self.subscribers.read().await;

        let Some(entry) = subscribers.get(&post_id) else {
            return;
        };

        for (id, sender) in entry {
            match sender.try_send(comment.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(
                        post_id = %post_id,
                        subscription_id = %id,
                        comment_id = %comment.id,
                        "Subscriber has an undelivered comment, dropping new one"
                    );
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comment::NewComment;
    use crate::domain::foundation::{CommentId, Timestamp, UserId};

    fn comment_on(post_id: PostId, content: &str) -> Comment {
        NewComment::root(post_id, UserId::new(), content).into_comment(CommentId::new(), Timestamp::now())
    }

    #[tokio::test]
    async fn subscriber_receives_published_comment() {
        let feed = CommentBroadcaster::new();
        let post_id = PostId::new();
        let mut subscription = feed.subscribe(post_id).await;

        let comment = comment_on(post_id, "hello");
        feed.publish(post_id, &comment).await;

        assert_eq!(subscription.recv().await, Some(comment));
    }

    #[tokio::test]
    async fn subscriber_of_other_post_receives_nothing() {
        let feed = CommentBroadcaster::new();
        let watched = PostId::new();
        let other = PostId::new();
        let mut subscription = feed.subscribe(watched).await;

        feed.publish(other, &comment_on(other, "elsewhere")).await;

        assert!(subscription.try_recv().is_none());
    }

    #[tokio::test]
    async fn every_subscriber_of_a_post_receives_the_comment() {
        let feed = CommentBroadcaster::new();
        let post_id = PostId::new();
        let mut first = feed.subscribe(post_id).await;
        let mut second = feed.subscribe(post_id).await;

        let comment = comment_on(post_id, "fan-out");
        feed.publish(post_id, &comment).await;

        assert_eq!(first.try_recv(), Some(comment.clone()));
        assert_eq!(second.try_recv(), Some(comment));
    }

    #[tokio::test]
    async fn unsubscribed_subscriber_receives_nothing() {
        let feed = CommentBroadcaster::new();
        let post_id = PostId::new();
        let mut subscription = feed.subscribe(post_id).await;

        feed.unsubscribe(post_id, &subscription).await;
        feed.publish(post_id, &comment_on(post_id, "too late")).await;

        assert!(subscription.recv().await.is_none());
        assert_eq!(feed.active_post_count().await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_removes_only_that_subscription() {
        let feed = CommentBroadcaster::new();
        let post_id = PostId::new();
        let leaving = feed.subscribe(post_id).await;
        let mut staying = feed.subscribe(post_id).await;

        feed.unsubscribe(post_id, &leaving).await;
        assert_eq!(feed.subscriber_count(&post_id).await, 1);

        let comment = comment_on(post_id, "still here");
        feed.publish(post_id, &comment).await;
        assert_eq!(staying.try_recv(), Some(comment));
    }

    #[tokio::test]
    async fn unsubscribe_unknown_subscription_is_noop() {
        let feed = CommentBroadcaster::new();
        let post_id = PostId::new();
        let _kept = feed.subscribe(post_id).await;
        let foreign = feed.subscribe(PostId::new()).await;

        feed.unsubscribe(post_id, &foreign).await;
        feed.unsubscribe(PostId::new(), &foreign).await;

        assert_eq!(feed.subscriber_count(&post_id).await, 1);
    }

    #[tokio::test]
    async fn full_slot_drops_new_delivery_without_blocking() {
        let feed = CommentBroadcaster::new();
        let post_id = PostId::new();
        let mut subscription = feed.subscribe(post_id).await;

        let first = comment_on(post_id, "first");
        let second = comment_on(post_id, "second");
        feed.publish(post_id, &first).await;
        feed.publish(post_id, &second).await;

        assert_eq!(subscription.try_recv(), Some(first));
        assert!(subscription.try_recv().is_none());
    }

    #[tokio::test]
    async fn slow_subscriber_does_not_affect_others() {
        let feed = CommentBroadcaster::new();
        let post_id = PostId::new();
        let mut slow = feed.subscribe(post_id).await;
        let mut fast = feed.subscribe(post_id).await;

        let first = comment_on(post_id, "first");
        let second = comment_on(post_id, "second");
        feed.publish(post_id, &first).await;
        assert_eq!(fast.try_recv(), Some(first.clone()));
        feed.publish(post_id, &second).await;

        assert_eq!(fast.try_recv(), Some(second));
        assert_eq!(slow.try_recv(), Some(first));
    }

    #[tokio::test]
    async fn dropped_receivers_are_pruned_on_next_subscribe() {
        let feed = CommentBroadcaster::new();
        let post_id = PostId::new();
        drop(feed.subscribe(post_id).await);

        let _live = feed.subscribe(post_id).await;

        assert_eq!(feed.subscriber_count(&post_id).await, 1);
        assert_eq!(feed.subscribers.read().await[&post_id].len(), 1);
    }

    #[tokio::test]
    async fn abandoned_subscriptions_do_not_accumulate_across_posts() {
        let feed = CommentBroadcaster::new();
        for _ in 0..1000 {
            drop(feed.subscribe(PostId::new()).await);
        }

        assert_eq!(feed.active_post_count().await, 0);

        let watched = PostId::new();
        let live = feed.subscribe(watched).await;
        assert_eq!(feed.subscribers.read().await.len(), 1);

        feed.unsubscribe(watched, &live).await;
        assert!(feed.subscribers.read().await.is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_sweeps_abandoned_subscriptions_of_other_posts() {
        let feed = CommentBroadcaster::new();
        let watched = PostId::new();
        let kept = feed.subscribe(watched).await;
        drop(feed.subscribe(PostId::new()).await);

        feed.unsubscribe(PostId::new(), &kept).await;

        assert_eq!(feed.subscribers.read().await.len(), 1);
        assert_eq!(feed.subscriber_count(&watched).await, 1);
    }
}
