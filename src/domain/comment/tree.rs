//! Reply tree assembly.
//!
//! Input is one page of root comments (newest first) and the flat set of
//! every comment whose `root_id` belongs to that page, as returned by a
//! single batched query. Output is one [`CommentNode`] per root, in page
//! order, with replies nested beneath their parents.
//!
//! Sibling replies are ordered oldest first. Comments with equal
//! timestamps keep the relative order in which storage returned them
//! (reversed, since storage returns newest first).
//!
//! The tree is built with an explicit stack so that very deep reply chains
//! cannot overflow the call stack.

use std::collections::HashMap;
use std::vec;

use serde::Serialize;

use super::Comment;
use crate::domain::foundation::CommentId;

/// A comment with its nested replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn leaf(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }

    /// Number of comments in this subtree, including this one.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.replies.iter());
        }
        count
    }

    /// Always false: a node contains at least its own comment.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Builds reply trees for a page of root comments.
///
/// `roots` fixes the top-level order. `thread_comments` may include the
/// roots themselves; they are recognised by their missing `reply_to` and
/// never attached as replies.
pub fn assemble_threads(roots: Vec<Comment>, thread_comments: Vec<Comment>) -> Vec<CommentNode> {
    let mut children = group_by_parent(thread_comments);

    let threads: Vec<CommentNode> = roots
        .into_iter()
        .map(|root| build_subtree(root, &mut children))
        .collect();

    if !children.is_empty() {
        let orphaned: usize = children.values().map(Vec::len).sum();
        tracing::warn!(
            orphaned,
            "Dropping replies whose parent is not part of the fetched threads"
        );
    }

    threads
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn group_by_parent(comments: Vec<Comment>) -> HashMap<CommentId, Vec<Comment>> {
    let mut children: HashMap<CommentId, Vec<Comment>> = HashMap::new();

    // Storage order is newest first; reverse so the stable sort below
    // keeps equal timestamps oldest first.
    for comment in comments.into_iter().rev() {
        if let Some(parent) = comment.reply_to {
            children.entry(parent).or_default().push(comment);
        }
    }

    for siblings in children.values_mut() {
        siblings.sort_by_key(|c| c.created_at);
    }

    children
}

struct Frame {
    node: CommentNode,
    pending: vec::IntoIter<Comment>,
}

impl Frame {
    fn open(comment: Comment, children: &mut HashMap<CommentId, Vec<Comment>>) -> Self {
        let pending = children.remove(&comment.id).unwrap_or_default().into_iter();
        Self {
            node: CommentNode::leaf(comment),
            pending,
        }
    }
}

fn build_subtree(root: Comment, children: &mut HashMap<CommentId, Vec<Comment>>) -> CommentNode {
    let mut stack: Vec<Frame> = Vec::new();
    let mut current = Frame::open(root, children);

    loop {
        if let Some(child) = current.pending.next() {
            let next = Frame::open(child, children);
            stack.push(std::mem::replace(&mut current, next));
            continue;
        }

        match stack.pop() {
            Some(mut parent) => {
                parent.node.replies.push(current.node);
                current = parent;
            }
            None => return current.node,
        }
    }
}
