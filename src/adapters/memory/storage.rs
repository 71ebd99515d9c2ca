//! Shared state behind the in-memory repositories.
//!
//! Each entity collection has its own lock, so work on users, posts and
//! comments never contends. The table locks are synchronous and never held
//! across an await point. Row locks requested with `LockMode::ForUpdate`
//! are async mutexes, since a unit of work holds them across awaits.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::comment::Comment;
use crate::domain::foundation::{CommentId, PostId, Timestamp, UserId};
use crate::domain::post::Post;
use crate::domain::user::User;

use super::transaction::Undo;

/// Lockable rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum RowKey {
    Post(PostId),
    Comment(CommentId),
}

/// Rows keyed by id and kept in insertion order.
#[derive(Debug)]
pub(super) struct SequencedTable<K, V> {
    rows: BTreeMap<u64, V>,
    index: HashMap<K, u64>,
}

impl<K: Eq + Hash + Copy, V> SequencedTable<K, V> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub(super) fn get(&self, id: &K) -> Option<&V> {
        self.index.get(id).and_then(|seq| self.rows.get(seq))
    }

    pub(super) fn get_mut(&mut self, id: &K) -> Option<&mut V> {
        match self.index.get(id) {
            Some(seq) => self.rows.get_mut(seq),
            None => None,
        }
    }

    pub(super) fn insert(&mut self, seq: u64, id: K, row: V) {
        self.index.insert(id, seq);
        self.rows.insert(seq, row);
    }

    pub(super) fn remove(&mut self, id: &K) -> Option<V> {
        let seq = self.index.remove(id)?;
        self.rows.remove(&seq)
    }

    /// Rows from the most recently inserted to the oldest.
    pub(super) fn newest_first(&self) -> impl Iterator<Item = &V> {
        self.rows.values().rev()
    }

    pub(super) fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Default)]
pub(super) struct UserTable {
    by_id: HashMap<UserId, User>,
    by_username: HashMap<String, UserId>,
}

impl UserTable {
    pub(super) fn get_by_username(&self, username: &str) -> Option<&User> {
        self.by_username
            .get(username)
            .and_then(|id| self.by_id.get(id))
    }

    pub(super) fn contains_username(&self, username: &str) -> bool {
        self.by_username.contains_key(username)
    }

    pub(super) fn insert(&mut self, user: User) {
        self.by_username.insert(user.username.clone(), user.id);
        self.by_id.insert(user.id, user);
    }

    pub(super) fn remove(&mut self, id: &UserId) {
        if let Some(user) = self.by_id.remove(id) {
            self.by_username.remove(&user.username);
        }
    }

    pub(super) fn len(&self) -> usize {
        self.by_id.len()
    }
}

pub(super) type PostTable = SequencedTable<PostId, Post>;
pub(super) type CommentTable = SequencedTable<CommentId, Comment>;

/// Backing store shared by every in-memory repository and unit of work.
#[derive(Debug)]
pub struct InMemoryStorage {
    users: RwLock<UserTable>,
    posts: RwLock<PostTable>,
    comments: RwLock<CommentTable>,
    row_locks: Mutex<HashMap<RowKey, Arc<tokio::sync::Mutex<()>>>>,
    sequence: AtomicU64,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(UserTable::default()),
            posts: RwLock::new(SequencedTable::new()),
            comments: RwLock::new(SequencedTable::new()),
            row_locks: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Get the number of stored users
    pub fn user_count(&self) -> usize {
        self.users_read().len()
    }

    /// Get the number of stored posts
    pub fn post_count(&self) -> usize {
        self.posts_read().len()
    }

    /// Get the number of stored comments
    pub fn comment_count(&self) -> usize {
        self.comments_read().len()
    }

    pub(super) fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    pub(super) fn users_read(&self) -> RwLockReadGuard<'_, UserTable> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn users_write(&self) -> RwLockWriteGuard<'_, UserTable> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn posts_read(&self) -> RwLockReadGuard<'_, PostTable> {
        self.posts.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn posts_write(&self) -> RwLockWriteGuard<'_, PostTable> {
        self.posts.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn comments_read(&self) -> RwLockReadGuard<'_, CommentTable> {
        self.comments.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn comments_write(&self) -> RwLockWriteGuard<'_, CommentTable> {
        self.comments.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creation time for a row inserted while holding a table write lock.
    ///
    /// Taking the clock under the lock keeps creation times in insertion
    /// order within a table.
    pub(super) fn stamp(&self) -> (u64, Timestamp) {
        (self.next_sequence(), Timestamp::now())
    }

    pub(super) fn row_lock(&self, key: RowKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key).or_default().clone()
    }

    /// Forget row locks nobody holds or waits for.
    pub(super) fn prune_row_locks(&self) {
        let mut locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Revert journaled writes, most recent first.
    pub(super) fn undo(&self, journal: Vec<Undo>) {
        for entry in journal.into_iter().rev() {
            match entry {
                Undo::UserAdded(id) => self.users_write().remove(&id),
                Undo::PostAdded(id) => {
                    self.posts_write().remove(&id);
                }
                Undo::CommentAdded(id) => {
                    self.comments_write().remove(&id);
                }
                Undo::CommentsAllowedChanged { post_id, previous } => {
                    if let Some(post) = self.posts_write().get_mut(&post_id) {
                        post.comments_allowed = previous;
                    }
                }
            }
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequenced_table_iterates_newest_first() {
        let mut table: SequencedTable<u32, &str> = SequencedTable::new();
        table.insert(0, 10, "a");
        table.insert(1, 20, "b");
        table.insert(2, 30, "c");

        let rows: Vec<_> = table.newest_first().copied().collect();
        assert_eq!(rows, vec!["c", "b", "a"]);
    }

    #[test]
    fn sequenced_table_remove_drops_row_and_index() {
        let mut table: SequencedTable<u32, &str> = SequencedTable::new();
        table.insert(0, 10, "a");

        assert_eq!(table.remove(&10), Some("a"));
        assert!(table.get(&10).is_none());
        assert_eq!(table.len(), 0);
        assert_eq!(table.remove(&10), None);
    }

    #[test]
    fn user_table_indexes_by_username() {
        let mut table = UserTable::default();
        let user = crate::domain::user::NewUser::new("alice", "h").into_user(UserId::new());
        let id = user.id;
        table.insert(user);

        assert!(table.contains_username("alice"));
        assert_eq!(table.get_by_username("alice").map(|u| u.id), Some(id));

        table.remove(&id);
        assert!(!table.contains_username("alice"));
    }

    #[test]
    fn row_locks_are_shared_per_key_and_pruned() {
        let storage = InMemoryStorage::new();
        let key = RowKey::Post(PostId::new());

        let first = storage.row_lock(key);
        let second = storage.row_lock(key);
        assert!(Arc::ptr_eq(&first, &second));

        drop(first);
        drop(second);
        storage.prune_row_locks();
        assert!(storage
            .row_locks
            .lock()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn sequence_is_monotonic() {
        let storage = InMemoryStorage::new();
        let (a, _) = storage.stamp();
        let (b, _) = storage.stamp();
        assert!(b > a);
    }
}
