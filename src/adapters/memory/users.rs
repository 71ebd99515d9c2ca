//! In-memory implementation of UserRepository.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::user::{NewUser, User};
use crate::ports::UserRepository;

use super::storage::InMemoryStorage;
use super::transaction::{Scope, Undo};

/// In-memory user repository.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<InMemoryStorage>,
    scope: Scope,
}

impl InMemoryUserRepository {
    /// Creates a repository whose calls run outside any unit of work.
    pub fn new(storage: Arc<InMemoryStorage>) -> Self {
        Self::scoped(storage, Scope::Direct)
    }

    pub(super) fn scoped(storage: Arc<InMemoryStorage>, scope: Scope) -> Self {
        Self { storage, scope }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.storage
            .users_read()
            .get_by_username(username)
            .cloned()
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UserNotFound,
                    format!("User not found: {}", username),
                )
            })
    }

    async fn add(&self, user: NewUser) -> Result<User, DomainError> {
        let mut users = self.storage.users_write();

        if users.contains_username(&user.username) {
            return Err(DomainError::new(
                ErrorCode::AlreadyExists,
                format!("Username already taken: {}", user.username),
            )
            .with_detail("field", "username"));
        }

        let user = user.into_user(UserId::new());
        users.insert(user.clone());
        self.scope.record(Undo::UserAdded(user.id));

        Ok(user)
    }
}
