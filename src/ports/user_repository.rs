//! User repository port.
//!
//! Usernames are unique; the backend enforces it.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::user::{NewUser, User};

/// Repository port for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by username.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no user has this username
    /// - `DatabaseError` on storage failure
    async fn get_by_username(&self, username: &str) -> Result<User, DomainError>;

    /// Register a new user and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the username is taken
    /// - `DatabaseError` on storage failure
    async fn add(&self, user: NewUser) -> Result<User, DomainError>;
}
