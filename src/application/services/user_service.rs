//! UserService - Login-or-register and token issuance.

use std::sync::Arc;

use crate::application::ServiceError;
use crate::domain::foundation::ErrorCode;
use crate::domain::user::{NewUser, User};
use crate::ports::{AccessToken, PasswordHasher, TokenIssuer, UserRepository};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Log in, registering the username first if it is not taken.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` if the password does not match, or if another
    ///   request registered the same username concurrently
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessToken, ServiceError> {
        let user = match self.users.get_by_username(username).await {
            Ok(user) => {
                self.check_password(&user, password)?;
                user
            }
            Err(e) if e.code == ErrorCode::UserNotFound => self.register(username, password).await?,
            Err(e) => return Err(e.into()),
        };

        let token = self.tokens.issue(&user.id).await?;
        tracing::debug!(user_id = %user.id, "Issued access token");
        Ok(token)
    }

    async fn register(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let password_hash = self.hasher.hash(password)?;

        match self.users.add(NewUser::new(username, password_hash)).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User registered");
                Ok(user)
            }
            Err(e) if e.code == ErrorCode::AlreadyExists => {
                tracing::debug!("Username registered concurrently");
                Err(ServiceError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn check_password(&self, user: &User, password: &str) -> Result<(), ServiceError> {
        if self.hasher.verify(password, &user.password_hash)? {
            Ok(())
        } else {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            Err(ServiceError::InvalidCredentials)
        }
    }
}
