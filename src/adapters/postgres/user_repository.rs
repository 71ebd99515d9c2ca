//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::user::{NewUser, User};
use crate::ports::UserRepository;

use super::executor::{column, PgExecutor};

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    executor: PgExecutor,
}

impl PostgresUserRepository {
    /// Creates a repository running autocommit statements on the pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            executor: PgExecutor::Pool(pool),
        }
    }

    pub(super) fn with_executor(executor: PgExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_by_username(&self, username: &str) -> Result<User, DomainError> {
        let query = sqlx::query(
            r#"
            SELECT id, username, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username);

        let row = self.executor.fetch_optional(query, "fetch user").await?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(DomainError::new(
                ErrorCode::UserNotFound,
                format!("User not found: {}", username),
            )),
        }
    }

    async fn add(&self, user: NewUser) -> Result<User, DomainError> {
        let query = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.password_hash);

        let row = self.executor.fetch_one(query, "insert user").await?;
        row_to_user(&row)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn row_to_user(row: &PgRow) -> Result<User, DomainError> {
    let id: Uuid = column(row, "id")?;
    Ok(User {
        id: UserId::from_uuid(id),
        username: column(row, "username")?,
        password_hash: column(row, "password_hash")?,
    })
}
