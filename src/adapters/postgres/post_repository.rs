//! PostgreSQL implementation of PostRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, PostId, Timestamp, UserId};
use crate::domain::post::{NewPost, Post};
use crate::ports::{LockMode, PostRepository};

use super::executor::{column, with_lock, PgExecutor};

const POST_COLUMNS: &str = "id, user_id, title, content, comments_allowed, created_at";

/// PostgreSQL implementation of PostRepository.
#[derive(Clone)]
pub struct PostgresPostRepository {
    executor: PgExecutor,
}

impl PostgresPostRepository {
    /// Creates a repository running autocommit statements on the pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            executor: PgExecutor::Pool(pool),
        }
    }

    pub(super) fn with_executor(executor: PgExecutor) -> Self {
        Self { executor }
    }

    async fn set_comments_allowed(&self, id: &PostId, allowed: bool) -> Result<Post, DomainError> {
        let sql = format!(
            "UPDATE posts SET comments_allowed = $2 WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        );
        let query = sqlx::query(&sql).bind(id.as_uuid()).bind(allowed);

        let row = self
            .executor
            .fetch_optional(query, "update post comments_allowed")
            .await?;

        match row {
            Some(row) => row_to_post(&row),
            None => Err(not_found(id)),
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn add(&self, post: NewPost) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO posts (id, user_id, title, content, comments_allowed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        let query = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(post.owner_id.as_uuid())
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.comments_allowed)
            .bind(*Timestamp::now().as_datetime());

        let row = self.executor.fetch_one(query, "insert post").await?;
        row_to_post(&row)
    }

    async fn get_by_id(&self, id: &PostId, lock: LockMode) -> Result<Post, DomainError> {
        let sql = with_lock(
            &format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS),
            lock.is_for_update(),
            &self.executor,
        );
        let query = sqlx::query(&sql).bind(id.as_uuid());

        let row = self.executor.fetch_optional(query, "fetch post").await?;

        match row {
            Some(row) => row_to_post(&row),
            None => Err(not_found(id)),
        }
    }

    async fn get_all(&self) -> Result<Vec<Post>, DomainError> {
        let sql = format!(
            "SELECT {} FROM posts ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        );
        let rows = self
            .executor
            .fetch_all(sqlx::query(&sql), "fetch posts")
            .await?;

        rows.iter().map(row_to_post).collect()
    }

    async fn disable_comments(&self, id: &PostId) -> Result<Post, DomainError> {
        self.set_comments_allowed(id, false).await
    }

    async fn enable_comments(&self, id: &PostId) -> Result<Post, DomainError> {
        self.set_comments_allowed(id, true).await
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn not_found(id: &PostId) -> DomainError {
    DomainError::new(ErrorCode::PostNotFound, format!("Post not found: {}", id))
}

fn row_to_post(row: &PgRow) -> Result<Post, DomainError> {
    let id: Uuid = column(row, "id")?;
    let owner_id: Uuid = column(row, "user_id")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;

    Ok(Post {
        id: PostId::from_uuid(id),
        owner_id: UserId::from_uuid(owner_id),
        title: column(row, "title")?,
        content: column(row, "content")?,
        comments_allowed: column(row, "comments_allowed")?,
        created_at: Timestamp::from_datetime(created_at),
    })
}
