//! PostgreSQL implementation of CommentRepository.
//!
//! Thread reads rely on two indexes created by the initial migration:
//! `(post_id, created_at DESC, id DESC) WHERE reply_to IS NULL` for root pages and
//! `(root_id)` for whole-thread fetches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::comment::{Comment, NewComment};
use crate::domain::foundation::{CommentId, DomainError, ErrorCode, PostId, Timestamp, UserId};
use crate::ports::{CommentPage, CommentRepository, LockMode};

use super::executor::{column, with_lock, PgExecutor};

const COMMENT_COLUMNS: &str = "id, post_id, user_id, root_id, reply_to, content, created_at";

/// PostgreSQL implementation of CommentRepository.
#[derive(Clone)]
pub struct PostgresCommentRepository {
    executor: PgExecutor,
}

impl PostgresCommentRepository {
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
impl CommentRepository for PostgresCommentRepository {
    async fn add(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let id = Uuid::new_v4();
        let root_id = comment.root_id.map(|r| *r.as_uuid()).unwrap_or(id);
        let reply_to = comment.reply_to.map(|r| *r.as_uuid());

        let sql = format!(
            r#"
            INSERT INTO comments (id, post_id, user_id, root_id, reply_to, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        );
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(comment.post_id.as_uuid())
            .bind(comment.author_id.as_uuid())
            .bind(root_id)
            .bind(reply_to)
            .bind(&comment.content)
            .bind(*Timestamp::now().as_datetime());

        let row = self.executor.fetch_one(query, "insert comment").await?;
        row_to_comment(&row)
    }

    async fn get_by_id(&self, id: &CommentId, lock: LockMode) -> Result<Comment, DomainError> {
        let sql = with_lock(
            &format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS),
            lock.is_for_update(),
            &self.executor,
        );
        let query = sqlx::query(&sql).bind(id.as_uuid());

        let row = self.executor.fetch_optional(query, "fetch comment").await?;

        match row {
            Some(row) => row_to_comment(&row),
            None => Err(DomainError::new(
                ErrorCode::CommentNotFound,
                format!("Comment not found: {}", id),
            )),
        }
    }

    async fn get_root_comments_by_post_id(
        &self,
        post_id: &PostId,
        page: CommentPage,
    ) -> Result<Vec<Comment>, DomainError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM comments
            WHERE post_id = $1 AND reply_to IS NULL
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            COMMENT_COLUMNS
        );
        let query = sqlx::query(&sql)
            .bind(post_id.as_uuid())
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.offset()));

        let rows = self
            .executor
            .fetch_all(query, "fetch root comments")
            .await?;

        rows.iter().map(row_to_comment).collect()
    }

    async fn get_children_comments_by_root_ids(
        &self,
        root_ids: &[CommentId],
    ) -> Result<Vec<Comment>, DomainError> {
        if root_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = root_ids.iter().map(|id| *id.as_uuid()).collect();
        let sql = format!(
            r#"
            SELECT {}
            FROM comments
            WHERE root_id = ANY($1)
            ORDER BY created_at DESC, id DESC
            "#,
            COMMENT_COLUMNS
        );
        let query = sqlx::query(&sql).bind(ids);

        let rows = self
            .executor
            .fetch_all(query, "fetch comment threads")
            .await?;

        rows.iter().map(row_to_comment).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn row_to_comment(row: &PgRow) -> Result<Comment, DomainError> {
    let id: Uuid = column(row, "id")?;
    let post_id: Uuid = column(row, "post_id")?;
    let author_id: Uuid = column(row, "user_id")?;
    let root_id: Uuid = column(row, "root_id")?;
    let reply_to: Option<Uuid> = column(row, "reply_to")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;

    Ok(Comment {
        id: CommentId::from_uuid(id),
        post_id: PostId::from_uuid(post_id),
        author_id: UserId::from_uuid(author_id),
        root_id: CommentId::from_uuid(root_id),
        reply_to: reply_to.map(CommentId::from_uuid),
        content: column(row, "content")?,
        created_at: Timestamp::from_datetime(created_at),
    })
}
