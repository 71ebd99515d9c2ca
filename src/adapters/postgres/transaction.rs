//! PostgreSQL units of work.
//!
//! Each unit of work owns one database transaction. Its repositories share
//! that transaction through a [`PgExecutor::Transaction`], so every
//! statement they issue (including `FOR UPDATE` row locks) belongs to it.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{
    CommentRepository, PostRepository, TransactionManager, UnitOfWork, UserRepository,
};

use super::executor::{database_error, PgExecutor, SharedTransaction};
use super::{PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository};

/// Opens PostgreSQL transactions.
#[derive(Clone)]
pub struct PostgresTransactionManager {
    pool: PgPool,
}

impl PostgresTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PostgresTransactionManager {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error(e, "begin transaction"))?;

        Ok(Box::new(PostgresUnitOfWork::new(Arc::new(Mutex::new(Some(tx))))))
    }
}

/// An open PostgreSQL transaction with its scoped repositories.
///
/// Dropping it without commit lets sqlx roll the transaction back when the
/// connection returns to the pool.
pub struct PostgresUnitOfWork {
    tx: SharedTransaction,
    users: PostgresUserRepository,
    posts: PostgresPostRepository,
    comments: PostgresCommentRepository,
}

impl PostgresUnitOfWork {
    fn new(tx: SharedTransaction) -> Self {
        let executor = PgExecutor::Transaction(tx.clone());
        Self {
            users: PostgresUserRepository::with_executor(executor.clone()),
            posts: PostgresPostRepository::with_executor(executor.clone()),
            comments: PostgresCommentRepository::with_executor(executor),
            tx,
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn posts(&self) -> &dyn PostRepository {
        &self.posts
    }

    fn comments(&self) -> &dyn CommentRepository {
        &self.comments
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let tx = self.tx.lock().await.take();
        match tx {
            Some(tx) => tx
                .commit()
                .await
                .map_err(|e| database_error(e, "commit transaction")),
            None => Err(DomainError::new(
                ErrorCode::TransactionClosed,
                "Cannot commit: transaction already finished",
            )),
        }
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        let tx = self.tx.lock().await.take();
        match tx {
            Some(tx) => tx
                .rollback()
                .await
                .map_err(|e| database_error(e, "roll back transaction")),
            None => Err(DomainError::new(
                ErrorCode::TransactionClosed,
                "Cannot roll back: transaction already finished",
            )),
        }
    }
}
