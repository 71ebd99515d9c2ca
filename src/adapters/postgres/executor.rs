//! Query execution shared by the PostgreSQL repositories.
//!
//! A repository either talks to the pool directly or to the transaction of
//! the unit of work it belongs to. [`PgExecutor`] makes that choice explicit
//! so repository code is written once for both cases.

use std::sync::Arc;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode};

/// PostgreSQL error code for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

pub(super) type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A transaction shared between a unit of work and its repositories.
///
/// `None` once the transaction has been committed or rolled back.
pub(super) type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// Where a repository sends its statements.
#[derive(Clone)]
pub(super) enum PgExecutor {
    /// Autocommit statements on a pooled connection.
    Pool(PgPool),
    /// Statements inside an open transaction.
    Transaction(SharedTransaction),
}

impl PgExecutor {
    pub(super) fn in_transaction(&self) -> bool {
        matches!(self, PgExecutor::Transaction(_))
    }

    pub(super) async fn fetch_optional(
        &self,
        query: PgQuery<'_>,
        action: &str,
    ) -> Result<Option<PgRow>, DomainError> {
        let result = match self {
            PgExecutor::Pool(pool) => query.fetch_optional(pool).await,
            PgExecutor::Transaction(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard.as_mut().ok_or_else(|| transaction_closed(action))?;
                query.fetch_optional(&mut **tx).await
            }
        };
        result.map_err(|e| database_error(e, action))
    }

    pub(super) async fn fetch_all(
        &self,
        query: PgQuery<'_>,
        action: &str,
    ) -> Result<Vec<PgRow>, DomainError> {
        let result = match self {
            PgExecutor::Pool(pool) => query.fetch_all(pool).await,
            PgExecutor::Transaction(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard.as_mut().ok_or_else(|| transaction_closed(action))?;
                query.fetch_all(&mut **tx).await
            }
        };
        result.map_err(|e| database_error(e, action))
    }

    /// Run a statement that must return exactly one row, such as an
    /// `INSERT ... RETURNING`.
    pub(super) async fn fetch_one(
        &self,
        query: PgQuery<'_>,
        action: &str,
    ) -> Result<PgRow, DomainError> {
        self.fetch_optional(query, action).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to {}: statement returned no row", action),
            )
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

/// Classify a sqlx error at the repository boundary.
pub(super) fn database_error(e: sqlx::Error, action: &str) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let mut err = DomainError::new(
                ErrorCode::AlreadyExists,
                format!("Failed to {}: {}", action, db.message()),
            );
            if let Some(constraint) = db.constraint() {
                err = err.with_detail("constraint", constraint);
            }
            return err;
        }
    }
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
}

fn transaction_closed(action: &str) -> DomainError {
    DomainError::new(
        ErrorCode::TransactionClosed,
        format!("Failed to {}: transaction already finished", action),
    )
}

/// Read a typed column from a row.
pub(super) fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Failed to get {}: {}", name, e),
        )
    })
}

/// Append a row lock to a `SELECT` when running inside a transaction.
pub(super) fn with_lock(sql: &str, for_update: bool, executor: &PgExecutor) -> String {
    if for_update && executor.in_transaction() {
        format!("{} FOR UPDATE", sql)
    } else {
        sql.to_string()
    }
}
