//! Transaction boundary for service operations.
//!
//! [`run_in_transaction`] opens a unit of work, runs the operation against
//! it and then commits or rolls back:
//!
//! - `Ok` commits; a commit failure is logged and becomes `Internal`
//! - `Err` rolls back and returns the operation's error unchanged, unless
//!   the rollback itself fails, which becomes `Internal`
//! - an expired caller deadline rolls back and becomes `Internal`
//! - a panic rolls back and then resumes unwinding
//!
//! ```ignore
//! let post = run_in_transaction(manager, &metadata, move |uow| {
//!     Box::pin(async move {
//!         let post = uow.posts().get_by_id(&post_id, LockMode::ForUpdate).await?;
//!         Ok(uow.posts().disable_comments(&post.id).await?)
//!     })
//! })
//! .await?;
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::domain::foundation::CommandMetadata;
use crate::ports::{TransactionManager, UnitOfWork};

use super::ServiceError;

/// Run `work` inside a fresh unit of work.
///
/// The closure receives the unit of work by reference and must return a
/// boxed future borrowing it, the same shape as `sqlx::Connection::transaction`.
pub async fn run_in_transaction<T, F>(
    manager: &dyn TransactionManager,
    metadata: &CommandMetadata,
    work: F,
) -> Result<T, ServiceError>
where
    T: Send,
    F: for<'u> FnOnce(&'u dyn UnitOfWork) -> BoxFuture<'u, Result<T, ServiceError>> + Send,
{
    let deadline = metadata.deadline();

    let uow = match within_deadline(deadline, manager.begin()).await {
        Some(Ok(uow)) => uow,
        Some(Err(e)) => return Err(ServiceError::internal("Failed to begin transaction", &e)),
        None => {
            tracing::warn!("Deadline expired before the transaction started");
            return Err(ServiceError::Internal);
        }
    };

    let outcome = {
        let work = AssertUnwindSafe(work(uow.as_ref())).catch_unwind();
        within_deadline(deadline, work).await
    };

    match outcome {
        Some(Ok(Ok(value))) => {
            uow.commit()
                .await
                .map_err(|e| ServiceError::internal("Failed to commit transaction", &e))?;
            Ok(value)
        }
        Some(Ok(Err(err))) => {
            tracing::debug!(error = %err, "Rolling back transaction");
            uow.rollback()
                .await
                .map_err(|e| ServiceError::internal("Failed to roll back transaction", &e))?;
            Err(err)
        }
        Some(Err(panic)) => {
            tracing::error!("Operation panicked inside a transaction, rolling back");
            if let Err(e) = uow.rollback().await {
                tracing::error!(error = %e, "Failed to roll back transaction after panic");
            }
            std::panic::resume_unwind(panic)
        }
        None => {
            tracing::warn!(
                correlation_id = %metadata.correlation_id(),
                "Transaction deadline exceeded, rolling back"
            );
            if let Err(e) = uow.rollback().await {
                tracing::error!(error = %e, "Failed to roll back transaction after timeout");
            }
            Err(ServiceError::Internal)
        }
    }
}

/// `None` if `deadline` passes before `fut` completes.
async fn within_deadline<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => {
            tokio::time::timeout_at(tokio::time::Instant::from_std(deadline), fut)
                .await
                .ok()
        }
        None => Some(fut.await),
    }
}
