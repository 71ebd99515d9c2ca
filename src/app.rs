//! Application wiring.
//!
//! Chooses the storage backend once, at startup, and hands the services
//! trait objects for it. Nothing downstream knows which backend is active.

use std::sync::Arc;

use thiserror::Error;

use crate::adapters::auth::{Argon2PasswordHasher, JwtTokenIssuer};
use crate::adapters::broadcast::CommentBroadcaster;
use crate::adapters::memory::{
    InMemoryCommentRepository, InMemoryPostRepository, InMemoryStorage,
    InMemoryTransactionManager, InMemoryUserRepository,
};
use crate::adapters::postgres::{
    self, PostgresCommentRepository, PostgresPostRepository, PostgresTransactionManager,
    PostgresUserRepository,
};
use crate::application::{CommentService, PostService, UserService};
use crate::config::{AppConfig, AuthConfig, StorageKind, ValidationError};
use crate::ports::{
    CommentRepository, PostRepository, TokenIssuer, TransactionManager, UserRepository,
};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to apply migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// One backend's worth of port implementations.
struct Backend {
    transactions: Arc<dyn TransactionManager>,
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl Backend {
    fn in_memory() -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        Self {
            transactions: Arc::new(InMemoryTransactionManager::new(storage.clone())),
            users: Arc::new(InMemoryUserRepository::new(storage.clone())),
            posts: Arc::new(InMemoryPostRepository::new(storage.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(storage)),
        }
    }

    async fn postgres(config: &AppConfig) -> Result<Self, StartupError> {
        let pool = postgres::connect(&config.database).await?;
        if config.database.run_migrations {
            postgres::run_migrations(&pool).await?;
        }

        Ok(Self {
            transactions: Arc::new(PostgresTransactionManager::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool)),
        })
    }
}

/// The assembled services, ready for a transport layer to call.
pub struct Application {
    pub posts: PostService,
    pub comments: CommentService,
    pub users: UserService,
    /// Live comment feed; transports subscribe here.
    pub feed: Arc<CommentBroadcaster>,
    pub tokens: Arc<dyn TokenIssuer>,
}

impl Application {
    /// Validate `config` and build the application on the configured backend.
    pub async fn build(config: &AppConfig) -> Result<Self, StartupError> {
        config.validate()?;

        let backend = match config.storage.kind {
            StorageKind::InMemory => Backend::in_memory(),
            StorageKind::Postgres => Backend::postgres(config).await?,
        };

        tracing::info!(
            storage = ?config.storage.kind,
            environment = ?config.runtime.environment,
            "Application initialized"
        );

        Ok(Self::assemble(
            backend,
            &config.auth,
            config.comments.default_page_size,
        ))
    }

    /// Build the application on a fresh in-memory backend.
    pub fn in_memory(auth: &AuthConfig) -> Self {
        Self::assemble(
            Backend::in_memory(),
            auth,
            crate::ports::DEFAULT_ROOT_PAGE_SIZE,
        )
    }

    fn assemble(backend: Backend, auth: &AuthConfig, default_page_size: u32) -> Self {
        let feed = Arc::new(CommentBroadcaster::new());
        let tokens: Arc<dyn TokenIssuer> = Arc::new(JwtTokenIssuer::from_config(auth));

        Self {
            posts: PostService::new(
                backend.transactions.clone(),
                backend.posts,
                backend.comments,
            )
            .with_default_page_size(default_page_size),
            comments: CommentService::new(backend.transactions, feed.clone()),
            users: UserService::new(
                backend.users,
                Arc::new(Argon2PasswordHasher::new()),
                tokens.clone(),
            ),
            feed,
            tokens,
        }
    }
}
