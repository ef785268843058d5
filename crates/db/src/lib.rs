//! Database layer for hifz-tracker.
//!
//! The store behaves as a document database: one entity per collection,
//! live queries through [`live::watch`], and atomic multi-document batches
//! through sea-orm transactions.

pub mod codes;
pub mod entities;
pub mod feed;
pub mod live;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use hifz_common::{AppError, Config};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, SqlErr,
    TransactionTrait,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::log::LevelFilter;

pub use feed::{Change, ChangeFeed, ChangeKind, Collection};
pub use live::LiveStream;

/// Handle to the document store: a connection pool plus its change feed.
#[derive(Clone)]
pub struct Store {
    db: Arc<DatabaseConnection>,
    feed: ChangeFeed,
}

impl Store {
    /// Wrap an existing connection.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// The change feed.
    #[must_use]
    pub const fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Start an atomic write batch.
    ///
    /// Nothing is visible until [`DatabaseTransaction::commit`]; dropping the
    /// transaction rolls it back. Publish changes only after committing.
    pub async fn begin(&self) -> Result<DatabaseTransaction, AppError> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))
    }
}

/// Map a failed write; a unique-constraint violation is a
/// [`AppError::Conflict`].
#[must_use]
pub fn write_error(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        _ => AppError::WriteFailure(e.to_string()),
    }
}

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Connect, migrate and wrap the pool in a [`Store`].
pub async fn open(config: &Config) -> Result<Store, AppError> {
    let db = init(config).await?;
    migrate(&db).await?;
    tracing::info!("Database ready");
    Ok(Store::new(
        Arc::new(db),
        ChangeFeed::new(config.database.change_feed_capacity),
    ))
}
