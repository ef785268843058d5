//! Test utilities for database operations.
//!
//! Every [`TestStore`] is a private in-memory SQLite database with all
//! migrations applied, so tests run in parallel without shared state.

use crate::{ChangeFeed, Store, migrate};
use hifz_common::{AppError, AppResult};
use sea_orm::{ConnectOptions, ConnectionTrait, Database};
use std::sync::Arc;
use tracing::info;

/// In-memory SQLite URL.
pub const MEMORY_URL: &str = "sqlite::memory:";

/// Builder for throwaway stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestStore;

impl TestStore {
    /// Open a fresh migrated store.
    ///
    /// The pool holds exactly one connection: every connection to
    /// `sqlite::memory:` is its own database. Inside a transaction only the
    /// transaction handle may be used.
    pub async fn open() -> AppResult<Store> {
        let mut opt = ConnectOptions::new(MEMORY_URL);
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(opt)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        migrate(&db).await?;

        info!("Opened in-memory test store");
        Ok(Store::new(Arc::new(db), ChangeFeed::default()))
    }

    /// Make every `operation` (`INSERT`, `UPDATE` or `DELETE`) on `table`
    /// abort while reads keep working.
    pub async fn reject_writes(store: &Store, table: &str, operation: &str) -> AppResult<()> {
        let operation = operation.to_uppercase();
        let sql = format!(
            "CREATE TRIGGER \"reject_{table}_{op}\" BEFORE {operation} ON \"{table}\" \
             BEGIN SELECT RAISE(ABORT, 'writes to {table} rejected'); END",
            op = operation.to_lowercase(),
        );
        store
            .connection()
            .execute_unprepared(&sql)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Drop a table so every later query on it fails.
    pub async fn break_table(store: &Store, table: &str) -> AppResult<()> {
        store
            .connection()
            .execute_unprepared(&format!("DROP TABLE \"{table}\""))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
