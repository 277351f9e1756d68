//! SQLite storage backend for tokenstore
//!
//! [`SqliteStorage`] owns the connection pool and schema migrations;
//! [`SqliteTokenRepository`] implements the token operations on that pool.
//! Expiry timestamps are stored as unix milliseconds.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tokenstore_core::TokenService;
//! use tokenstore_storage_sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), tokenstore_core::Error> {
//! let storage = SqliteStorage::connect("sqlite://tokens.db").await?;
//! storage.migrate().await?;
//!
//! let store = TokenService::new(Arc::new(storage.into_token_repository()));
//! # Ok(())
//! # }
//! ```

mod migrations;
pub mod repositories;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokenstore_core::{Error, error::StorageError};
use tokenstore_migration::{migrate_down, migrate_up};

pub use migrations::{MIGRATIONS, SqliteMigrationExecutor};
pub use repositories::SqliteTokenRepository;

#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database at `url`, creating the file if it does not exist.
    ///
    /// In-memory databases get a single long-lived connection so that every
    /// query sees the same database.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("Invalid SQLite connection URL", e))?
            .create_if_missing(true);

        let pool_options = if url.contains(":memory:") || url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("Failed to connect to SQLite", e))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        run_migrations(&self.pool).await
    }

    /// Roll back every applied migration, dropping the token table.
    ///
    /// Does nothing on a database that was never migrated.
    pub async fn rollback(&self) -> Result<(), Error> {
        let executor = SqliteMigrationExecutor::new(self.pool.clone());
        let reverted = migrate_down(&executor, MIGRATIONS).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to roll back migrations");
            StorageError::from(e)
        })?;
        tracing::info!(reverted, "Rolled back migrations");
        Ok(())
    }

    pub fn token_repository(&self) -> SqliteTokenRepository {
        SqliteTokenRepository::new(self.pool.clone())
    }

    pub fn into_token_repository(self) -> SqliteTokenRepository {
        SqliteTokenRepository::new(self.pool)
    }

    /// Close the pool. Later operations on repositories sharing it fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Apply every pending migration on `pool`.
pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<(), Error> {
    let executor = SqliteMigrationExecutor::new(pool.clone());
    let applied = migrate_up(&executor, MIGRATIONS).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to run migrations");
        StorageError::from(e)
    })?;
    tracing::info!(applied, "Token store schema is up to date");
    Ok(())
}

/// Log a sqlx failure and classify it for the caller.
pub(crate) fn map_sqlx_error(context: &str, err: sqlx::Error) -> Error {
    tracing::error!(error = %err, "{context}");

    let storage_error = match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StorageError::Constraint(format!("{context}: {}", db.message()))
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_) => StorageError::Connection(format!("{context}: {err}")),
        _ => StorageError::Database(format!("{context}: {err}")),
    };

    Error::Storage(storage_error)
}
