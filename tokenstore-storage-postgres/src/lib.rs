//! PostgreSQL storage backend for tokenstore
//!
//! [`PostgresStorage`] owns the connection pool and schema migrations;
//! [`PostgresTokenRepository`] implements the token operations on that pool.
//! Expiry timestamps are stored as `TIMESTAMPTZ`.

mod migrations;
pub mod repositories;

use sqlx::PgPool;
use tokenstore_core::{Error, error::StorageError};
use tokenstore_migration::{migrate_down, migrate_up};

pub use migrations::{MIGRATIONS, PostgresMigrationExecutor};
pub use repositories::PostgresTokenRepository;

#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| map_sqlx_error("Failed to connect to Postgres", e))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        run_migrations(&self.pool).await
    }

    /// Roll back every applied migration, dropping the token table.
    ///
    /// Does nothing on a database that was never migrated.
    pub async fn rollback(&self) -> Result<(), Error> {
        let executor = PostgresMigrationExecutor::new(self.pool.clone());
        let reverted = migrate_down(&executor, MIGRATIONS).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to roll back migrations");
            StorageError::from(e)
        })?;
        tracing::info!(reverted, "Rolled back migrations");
        Ok(())
    }

    pub fn token_repository(&self) -> PostgresTokenRepository {
        PostgresTokenRepository::new(self.pool.clone())
    }

    pub fn into_token_repository(self) -> PostgresTokenRepository {
        PostgresTokenRepository::new(self.pool)
    }

    /// Close the pool. Later operations on repositories sharing it fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Apply every pending migration on `pool`.
pub(crate) async fn run_migrations(pool: &PgPool) -> Result<(), Error> {
    let executor = PostgresMigrationExecutor::new(pool.clone());
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
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Connection(format!("{context}: {err}")),
        _ => StorageError::Database(format!("{context}: {err}")),
    };

    Error::Storage(storage_error)
}
