//! Versioned schema migrations for the SQL token repositories
//!
//! A backend describes its schema as a list of [`SchemaMigration`]s, each a
//! set of SQL statements to apply and to revert. It implements the small
//! [`MigrationExecutor`] trait for its pool; [`migrate_up`] and
//! [`migrate_down`] hold the ordering and bookkeeping for every backend.
//!
//! Applied versions are recorded in [`MIGRATION_TABLE`]. Both entry points
//! create that table on demand, so rolling back a database that was never
//! migrated is a no-op.

use async_trait::async_trait;
use thiserror::Error;
use tokenstore_core::error::StorageError;

/// Table recording which migrations have been applied.
pub const MIGRATION_TABLE: &str = "_tokenstore_migrations";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<MigrationError> for StorageError {
    fn from(err: MigrationError) -> Self {
        StorageError::Migration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

/// One schema change, expressed as SQL statements run in order.
#[derive(Debug, Clone, Copy)]
pub struct SchemaMigration {
    pub version: i64,
    pub name: &'static str,
    pub up: &'static [&'static str],
    pub down: &'static [&'static str],
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: i64, // unix seconds
}

/// Database access a backend provides to the migration runner.
///
/// `apply` and `revert` must run the statements and update
/// [`MIGRATION_TABLE`] in a single transaction.
#[async_trait]
pub trait MigrationExecutor: Send + Sync {
    /// Create [`MIGRATION_TABLE`] if it does not exist
    async fn ensure_migration_table(&self) -> Result<()>;

    /// Applied migrations, ordered by version
    async fn applied_migrations(&self) -> Result<Vec<MigrationRecord>>;

    async fn apply(&self, migration: &SchemaMigration) -> Result<()>;

    async fn revert(&self, migration: &SchemaMigration) -> Result<()>;
}

/// Reject a migration list that is not ordered by strictly increasing version.
pub fn check_order(migrations: &[SchemaMigration]) -> Result<()> {
    for pair in migrations.windows(2) {
        if pair[0].version >= pair[1].version {
            return Err(MigrationError::Migration(format!(
                "Migration {} ({}) must come after {} ({})",
                pair[1].name, pair[1].version, pair[0].name, pair[0].version
            )));
        }
    }
    Ok(())
}

/// Migrations from `migrations` whose version is not in `applied`, oldest first.
pub fn pending<'a>(
    migrations: &'a [SchemaMigration],
    applied: &[MigrationRecord],
) -> Vec<&'a SchemaMigration> {
    migrations
        .iter()
        .filter(|m| !applied.iter().any(|record| record.version == m.version))
        .collect()
}

/// Migrations from `migrations` that are recorded in `applied`, newest first.
pub fn reversible<'a>(
    migrations: &'a [SchemaMigration],
    applied: &[MigrationRecord],
) -> Vec<&'a SchemaMigration> {
    migrations
        .iter()
        .rev()
        .filter(|m| applied.iter().any(|record| record.version == m.version))
        .collect()
}

/// Apply every pending migration. Returns how many were applied.
pub async fn migrate_up<E>(executor: &E, migrations: &[SchemaMigration]) -> Result<usize>
where
    E: MigrationExecutor + ?Sized,
{
    check_order(migrations)?;
    executor.ensure_migration_table().await?;

    let applied = executor.applied_migrations().await?;
    let pending = pending(migrations, &applied);
    for migration in &pending {
        tracing::info!(
            version = migration.version,
            migration = migration.name,
            "Applying migration"
        );
        executor.apply(migration).await?;
    }
    Ok(pending.len())
}

/// Revert every applied migration, newest first. Returns how many were reverted.
pub async fn migrate_down<E>(executor: &E, migrations: &[SchemaMigration]) -> Result<usize>
where
    E: MigrationExecutor + ?Sized,
{
    check_order(migrations)?;
    executor.ensure_migration_table().await?;

    let applied = executor.applied_migrations().await?;
    let reversible = reversible(migrations, &applied);
    for migration in &reversible {
        tracing::info!(
            version = migration.version,
            migration = migration.name,
            "Rolling back migration"
        );
        executor.revert(migration).await?;
    }
    Ok(reversible.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const FIRST: SchemaMigration = SchemaMigration {
        version: 1,
        name: "CreateTokens",
        up: &["CREATE TABLE tokens (uid TEXT)"],
        down: &["DROP TABLE tokens"],
    };
    const SECOND: SchemaMigration = SchemaMigration {
        version: 2,
        name: "IndexTokens",
        up: &["CREATE INDEX idx ON tokens(uid)"],
        down: &["DROP INDEX idx"],
    };

    fn record(version: i64) -> MigrationRecord {
        MigrationRecord {
            version,
            name: String::new(),
            applied_at: 0,
        }
    }

    /// Executor that records calls instead of touching a database.
    #[derive(Default)]
    struct RecordingExecutor {
        table_created: Mutex<bool>,
        applied: Mutex<Vec<i64>>,
        log: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MigrationExecutor for RecordingExecutor {
        async fn ensure_migration_table(&self) -> Result<()> {
            *self.table_created.lock().unwrap() = true;
            Ok(())
        }

        async fn applied_migrations(&self) -> Result<Vec<MigrationRecord>> {
            if !*self.table_created.lock().unwrap() {
                return Err(MigrationError::Migration("no such table".to_string()));
            }
            Ok(self.applied.lock().unwrap().iter().map(|v| record(*v)).collect())
        }

        async fn apply(&self, migration: &SchemaMigration) -> Result<()> {
            self.applied.lock().unwrap().push(migration.version);
            self.log.lock().unwrap().push(format!("up {}", migration.version));
            Ok(())
        }

        async fn revert(&self, migration: &SchemaMigration) -> Result<()> {
            self.applied.lock().unwrap().retain(|v| *v != migration.version);
            self.log.lock().unwrap().push(format!("down {}", migration.version));
            Ok(())
        }
    }

    #[test]
    fn test_migration_error_maps_to_storage_error() {
        let err = MigrationError::Migration("version 1 failed".to_string());
        let storage: StorageError = err.into();
        assert_eq!(
            storage.to_string(),
            "Migration error: Migration failed: version 1 failed"
        );
    }

    #[test]
    fn test_check_order() {
        assert!(check_order(&[]).is_ok());
        assert!(check_order(&[FIRST, SECOND]).is_ok());
        assert!(check_order(&[SECOND, FIRST]).is_err());
        assert!(check_order(&[FIRST, FIRST]).is_err());
    }

    #[test]
    fn test_pending_and_reversible() {
        let all = [FIRST, SECOND];
        let applied = [record(1)];

        let pending: Vec<i64> = pending(&all, &applied).iter().map(|m| m.version).collect();
        assert_eq!(pending, vec![2]);

        let applied = [record(1), record(2)];
        let reversible: Vec<i64> = reversible(&all, &applied)
            .iter()
            .map(|m| m.version)
            .collect();
        assert_eq!(reversible, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_migrate_up_is_idempotent() {
        let executor = RecordingExecutor::default();

        assert_eq!(migrate_up(&executor, &[FIRST, SECOND]).await.unwrap(), 2);
        assert_eq!(migrate_up(&executor, &[FIRST, SECOND]).await.unwrap(), 0);
        assert_eq!(*executor.log.lock().unwrap(), vec!["up 1", "up 2"]);
    }

    #[tokio::test]
    async fn test_migrate_down_reverts_newest_first() {
        let executor = RecordingExecutor::default();
        migrate_up(&executor, &[FIRST, SECOND]).await.unwrap();

        assert_eq!(migrate_down(&executor, &[FIRST, SECOND]).await.unwrap(), 2);
        assert_eq!(
            *executor.log.lock().unwrap(),
            vec!["up 1", "up 2", "down 2", "down 1"]
        );
    }

    #[tokio::test]
    async fn test_migrate_down_on_fresh_database_is_noop() {
        let executor = RecordingExecutor::default();

        assert_eq!(migrate_down(&executor, &[FIRST]).await.unwrap(), 0);
        assert!(executor.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_order_list_is_rejected_before_any_change() {
        let executor = RecordingExecutor::default();

        assert!(migrate_up(&executor, &[SECOND, FIRST]).await.is_err());
        assert!(executor.log.lock().unwrap().is_empty());
    }
}
