use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokenstore_migration::{
    MIGRATION_TABLE, MigrationExecutor, MigrationRecord, Result, SchemaMigration,
};

/// Schema for the Postgres backend, oldest first.
pub const MIGRATIONS: &[SchemaMigration] = &[SchemaMigration {
    version: 1,
    name: "CreatePasswordlessTokensTable",
    up: &[
        r#"CREATE TABLE IF NOT EXISTS passwordless_tokens (
            uid TEXT PRIMARY KEY,
            token_hash TEXT NOT NULL UNIQUE,
            expires_at TIMESTAMPTZ NOT NULL,
            referer TEXT
        )"#,
        "CREATE INDEX IF NOT EXISTS idx_passwordless_tokens_expires_at ON passwordless_tokens(expires_at)",
    ],
    down: &[
        "DROP INDEX IF EXISTS idx_passwordless_tokens_expires_at",
        "DROP TABLE IF EXISTS passwordless_tokens",
    ],
}];

/// Runs [`MIGRATIONS`] against a Postgres pool.
pub struct PostgresMigrationExecutor {
    pool: PgPool,
}

impl PostgresMigrationExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MigrationExecutor for PostgresMigrationExecutor {
    async fn ensure_migration_table(&self) -> Result<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at BIGINT NOT NULL
            )"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn applied_migrations(&self) -> Result<Vec<MigrationRecord>> {
        let records = sqlx::query_as::<_, MigrationRecord>(&format!(
            "SELECT version, name, applied_at FROM {MIGRATION_TABLE} ORDER BY version"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn apply(&self, migration: &SchemaMigration) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in migration.up {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }
        sqlx::query(&format!(
            "INSERT INTO {MIGRATION_TABLE} (version, name, applied_at) VALUES ($1, $2, $3)"
        ))
        .bind(migration.version)
        .bind(migration.name)
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn revert(&self, migration: &SchemaMigration) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in migration.down {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }
        sqlx::query(&format!("DELETE FROM {MIGRATION_TABLE} WHERE version = $1"))
            .bind(migration.version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
