//! SQLite implementation of the token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokenstore_core::{Error, TokenRecord, error::StorageError, repositories::TokenRepository};

use crate::{map_sqlx_error, run_migrations};

/// SQLite repository for passwordless tokens.
#[derive(Debug, Clone)]
pub struct SqliteTokenRepository {
    pool: SqlitePool,
}

impl SqliteTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteTokenRow {
    uid: String,
    token_hash: String,
    expires_at: i64,
    referer: Option<String>,
}

impl TryFrom<SqliteTokenRow> for TokenRecord {
    type Error = Error;

    fn try_from(row: SqliteTokenRow) -> Result<Self, Self::Error> {
        let expires_at = DateTime::from_timestamp_millis(row.expires_at).ok_or_else(|| {
            StorageError::Database(format!(
                "Stored expiry {} is out of range",
                row.expires_at
            ))
        })?;

        Ok(TokenRecord::new(
            row.uid,
            row.token_hash,
            expires_at,
            row.referer,
        ))
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    async fn upsert(&self, record: &TokenRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO passwordless_tokens (uid, token_hash, expires_at, referer)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(uid) DO UPDATE SET
                token_hash = excluded.token_hash,
                expires_at = excluded.expires_at,
                referer = excluded.referer
            "#,
        )
        .bind(&record.uid)
        .bind(&record.token_hash)
        .bind(record.expires_at.timestamp_millis())
        .bind(&record.referer)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to store token", e))?;

        Ok(())
    }

    async fn find_unexpired(
        &self,
        uid: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TokenRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteTokenRow>(
            r#"
            SELECT uid, token_hash, expires_at, referer
            FROM passwordless_tokens
            WHERE uid = ? AND expires_at >= ?
            "#,
        )
        .bind(uid)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find token", e))?;

        row.map(TokenRecord::try_from).transpose()
    }

    async fn delete(&self, uid: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM passwordless_tokens WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete token", e))?;

        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Error> {
        sqlx::query("DELETE FROM passwordless_tokens")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete all tokens", e))?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM passwordless_tokens WHERE expires_at < ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete expired tokens", e))?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM passwordless_tokens")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to count tokens", e))?;

        Ok(count as u64)
    }

    async fn migrate(&self) -> Result<(), Error> {
        run_migrations(&self.pool).await
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Health check failed", e))?;
        Ok(())
    }
}
