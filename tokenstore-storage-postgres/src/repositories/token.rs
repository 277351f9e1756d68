//! PostgreSQL implementation of the token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokenstore_core::{Error, TokenRecord, repositories::TokenRepository};

use crate::{map_sqlx_error, run_migrations};

/// PostgreSQL repository for passwordless tokens.
#[derive(Debug, Clone)]
pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostgresTokenRow {
    uid: String,
    token_hash: String, // bcrypt digest, never the plaintext
    expires_at: DateTime<Utc>,
    referer: Option<String>,
}

impl From<PostgresTokenRow> for TokenRecord {
    fn from(row: PostgresTokenRow) -> Self {
        TokenRecord::new(row.uid, row.token_hash, row.expires_at, row.referer)
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn upsert(&self, record: &TokenRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO passwordless_tokens (uid, token_hash, expires_at, referer)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (uid) DO UPDATE SET
                token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                referer = EXCLUDED.referer
            "#,
        )
        .bind(&record.uid)
        .bind(&record.token_hash)
        .bind(record.expires_at)
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
        let row = sqlx::query_as::<_, PostgresTokenRow>(
            r#"
            SELECT uid, token_hash, expires_at, referer
            FROM passwordless_tokens
            WHERE uid = $1 AND expires_at >= $2
            "#,
        )
        .bind(uid)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find token", e))?;

        Ok(row.map(TokenRecord::from))
    }

    async fn delete(&self, uid: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM passwordless_tokens WHERE uid = $1")
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
        let result = sqlx::query("DELETE FROM passwordless_tokens WHERE expires_at < $1")
            .bind(now)
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
