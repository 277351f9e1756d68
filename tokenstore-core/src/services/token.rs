use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::{
    Error,
    config::TokenStoreConfig,
    crypto::{BcryptHasher, CredentialHasher},
    error::{CryptoError, ValidationError},
    repositories::TokenRepository,
    storage::{Authentication, TokenRecord},
    store::TokenStore,
    validation::{normalize_referer, validate_lifetime, validate_token, validate_uid},
};

/// [`TokenStore`] implementation over any [`TokenRepository`].
///
/// Tokens are hashed with `H` before they reach the repository, and hashing
/// and verification run on tokio's blocking pool. The service holds no locks
/// of its own; per-uid atomicity comes from the repository's upsert.
///
/// # Thread Safety
///
/// The service is `Send + Sync` and is meant to be shared behind an `Arc`.
pub struct TokenService<R: TokenRepository, H: CredentialHasher = BcryptHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    config: TokenStoreConfig,
}

impl<R: TokenRepository> TokenService<R, BcryptHasher> {
    /// Create a service with the default configuration (bcrypt cost 10)
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            hasher: Arc::new(BcryptHasher::default()),
            config: TokenStoreConfig::default(),
        }
    }

    /// Create a service using the bcrypt cost and limits from `config`
    pub fn with_config(repository: Arc<R>, config: TokenStoreConfig) -> Result<Self, Error> {
        config.validate()?;
        let hasher = BcryptHasher::new(config.bcrypt_cost)?;
        Ok(Self {
            repository,
            hasher: Arc::new(hasher),
            config,
        })
    }
}

impl<R: TokenRepository, H: CredentialHasher> TokenService<R, H> {
    /// Create a service with a custom hashing primitive.
    ///
    /// `config.bcrypt_cost` is ignored; the hasher carries its own work factor.
    /// The remaining settings are validated as in [`TokenService::with_config`].
    pub fn with_hasher(
        repository: Arc<R>,
        hasher: H,
        config: TokenStoreConfig,
    ) -> Result<Self, Error> {
        config.validate_limits()?;
        Ok(Self {
            repository,
            hasher: Arc::new(hasher),
            config,
        })
    }

    pub fn config(&self) -> &TokenStoreConfig {
        &self.config
    }

    pub fn repository(&self) -> Arc<R> {
        self.repository.clone()
    }

    async fn hash_token(&self, token: &str) -> Result<String, Error> {
        let hasher = Arc::clone(&self.hasher);
        let token = token.to_string();
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&token))
            .await
            .map_err(|e| CryptoError::Task(e.to_string()))??;
        Ok(digest)
    }

    async fn verify_token(&self, token: &str, digest: String) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let token = token.to_string();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&token, &digest))
            .await
            .map_err(|e| CryptoError::Task(e.to_string()))?;
        Ok(matched)
    }
}

#[async_trait]
impl<R: TokenRepository, H: CredentialHasher> TokenStore for TokenService<R, H> {
    async fn authenticate(&self, token: &str, uid: &str) -> Result<Authentication, Error> {
        validate_token(token)?;
        validate_uid(uid)?;

        let Some(record) = self.repository.find_unexpired(uid, Utc::now()).await? else {
            tracing::debug!(uid, "No unexpired token stored");
            return Ok(Authentication::Invalid);
        };

        if self.verify_token(token, record.token_hash).await? {
            tracing::debug!(uid, "Token authenticated");
            Ok(Authentication::Valid {
                referer: record.referer.unwrap_or_default(),
            })
        } else {
            tracing::debug!(uid, "Token did not match");
            Ok(Authentication::Invalid)
        }
    }

    async fn store_or_update(
        &self,
        token: &str,
        uid: &str,
        lifetime: Duration,
        referer: Option<&str>,
    ) -> Result<(), Error> {
        validate_token(token)?;
        validate_uid(uid)?;
        validate_lifetime(lifetime)?;
        let referer = normalize_referer(referer, self.config.max_referer_length)?;

        let token_hash = self.hash_token(token).await?;

        let expires_at = Utc::now().checked_add_signed(lifetime).ok_or_else(|| {
            ValidationError::InvalidLifetime(format!(
                "Lifetime of {} ms overflows the expiry timestamp",
                lifetime.num_milliseconds()
            ))
        })?;

        let record = TokenRecord::new(uid.to_string(), token_hash, expires_at, referer);
        self.repository.upsert(&record).await?;

        tracing::debug!(uid, expires_at = %expires_at, "Stored token");
        Ok(())
    }

    async fn invalidate_user(&self, uid: &str) -> Result<(), Error> {
        validate_uid(uid)?;

        self.repository.delete(uid).await?;
        tracing::debug!(uid, "Invalidated token");
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.repository.delete_all().await?;
        tracing::info!("Cleared all stored tokens");
        Ok(())
    }

    async fn length(&self) -> Result<u64, Error> {
        self.repository.count().await
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let removed = self.repository.delete_expired(Utc::now()).await?;
        tracing::info!(removed, "Purged expired tokens");
        Ok(removed)
    }
}
