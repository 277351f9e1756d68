use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, storage::TokenRecord};

/// Persistence backend for token records.
///
/// A single logical table keyed by `uid`. Implementations must make
/// [`upsert`](Self::upsert) one atomic backend operation: a concurrent reader
/// sees either the previous record or the new one, never a mix.
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Insert the record, or replace every field of the existing record with the same uid
    async fn upsert(&self, record: &TokenRecord) -> Result<(), Error>;

    /// Find the record for `uid` whose expiry is not before `now`
    async fn find_unexpired(
        &self,
        uid: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TokenRecord>, Error>;

    /// Delete the record for `uid`. Deleting a missing uid succeeds.
    async fn delete(&self, uid: &str) -> Result<(), Error>;

    /// Delete every record
    async fn delete_all(&self) -> Result<(), Error>;

    /// Delete records that expired before `now`, returning how many were removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error>;

    /// Number of stored records, expired or not
    async fn count(&self) -> Result<u64, Error>;

    /// Create or update the backend schema. Backends without a schema do nothing.
    async fn migrate(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
