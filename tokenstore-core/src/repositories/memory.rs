//! In-process token repository
//!
//! Records live in a [`DashMap`] keyed by uid. Each map operation holds the
//! lock of the shard that owns the key, so an upsert replaces a record in one
//! step and readers never observe a half-written record. `delete_all` clears
//! shard by shard.
//!
//! Nothing is persisted; this backend suits tests and single-process
//! deployments where tokens may be lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::{Error, repositories::TokenRepository, storage::TokenRecord};

#[derive(Debug, Default)]
pub struct MemoryTokenRepository {
    records: DashMap<String, TokenRecord>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn upsert(&self, record: &TokenRecord) -> Result<(), Error> {
        self.records.insert(record.uid.clone(), record.clone());
        Ok(())
    }

    async fn find_unexpired(
        &self,
        uid: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TokenRecord>, Error> {
        Ok(self
            .records
            .get(uid)
            .filter(|record| !record.is_expired_at(now))
            .map(|record| record.value().clone()))
    }

    async fn delete(&self, uid: &str) -> Result<(), Error> {
        self.records.remove(uid);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Error> {
        self.records.clear();
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let mut removed = 0u64;
        self.records.retain(|_, record| {
            let keep = !record.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, Error> {
        Ok(self.records.len() as u64)
    }
}
