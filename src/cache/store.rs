//! Expiring cache entries on top of [`Storage`]
//!
//! Each entry occupies two storage items: `{key}` holds the serialized payload
//! and `{key}-expiry` holds the absolute expiry as epoch milliseconds.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::storage::{CacheError, Storage};
use crate::clock::Clock;

/// Suffix of the storage item holding an entry's expiry
const EXPIRY_SUFFIX: &str = "-expiry";

/// A cached payload together with its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    /// Serialized payload exactly as it was stored
    pub payload: String,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// An entry is valid for reads strictly before its expiry
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Reads and writes expiring entries
#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Returns the stored entry for `key`, expired or not
    ///
    /// An entry missing either its payload or its expiry item counts as absent.
    pub fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let Some(payload) = self.storage.get_item(key)? else {
            return Ok(None);
        };
        let Some(raw_expiry) = self.storage.get_item(&expiry_key(key))? else {
            return Ok(None);
        };

        let expires_at = parse_expiry(&raw_expiry)?;

        Ok(Some(CacheEntry {
            key: key.to_string(),
            payload,
            expires_at,
        }))
    }

    /// Returns the entry for `key` only if it has not yet expired
    pub fn get_fresh(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let now = self.clock.now();
        Ok(self.get(key)?.filter(|entry| entry.is_valid_at(now)))
    }

    /// Stores `payload` under `key`, expiring `ttl` from now
    ///
    /// Overwrites any previous entry. The payload item is written before the
    /// expiry item so a failed write never leaves a fresh expiry pointing at an
    /// old payload.
    pub fn put(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| CacheError::InvalidTtl)?;
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or(CacheError::InvalidTtl)?;

        self.storage.set_item(key, payload)?;
        self.storage
            .set_item(&expiry_key(key), &expires_at.timestamp_millis().to_string())?;
        Ok(())
    }
}

fn expiry_key(key: &str) -> String {
    format!("{}{}", key, EXPIRY_SUFFIX)
}

fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, CacheError> {
    let millis: i64 = raw
        .trim()
        .parse()
        .map_err(|_| CacheError::Corrupt(format!("invalid expiry timestamp '{}'", raw)))?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| CacheError::Corrupt(format!("expiry out of range: {}", millis)))
}
