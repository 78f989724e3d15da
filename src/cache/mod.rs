//! Cache module for storing forecast responses to disk
//!
//! This module provides a durable string key/value [`Storage`] and a
//! [`CacheStore`] that layers TTL-based expiry on top of it. Entries are never
//! deleted; a stale entry is simply a miss until the next successful fetch
//! overwrites it.

mod storage;
mod store;

pub use storage::{default_cache_dir, CacheError, FileStorage, MemoryStorage, Storage};
pub use store::{CacheEntry, CacheStore};
