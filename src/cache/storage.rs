//! Durable string key/value storage
//!
//! [`FileStorage`] keeps one file per key in an XDG-compliant cache directory
//! (`~/.cache/snowdash/` on Linux). [`MemoryStorage`] is the in-process variant
//! used by tests and by `--no-cache`.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur while reading or writing cached entries
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing storage could not be read or written
    #[error("Cache storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    /// A payload could not be serialized or deserialized
    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value is present but unreadable
    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),

    /// The requested TTL pushes the expiry out of the representable range
    #[error("Cache TTL out of range")]
    InvalidTtl,
}

/// A string-keyed store whose writes survive process restarts
pub trait Storage: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Stores each key as a file in a cache directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path to the file backing `key`
    fn item_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(file_name_for_key(key))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.item_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir)?;
        fs::write(self.item_path(key), value)?;
        Ok(())
    }
}

/// Keeps items in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// XDG cache directory for snowdash, if a home directory is available
pub fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "snowdash").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Maps a cache key onto a safe file name
///
/// Coordinate keys such as `weatherData-39.4817,-106.0384` pass through unchanged;
/// anything that could escape the directory is replaced with `_`.
fn file_name_for_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ',' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
