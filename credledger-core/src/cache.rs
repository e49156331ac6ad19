//! Process-wide record-set cache.
//!
//! The cache is created once per process and shared by reference; multiple
//! [`CredentialStore`](crate::store::CredentialStore) instances that share
//! it observe each other's writes (read-after-write consistency within the
//! process). It holds only in-memory data and needs no teardown.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::CredentialError;
use crate::model::RecordSet;

/// Shared in-memory cache of loaded record sets, keyed by string.
///
/// # Thread Safety
///
/// Uses interior mutability via `RwLock` and is safe to share across
/// threads via `Arc`.
#[derive(Default)]
pub struct DocumentCache {
    entries: RwLock<HashMap<String, RecordSet>>,
}

impl DocumentCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a cached record set by key.
    ///
    /// Returns `Ok(None)` if the key has not been populated.
    pub fn get(&self, key: &str) -> Result<Option<RecordSet>, CredentialError> {
        let entries = self.entries.read().map_err(|e| CredentialError::Lock {
            message: format!("read lock poisoned: {}", e),
        })?;
        Ok(entries.get(key).cloned())
    }

    /// Store a record set under the given key, replacing any existing entry.
    pub fn put(&self, key: &str, value: RecordSet) -> Result<(), CredentialError> {
        let mut entries = self.entries.write().map_err(|e| CredentialError::Lock {
            message: format!("write lock poisoned: {}", e),
        })?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("DocumentCache")
            .field("entries", &count)
            .finish()
    }
}
