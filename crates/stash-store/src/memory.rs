//! In-memory storage area for tests and session-lifetime data.
//!
//! [`InMemoryStorage`] keeps all items in a `BTreeMap` protected by a
//! `RwLock`. Besides backing the session area, it doubles as a test double:
//! a quota and a read-only switch let callers provoke the write failures a
//! real browser store produces.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{StorageError, StorageResult};
use crate::traits::{usage_after_write, StorageBackend};

/// In-memory, map-based storage backend.
///
/// Data is lost when the store is dropped.
pub struct InMemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
    quota: Option<u64>,
    read_only: AtomicBool,
}

impl InMemoryStorage {
    /// Create a new empty store with no quota.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            quota: None,
            read_only: AtomicBool::new(false),
        }
    }

    /// Create a new empty store limited to `quota` bytes.
    pub fn with_quota(quota: u64) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    /// Create a store pre-populated with `items`. The quota is not checked.
    pub fn from_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = items
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            items: RwLock::new(map),
            ..Self::new()
        }
    }

    /// The configured quota in bytes, if any.
    pub fn quota(&self) -> Option<u64> {
        self.quota
    }

    /// Toggle read-only mode. While set, every mutation fails with
    /// [`StorageError::AccessDenied`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Returns `true` if mutations are currently refused.
    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.is_read_only() {
            return Err(StorageError::AccessDenied("storage is read-only".into()));
        }
        Ok(())
    }

    fn read_items(
        &self,
    ) -> StorageResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.items
            .read()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write_items(
        &self,
    ) -> StorageResult<std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.items
            .write()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes used by `items`, counted as key plus value lengths.
pub(crate) fn map_usage(items: &BTreeMap<String, String>) -> u64 {
    items.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum()
}

/// Fail with [`StorageError::QuotaExceeded`] if writing `key = value` into
/// `items` would exceed `quota`.
pub(crate) fn check_quota(
    items: &BTreeMap<String, String>,
    quota: Option<u64>,
    key: &str,
    value: &str,
) -> StorageResult<()> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let required = usage_after_write(
        map_usage(items),
        key,
        items.get(key).map(String::as_str),
        value,
    );
    if required > quota {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            required,
            quota,
        });
    }
    Ok(())
}

impl StorageBackend for InMemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut items = self.write_items()?;
        check_quota(&items, self.quota, key, value)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<bool> {
        self.check_writable()?;
        Ok(self.write_items()?.remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.read_items()?.keys().cloned().collect())
    }

    fn clear(&self) -> StorageResult<()> {
        self.check_writable()?;
        self.write_items()?.clear();
        Ok(())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.read_items()?.len())
    }

    fn usage_bytes(&self) -> StorageResult<u64> {
        Ok(map_usage(&*self.read_items()?))
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryStorage")
            .field("item_count", &count)
            .field("quota", &self.quota)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
