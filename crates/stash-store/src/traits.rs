//! The [`StorageBackend`] trait defining the key/value storage surface.

use crate::error::StorageResult;

/// Synchronous, string-keyed and string-valued storage area.
///
/// This is the capability a browser's page-scoped storage offers: callers
/// read and write whole items by key, and every operation either completes or
/// fails immediately. Implementations must satisfy these rules:
///
/// - A successful `set_item` is visible to every later `get_item` on the same
///   instance until the next successful write or removal of that key.
/// - A failed `set_item` leaves the previous item (if any) untouched.
/// - The store never interprets values; they are opaque strings.
pub trait StorageBackend: Send + Sync {
    /// Read the item stored under `key`.
    ///
    /// Returns `Ok(None)` if no item exists.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Create or replace the item stored under `key`.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the item under `key`. Returns `true` if it existed.
    fn remove_item(&self, key: &str) -> StorageResult<bool>;

    /// All keys currently stored, in sorted order.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Remove every item.
    fn clear(&self) -> StorageResult<()>;

    /// Number of stored items.
    fn len(&self) -> StorageResult<usize> {
        Ok(self.keys()?.len())
    }

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Bytes in use, counted as the sum of key and value lengths.
    ///
    /// Default implementation reads every item. Backends that track usage
    /// incrementally should override it.
    fn usage_bytes(&self) -> StorageResult<u64> {
        let mut total = 0u64;
        for key in self.keys()? {
            if let Some(value) = self.get_item(&key)? {
                total += (key.len() + value.len()) as u64;
            }
        }
        Ok(total)
    }
}

/// Usage after replacing `key` with `value` in a store currently using
/// `current` bytes, where `previous` is the value being replaced.
pub(crate) fn usage_after_write(current: u64, key: &str, previous: Option<&str>, value: &str) -> u64 {
    let removed = previous.map_or(0, |p| (key.len() + p.len()) as u64);
    current - removed + (key.len() + value.len()) as u64
}
