//! File-backed persistent storage area.
//!
//! The whole area is one JSON object mapping keys to string values:
//!
//! ```text
//! {
//!   "theme": "\"dark\"",
//!   "visitCount": "3"
//! }
//! ```
//!
//! Items are cached in memory after [`FileStorage::open`]. Every mutation
//! writes a complete new file to a temporary sibling and renames it over the
//! original, so a crash mid-write leaves either the old or the new contents.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::memory::{check_quota, map_usage};
use crate::traits::StorageBackend;

/// Persistent storage backend backed by a single JSON file.
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
    quota: Option<u64>,
}

impl FileStorage {
    /// Open the storage file at `path`.
    ///
    /// A missing file is an empty store; the file and its parent directories
    /// are created on the first write. A file that exists but does not hold a
    /// JSON object of strings fails with [`StorageError::Corrupt`].
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let items = load(&path)?;
        debug!(path = %path.display(), items = items.len(), "opened storage file");
        Ok(Self {
            path,
            items: RwLock::new(items),
            quota: None,
        })
    }

    /// Open the storage file at `path`, limiting it to `quota` bytes.
    pub fn open_with_quota(path: impl AsRef<Path>, quota: u64) -> StorageResult<Self> {
        let mut store = Self::open(path)?;
        store.quota = Some(quota);
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configured quota in bytes, if any.
    pub fn quota(&self) -> Option<u64> {
        self.quota
    }

    /// Apply `mutate` to a copy of the items, persist the copy, and only then
    /// make it current. On any failure the cached items are left unchanged.
    fn commit<R>(
        &self,
        mutate: impl FnOnce(&mut BTreeMap<String, String>) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let mut items = self
            .items
            .write()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))?;
        let mut next = items.clone();
        let result = mutate(&mut next)?;
        persist(&self.path, &next)?;
        *items = next;
        Ok(result)
    }

    fn read_items(
        &self,
    ) -> StorageResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.items
            .read()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))
    }
}

fn load(path: &Path) -> StorageResult<BTreeMap<String, String>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn persist(path: &Path, items: &BTreeMap<String, String>) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, items)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;

    debug!(path = %path.display(), items = items.len(), "storage file written");
    Ok(())
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let quota = self.quota;
        self.commit(|items| {
            check_quota(items, quota, key, value)?;
            items.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn remove_item(&self, key: &str) -> StorageResult<bool> {
        if !self.read_items()?.contains_key(key) {
            return Ok(false);
        }
        self.commit(|items| Ok(items.remove(key).is_some()))
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.read_items()?.keys().cloned().collect())
    }

    fn clear(&self) -> StorageResult<()> {
        self.commit(|items| {
            items.clear();
            Ok(())
        })
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.read_items()?.len())
    }

    fn usage_bytes(&self) -> StorageResult<u64> {
        Ok(map_usage(&*self.read_items()?))
    }
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("path", &self.path)
            .field("item_count", &self.len().unwrap_or_default())
            .field("quota", &self.quota)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(dir.path().join("stash.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_opens_empty() {
        let (_dir, store) = temp_store();
        assert!(store.is_empty().unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn set_and_get_item() {
        let (_dir, store) = temp_store();
        store.set_item("theme", "\"dark\"").unwrap();
        assert_eq!(store.get_item("theme").unwrap().as_deref(), Some("\"dark\""));
        assert!(store.path().exists());
    }

    #[test]
    fn items_survive_reopen() {
        let (dir, store) = temp_store();
        store.set_item("a", "1").unwrap();
        store.set_item("b", "[1,2]").unwrap();
        drop(store);

        let reopened = FileStorage::open(dir.path().join("stash.json")).unwrap();
        assert_eq!(reopened.keys().unwrap(), vec!["a", "b"]);
        assert_eq!(reopened.get_item("b").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn remove_and_clear_persist() {
        let (dir, store) = temp_store();
        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();
        assert!(store.remove_item("a").unwrap());
        assert!(!store.remove_item("a").unwrap());

        let reopened = FileStorage::open(dir.path().join("stash.json")).unwrap();
        assert_eq!(reopened.keys().unwrap(), vec!["b"]);

        store.clear().unwrap();
        let reopened = FileStorage::open(dir.path().join("stash.json")).unwrap();
        assert!(reopened.is_empty().unwrap());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("stash.json");
        let store = FileStorage::open(&path).unwrap();
        store.set_item("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stash.json");
        fs::write(&path, "  \n").unwrap();
        let store = FileStorage::open(&path).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn malformed_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stash.json");
        fs::write(&path, "{not json").unwrap();
        let err = FileStorage::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn non_string_values_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stash.json");
        fs::write(&path, r#"{"a": 1}"#).unwrap();
        assert!(matches!(
            FileStorage::open(&path),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn failed_persist_leaves_items_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("stash.json");
        let store = FileStorage::open(&path).unwrap();

        // A regular file where the parent directory should be makes every
        // write fail.
        fs::write(dir.path().join("sub"), "blocker").unwrap();

        let err = store.set_item("k", "v").unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(store.get_item("k").unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn quota_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open_with_quota(dir.path().join("stash.json"), 4).unwrap();
        store.set_item("k", "123").unwrap();
        assert!(matches!(
            store.set_item("k", "1234"),
            Err(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("123"));
        assert_eq!(store.quota(), Some(4));
    }

    #[test]
    fn usage_is_reloaded_with_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stash.json");
        let store = FileStorage::open(&path).unwrap();
        store.set_item("ab", "cde").unwrap();
        store.set_item("f", "").unwrap();
        assert_eq!(store.usage_bytes().unwrap(), 6);
        drop(store);

        let store = FileStorage::open(&path).unwrap();
        assert_eq!(store.usage_bytes().unwrap(), 6);
    }

    #[test]
    fn file_is_a_json_object_of_strings() {
        let (_dir, store) = temp_store();
        store.set_item("n", "42").unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.get("n").map(String::as_str), Some("42"));
    }
}
