//! Storage key validation.
//!
//! Backends accept any string as a key, the same way a browser storage area
//! does. Bindings are stricter: a slot must be named by a non-empty key, and
//! [`StorageKey`] carries that guarantee in the type.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{StorageError, StorageResult};

/// Validate a slot key, returning `Ok(())` if usable.
///
/// # Examples
///
/// ```
/// use stash_store::keys::validate_key;
///
/// assert!(validate_key("visitCount").is_ok());
/// assert!(validate_key("settings/theme").is_ok());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".into(),
        });
    }
    Ok(())
}

/// A validated, non-empty storage key. Cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(Arc<str>);

impl StorageKey {
    /// Validate and wrap `key`.
    pub fn new(key: impl AsRef<str>) -> StorageResult<Self> {
        let key = key.as_ref();
        validate_key(key)?;
        Ok(Self(Arc::from(key)))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for StorageKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for StorageKey {
    type Error = StorageError;

    fn try_from(key: &str) -> StorageResult<Self> {
        Self::new(key)
    }
}

impl TryFrom<String> for StorageKey {
    type Error = StorageError;

    fn try_from(key: String) -> StorageResult<Self> {
        Self::new(key)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({:?})", &*self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_keys() {
        assert!(validate_key("visitCount").is_ok());
        assert!(validate_key("a").is_ok());
        assert!(validate_key("with space").is_ok());
        assert!(validate_key("ünïcødé").is_ok());
    }

    #[test]
    fn rejects_empty_key() {
        let err = validate_key("").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { .. }));
    }

    #[test]
    fn storage_key_derefs_to_str() {
        let key = StorageKey::new("theme").unwrap();
        assert_eq!(&*key, "theme");
        assert_eq!(key.as_str(), "theme");
        assert_eq!(key.to_string(), "theme");
    }

    #[test]
    fn storage_key_try_from() {
        assert!(StorageKey::try_from("x").is_ok());
        assert!(StorageKey::try_from(String::new()).is_err());
    }

    #[test]
    fn clones_compare_equal() {
        let a = StorageKey::new("k").unwrap();
        let b = a.clone();
        assert_eq!(a, b);
    }
}
