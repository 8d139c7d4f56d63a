//! Deferred access to a storage backend.
//!
//! A binding does not hold a backend directly. It holds a
//! [`StorageProvider`] and asks it for the backend each time it reads or
//! writes, so the backend may come into existence (or disappear) after the
//! binding is created. Outside a page, or before a persistent area has been
//! opened, the provider reports [`StorageError::Unavailable`].

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{StorageError, StorageResult};
use crate::traits::StorageBackend;

/// Shared handle to any backend.
pub type SharedBackend = Arc<dyn StorageBackend>;

type ProviderFn = dyn Fn() -> StorageResult<SharedBackend> + Send + Sync;

/// Zero-argument accessor returning the backend to use.
///
/// Cloning a provider shares the underlying accessor.
#[derive(Clone)]
pub struct StorageProvider {
    access: Arc<ProviderFn>,
}

impl StorageProvider {
    /// Wrap an accessor function.
    pub fn new<F>(access: F) -> Self
    where
        F: Fn() -> StorageResult<SharedBackend> + Send + Sync + 'static,
    {
        Self {
            access: Arc::new(access),
        }
    }

    /// A provider that always hands out `backend`.
    pub fn from_backend(backend: SharedBackend) -> Self {
        Self::new(move || Ok(Arc::clone(&backend)))
    }

    /// A provider with no backend. Every access fails with
    /// [`StorageError::Unavailable`] carrying `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason: String = reason.into();
        Self::new(move || Err(StorageError::Unavailable(reason.clone())))
    }

    /// A provider that opens its backend with `open` on first successful
    /// access and reuses it afterwards. Failed opens are retried on the next
    /// access.
    pub fn lazy<F>(open: F) -> Self
    where
        F: Fn() -> StorageResult<SharedBackend> + Send + Sync + 'static,
    {
        let cached: Mutex<Option<SharedBackend>> = Mutex::new(None);
        Self::new(move || {
            let mut slot = cached
                .lock()
                .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))?;
            if let Some(backend) = slot.as_ref() {
                return Ok(Arc::clone(backend));
            }
            let backend = open()?;
            *slot = Some(Arc::clone(&backend));
            Ok(backend)
        })
    }

    /// Resolve the backend.
    pub fn backend(&self) -> StorageResult<SharedBackend> {
        (self.access)()
    }
}

impl fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageProvider").finish_non_exhaustive()
    }
}

impl<B: StorageBackend + 'static> From<Arc<B>> for StorageProvider {
    fn from(backend: Arc<B>) -> Self {
        Self::from_backend(backend)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::memory::InMemoryStorage;

    #[test]
    fn from_backend_shares_instance() {
        let backend = Arc::new(InMemoryStorage::new());
        let provider = StorageProvider::from(Arc::clone(&backend));

        provider.backend().unwrap().set_item("k", "v").unwrap();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn unavailable_always_fails() {
        let provider = StorageProvider::unavailable("no window");
        for _ in 0..2 {
            match provider.backend() {
                Err(StorageError::Unavailable(reason)) => assert_eq!(reason, "no window"),
                Err(other) => panic!("unexpected error: {other}"),
                Ok(_) => panic!("expected unavailable"),
            }
        }
    }

    #[test]
    fn lazy_opens_once() {
        let opens = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&opens);
        let provider = StorageProvider::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(InMemoryStorage::new()) as SharedBackend)
        });

        assert_eq!(opens.load(Ordering::SeqCst), 0);
        provider.backend().unwrap().set_item("k", "v").unwrap();
        let again = provider.backend().unwrap();
        assert_eq!(again.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lazy_retries_failed_open() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let provider = StorageProvider::lazy(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StorageError::Unavailable("not yet".into()))
            } else {
                Ok(Arc::new(InMemoryStorage::new()) as SharedBackend)
            }
        });

        assert!(provider.backend().is_err());
        assert!(provider.backend().is_ok());
        assert!(provider.backend().is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clones_share_accessor() {
        let backend = Arc::new(InMemoryStorage::new());
        let a = StorageProvider::from(Arc::clone(&backend));
        let b = a.clone();
        a.backend().unwrap().set_item("x", "1").unwrap();
        assert_eq!(b.backend().unwrap().get_item("x").unwrap().as_deref(), Some("1"));
    }
}
