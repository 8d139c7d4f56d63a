//! The two page-scoped storage areas.
//!
//! A page sees a persistent `local` area and a `session` area that lives
//! only as long as the page. [`StorageAreas`] bundles one provider for each;
//! [`use_local_storage`] and [`use_session_storage`] bind slots to them.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stash_store::{
    FileStorage, InMemoryStorage, SharedBackend, StorageConfig, StorageKey, StorageProvider,
};
use tracing::debug;

use crate::action::InitialValue;
use crate::binding::{use_storage, ErrorCallback, StoredSetter};
use crate::state::StateSlot;

/// Which storage area a slot lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageArea {
    /// Persistent across sessions.
    Local,
    /// Discarded when the session ends.
    Session,
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Session => f.write_str("session"),
        }
    }
}

/// Providers for the local and session areas.
#[derive(Clone, Debug)]
pub struct StorageAreas {
    local: StorageProvider,
    session: StorageProvider,
}

impl StorageAreas {
    /// Use the given providers.
    pub fn new(local: StorageProvider, session: StorageProvider) -> Self {
        Self { local, session }
    }

    /// Areas described by `config`.
    ///
    /// The local area is the file at `config.path`, opened on first access.
    /// If opening fails (unreadable or corrupt file), the local provider
    /// reports the error and tries again on the next access. The session area
    /// is an in-memory store owned by the returned value.
    pub fn from_config(config: &StorageConfig) -> Self {
        let path = config.path.clone();
        let quota = config.local_quota();
        let local = StorageProvider::lazy(move || {
            let store = match quota {
                Some(quota) => FileStorage::open_with_quota(&path, quota)?,
                None => FileStorage::open(&path)?,
            };
            debug!(path = %path.display(), "local storage area opened");
            Ok(Arc::new(store) as SharedBackend)
        });

        let session = match config.session_quota() {
            Some(quota) => InMemoryStorage::with_quota(quota),
            None => InMemoryStorage::new(),
        };

        Self {
            local,
            session: StorageProvider::from(Arc::new(session)),
        }
    }

    /// Two independent in-memory areas, for tests and headless use.
    pub fn in_memory() -> Self {
        Self {
            local: StorageProvider::from(Arc::new(InMemoryStorage::new())),
            session: StorageProvider::from(Arc::new(InMemoryStorage::new())),
        }
    }

    /// Provider for the persistent area.
    pub fn local(&self) -> &StorageProvider {
        &self.local
    }

    /// Provider for the session area.
    pub fn session(&self) -> &StorageProvider {
        &self.session
    }

    /// Provider for `area`.
    pub fn provider(&self, area: StorageArea) -> &StorageProvider {
        match area {
            StorageArea::Local => &self.local,
            StorageArea::Session => &self.session,
        }
    }
}

/// [`use_storage`] against the local area.
pub fn use_local_storage<T>(
    areas: &StorageAreas,
    slot: &StateSlot<T>,
    key: &StorageKey,
    initial: InitialValue<T>,
    on_error: Option<ErrorCallback>,
) -> (T, StoredSetter<T>)
where
    T: Serialize + DeserializeOwned + Clone,
{
    use_storage(slot, areas.local(), key, initial, on_error)
}

/// [`use_storage`] against the session area.
pub fn use_session_storage<T>(
    areas: &StorageAreas,
    slot: &StateSlot<T>,
    key: &StorageKey,
    initial: InitialValue<T>,
    on_error: Option<ErrorCallback>,
) -> (T, StoredSetter<T>)
where
    T: Serialize + DeserializeOwned + Clone,
{
    use_storage(slot, areas.session(), key, initial, on_error)
}
