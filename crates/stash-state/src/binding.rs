//! State bound to a storage slot.
//!
//! [`use_storage`] reads a JSON value from a storage backend when a slot is
//! first mounted and returns a [`StoredSetter`] that writes every update back
//! under the same key. The in-memory value is authoritative: a failed write
//! is reported to the optional [`ErrorCallback`] and the update still takes
//! effect in memory.
//!
//! Reads never fail. If the backend is unavailable, the read fails, the key
//! is absent, or the stored text does not parse as `T`, the slot starts from
//! its initial value. The initial value is not written back, and malformed
//! stored text is left in place until the next successful write.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stash_store::{StorageError, StorageKey, StorageProvider, StorageResult};
use tracing::{debug, warn};

use crate::action::{InitialValue, SetStateAction};
use crate::state::{Setter, StateSlot};

/// Handler for storage failures, e.g. an exceeded quota or denied access.
pub type ErrorCallback = Arc<dyn Fn(&StorageError) + Send + Sync>;

/// Return the current value of a storage-backed slot and a setter for it.
///
/// On the first call for `slot`, the value stored under `key` is read
/// through `provider` and parsed as JSON; if that yields nothing, `initial`
/// is resolved instead. Later calls on the same slot (re-renders) neither
/// touch the backend nor resolve `initial`.
pub fn use_storage<T>(
    slot: &StateSlot<T>,
    provider: &StorageProvider,
    key: &StorageKey,
    initial: InitialValue<T>,
    on_error: Option<ErrorCallback>,
) -> (T, StoredSetter<T>)
where
    T: Serialize + DeserializeOwned + Clone,
{
    let state = slot.mount_with(|| match read_stored(provider, key) {
        Some(value) => value,
        None => initial.resolve(),
    });
    let setter = StoredSetter {
        state,
        provider: provider.clone(),
        key: key.clone(),
        on_error,
    };
    (setter.current(), setter)
}

/// Bind a fresh slot to `key`: [`use_storage`] against a new [`StateSlot`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stash_state::bind;
/// use stash_store::{InMemoryStorage, StorageKey, StorageProvider};
///
/// let backend = Arc::new(InMemoryStorage::new());
/// let provider = StorageProvider::from(backend);
/// let key = StorageKey::new("visitCount").unwrap();
///
/// let (visits, set_visits) = bind(provider.clone(), key.clone(), 0u32.into(), None);
/// assert_eq!(visits, 0);
/// set_visits.update(|count| count + 1);
///
/// let (visits, _) = bind::<u32>(provider, key, 0.into(), None);
/// assert_eq!(visits, 1);
/// ```
pub fn bind<T>(
    provider: StorageProvider,
    key: StorageKey,
    initial: InitialValue<T>,
    on_error: Option<ErrorCallback>,
) -> (T, StoredSetter<T>)
where
    T: Serialize + DeserializeOwned + Clone,
{
    use_storage(&StateSlot::new(), &provider, &key, initial, on_error)
}

/// Read and parse the item at `key`, or `None` if there is nothing usable.
fn read_stored<T: DeserializeOwned>(provider: &StorageProvider, key: &StorageKey) -> Option<T> {
    let backend = match provider.backend() {
        Ok(backend) => backend,
        Err(e) => {
            debug!(key = %key, error = %e, "storage unavailable; using initial value");
            return None;
        }
    };
    let raw = match backend.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key = %key, "no stored value; using initial value");
            return None;
        }
        Err(e) => {
            debug!(key = %key, error = %e, "storage read failed; using initial value");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, error = %e, "stored value is malformed; using initial value");
            None
        }
    }
}

/// Setter for a storage-backed slot.
///
/// Every update is computed against the current in-memory value, written to
/// the backend as JSON, and then applied in memory whether or not the write
/// succeeded.
pub struct StoredSetter<T> {
    state: Setter<T>,
    provider: StorageProvider,
    key: StorageKey,
    on_error: Option<ErrorCallback>,
}

impl<T> StoredSetter<T>
where
    T: Serialize,
{
    /// Apply an action: a replacement value, or a function of the current
    /// value.
    pub fn set(&self, action: impl Into<SetStateAction<T>>) {
        match action.into() {
            SetStateAction::Value(next) => self.update(move |_| next),
            SetStateAction::Update(f) => self.update(f),
        }
    }

    /// Replace the value with `next`.
    pub fn set_value(&self, next: T) {
        self.update(move |_| next);
    }

    /// Replace the value with `f(current)`.
    ///
    /// `f` runs while the value is locked and must not call back into this
    /// setter.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let written = self.state.modify(|current| {
            let next = f(current);
            let written = self.write(&next);
            *current = next;
            written
        });
        if let Err(e) = written {
            self.report(&e);
        }
    }

    fn write(&self, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.provider.backend()?.set_item(&self.key, &raw)?;
        debug!(key = %self.key, bytes = raw.len(), "stored value written");
        Ok(())
    }

    fn report(&self, error: &StorageError) {
        match &self.on_error {
            Some(callback) => callback(error),
            None => debug!(key = %self.key, error = %error, "storage write failed; kept in memory"),
        }
    }
}

impl<T> StoredSetter<T> {
    /// A copy of the current in-memory value.
    pub fn current(&self) -> T
    where
        T: Clone,
    {
        self.state.current()
    }

    /// Read the current in-memory value through `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.state.with(f)
    }

    /// The key this setter writes to.
    pub fn key(&self) -> &StorageKey {
        &self.key
    }
}

impl<T> Clone for StoredSetter<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            provider: self.provider.clone(),
            key: self.key.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StoredSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.state.with(|value| {
            f.debug_struct("StoredSetter")
                .field("key", &self.key)
                .field("value", value)
                .field("has_error_callback", &self.on_error.is_some())
                .finish()
        })
    }
}
