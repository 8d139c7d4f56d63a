//! The state-and-updater primitive.
//!
//! A [`StateSlot`] is the per-mount memory a component keeps between
//! renders. The first `use_state` call on a slot initializes it; every later
//! call returns the current value and a [`Setter`] without re-running the
//! initializer.

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::action::{InitialValue, SetStateAction};

/// Shared, mutable cell holding one state value.
type Cell<T> = Arc<RwLock<T>>;

/// Updates the value held by a [`StateSlot`]. Cheap to clone; clones update
/// the same value.
pub struct Setter<T> {
    cell: Cell<T>,
}

impl<T> Setter<T> {
    /// Apply an action: a replacement value, or a function of the current
    /// value.
    pub fn set(&self, action: impl Into<SetStateAction<T>>) {
        match action.into() {
            SetStateAction::Value(next) => self.modify(|current| *current = next),
            SetStateAction::Update(f) => self.update(f),
        }
    }

    /// Replace the value with `f(current)`.
    ///
    /// `f` runs while the value is locked and must not call back into this
    /// setter.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.modify(|current| *current = f(current));
    }

    /// Read the current value through `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.cell.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// A copy of the current value.
    pub fn current(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Run `f` with exclusive access to the value.
    pub(crate) fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.cell.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|value| f.debug_struct("Setter").field("value", value).finish())
    }
}

/// Per-mount state memory.
pub struct StateSlot<T> {
    cell: OnceLock<Cell<T>>,
}

impl<T> StateSlot<T> {
    /// An unmounted slot.
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns `true` once the slot has been initialized.
    pub fn is_mounted(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the current value and its setter, initializing the slot from
    /// `initial` on the first call.
    pub fn use_state(&self, initial: InitialValue<T>) -> (T, Setter<T>)
    where
        T: Clone,
    {
        let setter = self.mount_with(|| initial.resolve());
        (setter.current(), setter)
    }

    /// Return the setter for this slot, running `init` only if the slot has
    /// not been mounted yet.
    pub(crate) fn mount_with(&self, init: impl FnOnce() -> T) -> Setter<T> {
        let cell = self.cell.get_or_init(|| Arc::new(RwLock::new(init())));
        Setter {
            cell: Arc::clone(cell),
        }
    }
}

impl<T> Default for StateSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for StateSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(cell) => {
                let guard = cell.read().unwrap_or_else(PoisonError::into_inner);
                f.debug_struct("StateSlot").field("value", &*guard).finish()
            }
            None => f.write_str("StateSlot(unmounted)"),
        }
    }
}
