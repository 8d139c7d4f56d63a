//! Update and initialization values accepted by state setters.

use std::fmt;

/// A state update: either a replacement value or a function of the previous
/// value.
///
/// Functional updates compute the next value from whatever is current when
/// the update is applied, not from a copy captured earlier.
pub enum SetStateAction<T> {
    /// Replace the current value.
    Value(T),
    /// Compute the next value from the current one.
    Update(Box<dyn FnOnce(&T) -> T>),
}

impl<T> SetStateAction<T> {
    /// Build a functional update.
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + 'static,
    {
        Self::Update(Box::new(f))
    }

    /// Resolve the action against `prev`.
    pub fn apply(self, prev: &T) -> T {
        match self {
            Self::Value(next) => next,
            Self::Update(f) => f(prev),
        }
    }
}

impl<T> From<T> for SetStateAction<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for SetStateAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// The value a slot starts with when nothing better is available.
///
/// A lazy initializer runs only if the value is actually needed, and at most
/// once per mount.
pub enum InitialValue<T> {
    /// Use this value.
    Value(T),
    /// Produce the value on demand.
    Lazy(Box<dyn FnOnce() -> T>),
}

impl<T> InitialValue<T> {
    /// Build a lazy initial value.
    pub fn lazy<F>(f: F) -> Self
    where
        F: FnOnce() -> T + 'static,
    {
        Self::Lazy(Box::new(f))
    }

    /// Produce the value, running the initializer if lazy.
    pub fn resolve(self) -> T {
        match self {
            Self::Value(v) => v,
            Self::Lazy(f) => f(),
        }
    }
}

impl<U> InitialValue<Option<U>> {
    /// No default: the slot starts as `None` (stored as JSON `null`).
    pub fn null() -> Self {
        Self::Value(None)
    }
}

impl<T> From<T> for InitialValue<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: Default> Default for InitialValue<T> {
    fn default() -> Self {
        Self::Value(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for InitialValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}
