//! String-keyed storage areas for stash.
//!
//! This crate models the page-scoped key/value storage a browser offers: a
//! synchronous surface where whole string values are read and written by
//! string key, and where writes may fail (quota exceeded, access denied,
//! storage unavailable).
//!
//! # Storage Backends
//!
//! All backends implement the [`StorageBackend`] trait:
//!
//! - [`InMemoryStorage`] -- map-based store for tests and session-lifetime data
//! - [`FileStorage`] -- JSON file store for data that outlives the process
//!
//! # Modules
//!
//! - [`error`] -- [`StorageError`] and the [`StorageResult`] alias
//! - [`keys`] -- [`StorageKey`], a validated slot name
//! - [`provider`] -- [`StorageProvider`], deferred access to a backend
//! - [`config`] -- [`StorageConfig`], TOML configuration for the areas
//!
//! # Design Rules
//!
//! 1. Values are opaque strings; the store never interprets them.
//! 2. A failed write leaves the previous item untouched.
//! 3. Usage is counted as key bytes plus value bytes.
//! 4. Errors are returned, never swallowed; callers decide what to ignore.

pub mod config;
pub mod error;
pub mod file;
pub mod keys;
pub mod memory;
pub mod provider;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{StorageConfig, DEFAULT_QUOTA_BYTES};
pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use keys::{validate_key, StorageKey};
pub use memory::InMemoryStorage;
pub use provider::{SharedBackend, StorageProvider};
pub use traits::StorageBackend;
