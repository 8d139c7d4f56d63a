//! Component state bound to storage slots.
//!
//! This crate pairs a state-and-updater primitive with a key in a
//! [`stash_store`] backend. A bound slot reads its stored JSON value once,
//! when first mounted, and every update writes the new value back. Storage
//! failures never reach the caller: they go to an optional error callback
//! while the in-memory value updates regardless.
//!
//! # Modules
//!
//! - [`action`] -- [`SetStateAction`] (value or functional update) and [`InitialValue`]
//! - [`state`] -- [`StateSlot`] and [`Setter`], plain in-memory state
//! - [`binding`] -- [`use_storage`], [`bind`], and [`StoredSetter`]
//! - [`areas`] -- [`StorageAreas`] with `local` and `session` providers
//!
//! # Example
//!
//! ```
//! use stash_state::{use_local_storage, StateSlot, StorageAreas};
//! use stash_store::StorageKey;
//!
//! let areas = StorageAreas::in_memory();
//! let slot = StateSlot::new();
//! let key = StorageKey::new("visitCount").unwrap();
//!
//! let (_, set_visits) = use_local_storage(&areas, &slot, &key, 0u32.into(), None);
//! set_visits.update(|count| count + 1);
//!
//! // A re-render reuses the mounted value.
//! let (visits, _) = use_local_storage(&areas, &slot, &key, 0u32.into(), None);
//! assert_eq!(visits, 1);
//! ```

pub mod action;
pub mod areas;
pub mod binding;
pub mod state;

pub use action::{InitialValue, SetStateAction};
pub use areas::{use_local_storage, use_session_storage, StorageArea, StorageAreas};
pub use binding::{bind, use_storage, ErrorCallback, StoredSetter};
pub use state::{Setter, StateSlot};
