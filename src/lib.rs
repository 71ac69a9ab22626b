// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # txmap: Transactional Overlays for Nested Maps
//!
//! This crate lets you stage reads, writes and deletions against a mutable key-value [`Map`]
//! without touching it, and later either **commit** every staged change in one go or **abort**
//! and leave the map exactly as it was.
//!
//! A [`Transaction`] borrows the map (the **base**) and keeps its own, initially empty,
//! **overlay** of pending changes. Lookups consult the overlay first and fall through to the
//! base. Values in the base that are themselves maps are wrapped on first access, so edits deep
//! inside a document are transactional too: the overlay is a tree that mirrors the nested maps
//! it has touched.
//!
//! ## Core Concepts
//!
//! - [`Value`]: either a [`Scalar`] leaf or a nested [`Map`]. Whether a value gets wrapped in a
//!   nested transaction is decided by matching on this enum.
//! - [`Transaction`]: the top-level wrapper. It is the only holder of the `&mut` borrow on the
//!   base, and the only level that can [`commit`](Transaction::commit).
//! - [`NestedTransaction`]: a view over a nested map and its part of the overlay tree. It
//!   supports the same reads and writes as the top-level wrapper.
//! - [`Diff`]: the net uncommitted change set, keyed like the maps themselves.
//!
//! ## Getting Started
//!
//! ```rust
//! use txmap::{map, transaction::Transaction};
//!
//! let mut base = map! {
//!     "name" => "Alice",
//!     "settings" => { "theme" => "dark" }
//! };
//!
//! let mut tx = Transaction::new(&mut base);
//! tx.set("age", 30);
//! tx.get(&"settings".to_string())
//!     .unwrap()
//!     .into_map()
//!     .unwrap()
//!     .set("theme", "light");
//! tx.delete(&"name".to_string()).unwrap();
//!
//! // Nothing reaches the base before commit.
//! tx.commit();
//!
//! assert_eq!(
//!     base,
//!     map! {
//!         "age" => 30,
//!         "settings" => { "theme" => "light" }
//!     }
//! );
//! ```
//!
//! For scoped usage that commits on success and aborts on error, see
//! [`transaction::transact`].
//!
//! ## Read Caching
//!
//! Reading a key that is only in the base copies its value into the overlay. For nested maps
//! this is what keeps the nested transaction stable across reads. For every other value it is a
//! memoization step: the transaction remembers every key it has touched. A cached read that was
//! never modified does not show up in a [`Diff`].
//!
//! ## What this crate is not
//!
//! There is no durability and no isolation between concurrent transactions. The borrow checker
//! prevents a second transaction on the same base while one is alive, and that is the only
//! concurrency control offered.
//!
//! ## Features
//!
//! - `json`: Enables conversion of maps to and from `serde_json::Value`. This feature is enabled
//!   by default.
//! - `serde`: Provides `serde` support for values and diffs.
//! - `arbitrary`: Implements `quickcheck::Arbitrary` for values and transaction traces.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use ahash::RandomState;
use std::{
    hash::BuildHasher,
    sync::atomic::{AtomicBool, Ordering},
};

// Use a constant seed for hashing so that iteration order is reproducible when requested.
pub(crate) const DETERMINISTIC_HASHER: RandomState = RandomState::with_seeds(48, 1516, 23, 42);

mod error;
pub use error::{Error, Result};
pub mod value;
pub use value::{Map, Scalar, Value};
/// Transactional overlays over [`Map`]s.
///
/// See [`transaction`] module documentation for details and examples.
pub mod transaction;
pub use transaction::{
    Change, Diff, NestedTransaction, Presence, Transaction, TxValue, transact, transact_value,
};
#[cfg(feature = "json")]
mod json;
#[cfg(feature = "json")]
pub use json::{from_json, to_json};
/// Macros usable for tests and initialization
pub mod macros;
#[cfg(any(test, feature = "arbitrary"))]
pub mod test_util;

static ENABLE_DETERMINISM: AtomicBool = AtomicBool::new(false);

/// Makes all maps created afterwards hash deterministically.
///
/// This should only be enabled for testing, as it increases the odds of DoS
/// scenarios.
#[doc(hidden)]
pub fn enable_determinism() {
    ENABLE_DETERMINISM.store(true, Ordering::Release);
}

/// Checks if determinism is enabled.
///
/// Should be used internally and for testing.
#[doc(hidden)]
pub fn determinism_enabled() -> bool {
    ENABLE_DETERMINISM.load(Ordering::Acquire)
}

/// Create a random state for a hashmap.
/// If `enable_determinism` has been used, this will return a deterministic
/// decidedly non-random RandomState, useful in tests.
#[inline]
fn make_random_state() -> RandomState {
    if determinism_enabled() {
        DETERMINISTIC_HASHER
    } else {
        RandomState::new()
    }
}

pub(crate) fn create_map<K, V>() -> std::collections::HashMap<K, V, MapRandomState> {
    std::collections::HashMap::with_hasher(MapRandomState::default())
}

/// This is a small wrapper around the ahash RandomState.
/// This allows us to easily switch to a non-random RandomState for use in tests.
#[derive(Clone, Debug)]
pub struct MapRandomState {
    inner: RandomState,
}

// Falls back on a regular ahash::RandomState except when 'enable_determinism' has been
// called, in which case a static only-for-test RandomState is used.
impl Default for MapRandomState {
    #[inline]
    fn default() -> Self {
        Self {
            inner: make_random_state(),
        }
    }
}

// Since MapRandomState implements default, the user doesn't have to do anything more than
// specialize their hashmap using MapRandomState instead of RandomState.
impl BuildHasher for MapRandomState {
    type Hasher = <RandomState as BuildHasher>::Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        self.inner.build_hasher()
    }
}
