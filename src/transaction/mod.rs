//! Transactional overlays over nested maps.
//!
//! A [`Transaction`] wraps a mutable [`Map`](crate::Map) (the base) and stages every change in
//! an overlay instead of applying it:
//!
//! - **Nothing leaks early** - the base is untouched until [`Transaction::commit`]
//! - **Reads see your writes** - lookups consult the overlay before the base
//! - **Deep edits are staged too** - maps inside the base are wrapped in a
//!   [`NestedTransaction`] on first access
//! - **Explicit change sets** - [`Transaction::diff`] reports what a commit would do
//!
//! # Example
//!
//! ```
//! use txmap::{map, transaction::{Transaction, TxValue}};
//!
//! let mut base = map! {
//!     "1" => 1,
//!     "2" => 2,
//!     "nested" => { "1" => 1 }
//! };
//!
//! let mut tx = Transaction::new(&mut base);
//! tx.set("1", "a");
//! tx.set("3", 3);
//! tx.delete(&"2".to_string()).unwrap();
//! if let TxValue::Map(mut nested) = tx.get(&"nested".to_string()).unwrap() {
//!     nested.set("1", 2);
//! }
//!
//! assert_eq!(tx.commit(), &map! {
//!     "1" => "a",
//!     "3" => 3,
//!     "nested" => { "1" => 2 }
//! });
//! ```
//!
//! # Transaction Semantics
//!
//! Each key of a transaction resolves to its **effective value**:
//!
//! 1. If the overlay marks the key deleted, the key is absent and reading it fails with
//!    [`Error::Deleted`](crate::Error::Deleted).
//! 2. Otherwise, if the overlay holds an entry for the key, that entry wins.
//! 3. Otherwise the base value is used. A map is wrapped in a new nested overlay; any other
//!    value is copied into the overlay.
//!
//! Step 3 means that reads mutate the overlay. This is a memoization step: it makes repeated
//! reads of a nested map hand out the same nested state, and it gives commit a complete set of
//! touched keys. Values that were cached but never changed are left out of
//! [`Transaction::diff`].
//!
//! Deleting a key that exists in the base stages a deletion marker. Deleting a key that was only
//! created inside the transaction removes its overlay entry instead, so it leaves no trace.
//!
//! ## How Nesting Works
//!
//! The overlay is a tree of owned nodes mirroring the nested maps that were touched. Nested
//! nodes do not keep references into the base. A [`NestedTransaction`] pairs a shared borrow of
//! the nested base map with an exclusive borrow of its overlay node, and only the top-level
//! [`Transaction`] holds the `&mut` borrow that commit needs. Commit, abort and diff walk the
//! tree depth first.
//!
//! ## Commit and Abort
//!
//! - **On commit**: every overlay entry is folded into the base, recursively for nested maps,
//!   then the overlay is cleared
//! - **On abort**: nested overlays are cleared depth first, then the overlay itself
//! - **On drop**: the overlay is discarded, same as abort
//!
//! Both leave the transaction usable with an empty overlay.
//!
//! # Scoped Transactions
//!
//! [`transact`] runs a closure inside a transaction, committing on `Ok` and aborting on `Err`:
//!
//! ```
//! use txmap::{map, transaction::transact};
//!
//! let mut data = map! { "1" => 1 };
//! let result: Result<(), &str> = transact(&mut data, |tx| {
//!     tx.set("1", "a");
//!     Err("something went wrong")
//! });
//! assert_eq!(result, Err("something went wrong"));
//! assert_eq!(data, map! { "1" => 1 });
//! ```

mod diff;
mod map_transaction;
mod overlay;
mod scoped;
mod tx_value;

pub use diff::{Change, Diff, Presence};
pub use map_transaction::{NestedTransaction, Transaction};
pub use scoped::{transact, transact_value};
pub use tx_value::TxValue;
