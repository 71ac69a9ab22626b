use super::{Diff, TxValue, overlay::Overlay};
use crate::{Map, Result, Scalar, Value};
use std::{fmt, hash::Hash};

/// A transaction over a [`Map`].
///
/// Reads, writes and deletions are staged in an overlay owned by the transaction. The base map
/// is only modified by [`commit`](Self::commit).
///
/// # Borrowing
///
/// A transaction exclusively borrows the underlying map, preventing other
/// access until the transaction is dropped. This follows Rust's
/// standard borrowing rules and has zero runtime overhead.
///
/// ```compile_fail
/// use txmap::{map, transaction::Transaction};
///
/// let mut base = map! { "x" => 1 };
/// let mut tx = Transaction::new(&mut base);
/// let len = base.len(); // cannot borrow `base` while `tx` is alive
/// tx.set("x", len as u64);
/// ```
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards the overlay, which
/// is the same as calling [`abort`](Self::abort).
///
/// # Example
///
/// ```
/// use txmap::{map, transaction::Transaction};
///
/// let mut base = map! { "x" => 1 };
///
/// let mut tx = Transaction::new(&mut base);
/// tx.set("x", "y");
/// tx.set("z", 3);
/// assert_eq!(tx.base(), &map! { "x" => 1 });
///
/// tx.commit();
/// assert_eq!(base, map! { "x" => "y", "z" => 3 });
/// ```
#[derive(Debug)]
pub struct Transaction<'a, K = String, S = Scalar>
where
    K: Hash + Eq + fmt::Debug + Clone,
    S: Clone,
{
    base: &'a mut Map<K, S>,
    overlay: Overlay<K, S>,
}

impl<'a, K, S> Transaction<'a, K, S>
where
    K: Hash + Eq + fmt::Debug + Clone,
    S: Clone,
{
    /// Creates a new transaction over `base`.
    ///
    /// The transaction exclusively borrows `base` but does not touch it until committed.
    pub fn new(base: &'a mut Map<K, S>) -> Self {
        Self {
            base,
            overlay: Overlay::default(),
        }
    }

    /// The base map, as it was before the transaction.
    pub fn base(&self) -> &Map<K, S> {
        self.base
    }

    /// Reads the effective value of `key`.
    ///
    /// Maps from the base are returned as a [`NestedTransaction`]; repeated reads of the same
    /// key return a view of the same nested state. Any other value read from the base is cached
    /// in the overlay, which is why this takes `&mut self`.
    ///
    /// # Errors
    ///
    /// [`Error::Deleted`](crate::Error::Deleted) if `key` was deleted in this transaction,
    /// [`Error::NotFound`](crate::Error::NotFound) if it
    /// is neither in the base nor staged.
    ///
    /// # Example
    ///
    /// ```
    /// # use txmap::{map, Error, Scalar, transaction::Transaction};
    /// let mut base = map! { "a" => 1 };
    /// let mut tx = Transaction::new(&mut base);
    /// assert_eq!(tx.get(&"a".to_string()).unwrap().as_scalar(), Some(&Scalar::I64(1)));
    ///
    /// tx.delete(&"a".to_string()).unwrap();
    /// assert!(matches!(tx.get(&"a".to_string()), Err(Error::Deleted { .. })));
    /// assert!(matches!(tx.get(&"b".to_string()), Err(Error::NotFound { .. })));
    /// ```
    pub fn get(&mut self, key: &K) -> Result<TxValue<'_, K, S>> {
        self.overlay.get(self.base, key)
    }

    /// Stages `value` under `key`, replacing whatever was staged before, including a deletion.
    pub fn set(&mut self, key: impl Into<K>, value: impl Into<Value<K, S>>) {
        self.overlay.set(key.into(), value.into());
    }

    /// Stages the deletion of `key`.
    ///
    /// A key that exists in the base is marked deleted. A key that was only created in this
    /// transaction is simply unstaged, leaving no trace in [`diff`](Self::diff).
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](crate::Error::NotFound) if `key` is neither in the base nor staged.
    pub fn delete(&mut self, key: &K) -> Result<()> {
        self.overlay.delete(self.base, key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.overlay.contains_key(self.base, key)
    }

    /// Keys of the effective map, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.overlay.keys(self.base)
    }

    /// Number of keys in the effective map.
    pub fn len(&self) -> usize {
        self.overlay.len(self.base)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The map the base would become if committed now.
    pub fn snapshot(&self) -> Map<K, S> {
        self.overlay.snapshot(self.base)
    }

    /// The net changes staged so far.
    ///
    /// Keys that were read but not changed are left out, see [`Diff`].
    pub fn diff(&self) -> Diff<K, S>
    where
        S: PartialEq,
    {
        self.overlay.diff(self.base)
    }

    /// Applies every staged change to the base map, including those made through nested
    /// transactions, and clears the overlay.
    ///
    /// Returns the updated base. The transaction stays usable; calling `commit` again right
    /// away changes nothing.
    ///
    /// Changes are applied in overlay iteration order. Inserting into and removing from a
    /// [`Map`] cannot fail, so the base never ends up partially committed.
    pub fn commit(&mut self) -> &Map<K, S> {
        let staged = self.overlay.staged_len();
        self.overlay.commit_into(self.base);
        tracing::debug!(staged, "committed transaction");
        self.base
    }

    /// Discards every staged change, including those made through nested transactions.
    ///
    /// Returns the base map, which is exactly as it was when the transaction started.
    pub fn abort(&mut self) -> &Map<K, S> {
        let staged = self.overlay.staged_len();
        self.overlay.abort();
        tracing::debug!(staged, "aborted transaction");
        self.base
    }
}

/// A transaction over a map nested inside the base of a [`Transaction`].
///
/// Obtained from [`Transaction::get`] (or [`NestedTransaction::get`]) via [`TxValue::Map`].
/// It supports the same reads and writes as the top-level transaction. Its changes become part
/// of the parent's overlay and are applied when the top-level transaction commits.
#[derive(Debug)]
pub struct NestedTransaction<'t, K = String, S = Scalar>
where
    K: Hash + Eq + fmt::Debug + Clone,
    S: Clone,
{
    base: &'t Map<K, S>,
    overlay: &'t mut Overlay<K, S>,
}

impl<'t, K, S> NestedTransaction<'t, K, S>
where
    K: Hash + Eq + fmt::Debug + Clone,
    S: Clone,
{
    pub(crate) fn new(base: &'t Map<K, S>, overlay: &'t mut Overlay<K, S>) -> Self {
        Self { base, overlay }
    }

    /// The nested base map, as it was before the transaction.
    pub fn base(&self) -> &Map<K, S> {
        self.base
    }

    /// See [`Transaction::get`].
    pub fn get(&mut self, key: &K) -> Result<TxValue<'_, K, S>> {
        self.overlay.get(self.base, key)
    }

    /// See [`Transaction::set`].
    pub fn set(&mut self, key: impl Into<K>, value: impl Into<Value<K, S>>) {
        self.overlay.set(key.into(), value.into());
    }

    /// See [`Transaction::delete`].
    pub fn delete(&mut self, key: &K) -> Result<()> {
        self.overlay.delete(self.base, key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.overlay.contains_key(self.base, key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.overlay.keys(self.base)
    }

    pub fn len(&self) -> usize {
        self.overlay.len(self.base)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Map<K, S> {
        self.overlay.snapshot(self.base)
    }

    /// The net changes staged for this nested map.
    pub fn diff(&self) -> Diff<K, S>
    where
        S: PartialEq,
    {
        self.overlay.diff(self.base)
    }

    /// Discards the changes staged for this nested map only.
    ///
    /// The parent keeps the nested transaction itself, so reading the key again returns a
    /// fresh view over the unchanged nested base.
    pub fn abort(&mut self) {
        self.overlay.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Change, Error, Presence, map};

    fn key(k: &str) -> String {
        k.to_string()
    }

    #[test]
    fn transaction_new() {
        let mut base: Map = Map::default();
        let tx = Transaction::new(&mut base);
        assert!(tx.is_empty());
    }

    #[test]
    fn get_nonexistent() {
        let mut base: Map = Map::default();
        let mut tx = Transaction::new(&mut base);
        assert_eq!(
            tx.get(&key("nonexistent")).unwrap_err(),
            Error::not_found(&"nonexistent")
        );
    }

    #[test]
    fn get_sees_uncommitted_writes() {
        let mut base = map! { "1" => 1 };
        let mut tx = Transaction::new(&mut base);
        tx.set("1", "a");
        tx.set("3", 3);
        assert_eq!(tx.get(&key("1")).unwrap().as_scalar(), Some(&Scalar::from("a")));
        assert_eq!(tx.get(&key("3")).unwrap().as_scalar(), Some(&Scalar::I64(3)));
        assert!(tx.contains_key(&key("3")));
        assert_eq!(tx.base(), &map! { "1" => 1 });
    }

    #[test]
    fn get_of_deleted_key_fails() {
        let mut base = map! { "2" => 2 };
        let mut tx = Transaction::new(&mut base);
        tx.delete(&key("2")).unwrap();
        assert_eq!(tx.get(&key("2")).unwrap_err(), Error::deleted(&"2"));
        assert!(!tx.contains_key(&key("2")));
    }

    #[test]
    fn delete_then_set_revives_key() {
        let mut base = map! { "a" => 1 };
        let mut tx = Transaction::new(&mut base);
        tx.delete(&key("a")).unwrap();
        tx.set("a", 9);
        assert_eq!(tx.get(&key("a")).unwrap().as_scalar(), Some(&Scalar::I64(9)));
        assert!(tx.contains_key(&key("a")));
    }

    #[test]
    fn created_then_deleted_key_leaves_no_trace() {
        let mut base: Map = Map::default();
        let mut tx = Transaction::new(&mut base);
        tx.set("4", 4);
        tx.delete(&key("4")).unwrap();
        assert!(!tx.contains_key(&key("4")));
        assert!(tx.diff().is_empty());
        assert_eq!(tx.overlay.staged_len(), 0);
    }

    #[test]
    fn delete_nonexistent_fails() {
        let mut base: Map = Map::default();
        let mut tx = Transaction::new(&mut base);
        assert_eq!(
            tx.delete(&key("x")).unwrap_err(),
            Error::not_found(&"x")
        );
    }

    #[test]
    fn keys_and_len_reflect_overlay() {
        let mut base = map! { "1" => 1, "2" => 2, "nested" => { "1" => 1 } };
        let mut tx = Transaction::new(&mut base);
        tx.set("1", "a");
        tx.set("3", 3);
        tx.delete(&key("2")).unwrap();

        let mut keys: Vec<_> = tx.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["1", "3", "nested"]);
        assert_eq!(tx.len(), 3);
        assert!(!tx.is_empty());
    }

    #[test]
    fn nested_edit_commits() {
        let mut base = map! { "n" => { "a" => 1 } };
        {
            let mut tx = Transaction::new(&mut base);
            let mut n = tx.get(&key("n")).unwrap().into_map().unwrap();
            n.set("a", 2);
            assert_eq!(n.get(&key("a")).unwrap().as_scalar(), Some(&Scalar::I64(2)));
            tx.commit();
        }
        assert_eq!(base, map! { "n" => { "a" => 2 } });
    }

    #[test]
    fn diff_reports_net_changes() {
        let mut base = map! { "x" => 1 };
        let mut tx = Transaction::new(&mut base);
        tx.set("x", "y");
        tx.set("z", 3);

        let expected: Diff = [
            (key("x"), Change::updated(1, "y")),
            (key("z"), Change::created(3)),
        ]
        .into_iter()
        .collect();
        assert_eq!(tx.diff(), expected);

        assert_eq!(tx.commit(), &map! { "x" => "y", "z" => 3 });
    }

    #[test]
    fn diff_reports_deletions() {
        let mut base = map! { "2" => 2 };
        let mut tx = Transaction::new(&mut base);
        tx.delete(&key("2")).unwrap();
        let diff = tx.diff();
        assert_eq!(
            diff.get(&key("2")),
            Some(&Change::Replaced {
                old: Presence::Present(Value::from(2)),
                new: Presence::Absent,
            })
        );
    }

    // Reads are cached in the overlay, but a cached value that was never changed is not a
    // change and must not show up in the diff.
    #[test]
    fn diff_omits_unmodified_reads() {
        let mut base = map! { "a" => 1, "n" => { "b" => 2 } };
        let mut tx = Transaction::new(&mut base);
        tx.get(&key("a")).unwrap();
        tx.get(&key("n"))
            .unwrap()
            .into_map()
            .unwrap()
            .get(&key("b"))
            .unwrap();
        assert_eq!(tx.overlay.staged_len(), 2);
        assert!(tx.diff().is_empty());

        // writing back the same value is not a change either
        tx.set("a", 1);
        assert!(tx.diff().is_empty());
    }

    #[test]
    fn diff_nests_like_the_map() {
        let mut base = map! { "nested" => { "1" => 1 } };
        let mut tx = Transaction::new(&mut base);
        tx.get(&key("nested"))
            .unwrap()
            .into_map()
            .unwrap()
            .set("1", 2);

        let inner: Diff = [(key("1"), Change::updated(1, 2))].into_iter().collect();
        let expected: Diff = [(key("nested"), Change::Nested(inner))].into_iter().collect();
        assert_eq!(tx.diff(), expected);
    }

    #[test]
    fn commit_is_idempotent() {
        let mut base = map! { "a" => 1 };
        let mut tx = Transaction::new(&mut base);
        tx.set("a", 2);
        let first = tx.commit().clone();
        let second = tx.commit().clone();
        assert_eq!(first, second);
        assert_eq!(second, map! { "a" => 2 });
    }

    #[test]
    fn abort_returns_untouched_base() {
        let mut base = map! { "1" => 1, "2" => 2, "nested" => { "1" => 1 } };
        let original = base.clone();
        let mut tx = Transaction::new(&mut base);
        tx.set("1", "a");
        tx.set("3", 3);
        tx.delete(&key("2")).unwrap();
        tx.get(&key("nested"))
            .unwrap()
            .into_map()
            .unwrap()
            .set("1", 2);

        assert_eq!(tx.abort(), &original);
        assert_eq!(tx.overlay.staged_len(), 0);
        assert!(tx.diff().is_empty());
    }

    #[test]
    fn transaction_is_reusable_after_commit() {
        let mut base = map! { "a" => 1 };
        let mut tx = Transaction::new(&mut base);
        tx.set("a", 2);
        tx.commit();
        tx.set("b", 3);
        tx.abort();
        tx.delete(&key("a")).unwrap();
        tx.commit();
        assert!(tx.is_empty());
        assert!(base.is_empty());
    }

    #[test]
    fn snapshot_applies_nested_changes() {
        let mut base = map! { "n" => { "a" => 1, "b" => 2 } };
        let mut tx = Transaction::new(&mut base);
        {
            let mut n = tx.get(&key("n")).unwrap().into_map().unwrap();
            n.delete(&key("a")).unwrap();
            n.set("c", 3);
        }
        assert_eq!(tx.snapshot(), map! { "n" => { "b" => 2, "c" => 3 } });
        assert_eq!(tx.base(), &map! { "n" => { "a" => 1, "b" => 2 } });
    }

    #[test]
    fn nested_abort_discards_only_nested_changes() {
        let mut base = map! { "top" => 1, "n" => { "a" => 1 } };
        let mut tx = Transaction::new(&mut base);
        tx.set("top", 2);
        {
            let mut n = tx.get(&key("n")).unwrap().into_map().unwrap();
            n.set("a", 5);
            n.abort();
            assert!(n.diff().is_empty());
            assert_eq!(n.snapshot(), map! { "a" => 1 });
        }
        tx.commit();
        assert_eq!(base, map! { "top" => 2, "n" => { "a" => 1 } });
    }

    #[test]
    fn nested_keys_and_contains() {
        let mut base = map! { "n" => { "a" => 1, "b" => 2 } };
        let mut tx = Transaction::new(&mut base);
        let mut n = tx.get(&key("n")).unwrap().into_map().unwrap();
        n.delete(&key("b")).unwrap();
        n.set("c", 3);
        let mut keys: Vec<_> = n.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["a", "c"]);
        assert_eq!(n.len(), 2);
        assert!(!n.contains_key(&key("b")));
        assert!(n.contains_key(&key("c")));
        assert_eq!(n.base(), &map! { "a" => 1, "b" => 2 });
    }

    #[test]
    fn replacing_a_nested_map_with_a_scalar() {
        let mut base = map! { "n" => { "a" => 1 } };
        let mut tx = Transaction::new(&mut base);
        tx.get(&key("n"))
            .unwrap()
            .into_map()
            .unwrap()
            .set("a", 2);
        tx.set("n", Scalar::Null);
        assert_eq!(
            tx.diff().get(&key("n")),
            Some(&Change::updated(map! { "a" => 1 }, Scalar::Null))
        );
        tx.commit();
        assert_eq!(base, map! { "n" => (Scalar::Null) });
    }
}
