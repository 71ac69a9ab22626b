use super::{Change, Diff, NestedTransaction, Presence, TxValue};
use crate::{Error, Map, MapRandomState, Result, Value, create_map};
use std::{collections::HashMap, fmt, hash::Hash};

/// A single staged entry in an [`Overlay`].
#[derive(Debug)]
pub(crate) enum Staged<K, S>
where
    K: Hash + Eq,
{
    /// A value written in the transaction, or read from the base and cached.
    Value(Value<K, S>),
    /// Pending changes to a map that lives in the base under the same key.
    Nested(Overlay<K, S>),
    /// The deletion marker: the key is removed in this transaction.
    Deleted,
}

/// Pending changes layered over a base [`Map`].
///
/// An overlay never holds a reference to its base. Every operation that needs the base takes it
/// as an argument, and nested overlays resolve their base by looking up the same key in the
/// parent's base. This keeps the top-level transaction the only holder of the `&mut` borrow.
#[derive(Debug)]
pub(crate) struct Overlay<K, S>
where
    K: Hash + Eq,
{
    entries: HashMap<K, Staged<K, S>, MapRandomState>,
}

impl<K, S> Default for Overlay<K, S>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self {
            entries: create_map(),
        }
    }
}

impl<K, S> Overlay<K, S>
where
    K: Hash + Eq + fmt::Debug + Clone,
    S: Clone,
{
    /// Number of staged entries, including cached reads and deletion markers.
    pub(crate) fn staged_len(&self) -> usize {
        self.entries.len()
    }

    /// Resolves `key` to its effective value.
    ///
    /// Reading a key that only exists in `base` caches it in the overlay. Maps are cached as an
    /// empty nested overlay so that every later read of `key` sees the same nested transaction.
    pub(crate) fn get<'t>(
        &'t mut self,
        base: &'t Map<K, S>,
        key: &K,
    ) -> Result<TxValue<'t, K, S>> {
        if !self.entries.contains_key(key) {
            let cached = match base.get(key) {
                Some(Value::Map(_)) => {
                    tracing::trace!(?key, "wrapping nested map");
                    Staged::Nested(Overlay::default())
                }
                Some(value) => Staged::Value(value.clone()),
                None => return Err(Error::not_found(key)),
            };
            self.entries.insert(key.clone(), cached);
        }

        match self.entries.get_mut(key) {
            Some(Staged::Value(value)) => Ok(TxValue::Value(value)),
            // the base is exclusively borrowed for the whole transaction, so a nested overlay
            // always has a map underneath it
            Some(Staged::Nested(overlay)) => match base.get(key) {
                Some(Value::Map(inner)) => Ok(TxValue::Map(NestedTransaction::new(inner, overlay))),
                _ => Err(Error::not_found(key)),
            },
            Some(Staged::Deleted) => Err(Error::deleted(key)),
            None => Err(Error::not_found(key)),
        }
    }

    pub(crate) fn set(&mut self, key: K, value: Value<K, S>) {
        self.entries.insert(key, Staged::Value(value));
    }

    pub(crate) fn delete(&mut self, base: &Map<K, S>, key: &K) -> Result<()> {
        if base.contains_key(key) {
            self.entries.insert(key.clone(), Staged::Deleted);
            Ok(())
        } else if self.entries.remove(key).is_some() {
            // staged in this transaction only; dropping the entry restores "never existed"
            Ok(())
        } else {
            Err(Error::not_found(key))
        }
    }

    pub(crate) fn contains_key(&self, base: &Map<K, S>, key: &K) -> bool {
        match self.entries.get(key) {
            Some(Staged::Deleted) => false,
            Some(_) => true,
            None => base.contains_key(key),
        }
    }

    pub(crate) fn keys<'t>(&'t self, base: &'t Map<K, S>) -> impl Iterator<Item = &'t K> + 't {
        let from_base = base
            .keys()
            .filter(move |key| !matches!(self.entries.get(*key), Some(Staged::Deleted)));
        let staged_only = self
            .entries
            .iter()
            .filter(move |(key, staged)| {
                !matches!(staged, Staged::Deleted) && !base.contains_key(*key)
            })
            .map(|(key, _)| key);
        from_base.chain(staged_only)
    }

    pub(crate) fn len(&self, base: &Map<K, S>) -> usize {
        self.keys(base).count()
    }

    /// Folds every staged entry into `base` and leaves the overlay empty.
    pub(crate) fn commit_into(&mut self, base: &mut Map<K, S>) {
        for (key, staged) in self.entries.drain() {
            match staged {
                Staged::Value(value) => {
                    base.insert(key, value);
                }
                Staged::Deleted => {
                    base.remove(&key);
                }
                Staged::Nested(mut nested) => match base.get_mut(&key) {
                    Some(Value::Map(inner)) => nested.commit_into(inner),
                    _ => {
                        let mut inner = create_map();
                        nested.commit_into(&mut inner);
                        base.insert(key, Value::Map(inner));
                    }
                },
            }
        }
    }

    /// Applies every staged entry to `map` without consuming the overlay.
    fn apply_to(&self, map: &mut Map<K, S>) {
        for (key, staged) in &self.entries {
            match staged {
                Staged::Value(value) => {
                    map.insert(key.clone(), value.clone());
                }
                Staged::Deleted => {
                    map.remove(key);
                }
                Staged::Nested(nested) => match map.get_mut(key) {
                    Some(Value::Map(inner)) => nested.apply_to(inner),
                    _ => {
                        let mut inner = create_map();
                        nested.apply_to(&mut inner);
                        map.insert(key.clone(), Value::Map(inner));
                    }
                },
            }
        }
    }

    /// The map `base` would become if this overlay were committed now.
    pub(crate) fn snapshot(&self, base: &Map<K, S>) -> Map<K, S> {
        let mut map = base.clone();
        self.apply_to(&mut map);
        map
    }

    /// Discards every staged entry, depth first.
    pub(crate) fn abort(&mut self) {
        for staged in self.entries.values_mut() {
            if let Staged::Nested(nested) = staged {
                nested.abort();
            }
        }
        self.entries.clear();
    }

    /// Net changes relative to `base`.
    ///
    /// Entries whose staged value equals the base value (typically cached reads) are left out,
    /// and so are nested overlays without any net change.
    pub(crate) fn diff(&self, base: &Map<K, S>) -> Diff<K, S>
    where
        S: PartialEq,
    {
        let empty: Map<K, S> = create_map();
        let mut diff = create_map();
        for (key, staged) in &self.entries {
            let old = base.get(key);
            let change = match staged {
                Staged::Nested(nested) => {
                    let inner = match old {
                        Some(Value::Map(inner)) => inner,
                        _ => &empty,
                    };
                    let nested_diff = nested.diff(inner);
                    if nested_diff.is_empty() {
                        continue;
                    }
                    Change::Nested(nested_diff)
                }
                Staged::Value(value) => {
                    if old == Some(value) {
                        continue;
                    }
                    Change::Replaced {
                        old: old.cloned().into(),
                        new: Presence::Present(value.clone()),
                    }
                }
                Staged::Deleted => Change::Replaced {
                    old: old.cloned().into(),
                    new: Presence::Absent,
                },
            };
            diff.insert(key.clone(), change);
        }
        diff
    }

    #[cfg(test)]
    fn staged(&self, key: &K) -> Option<&Staged<K, S>> {
        self.entries.get(key)
    }
}
