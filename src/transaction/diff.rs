use crate::{MapRandomState, Scalar, Value};
use std::{collections::HashMap, hash::Hash};

/// Net uncommitted changes of a transaction, keyed like the map they apply to.
///
/// Produced by [`Transaction::diff`](super::Transaction::diff). Keys that were only read, or
/// written back with the value they already had, do not appear.
pub type Diff<K = String, S = Scalar> = HashMap<K, Change<K, S>, MapRandomState>;

/// One side of a [`Change::Replaced`] pair.
///
/// [`Presence::Absent`] is the "did not exist" marker: on the `old` side it means the key was
/// created in the transaction, on the `new` side that it was deleted. It is never equal to a
/// present value, including [`Scalar::Null`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Presence<T> {
    Present(T),
    Absent,
}

impl<T> Presence<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Presence::Absent)
    }

    pub fn as_ref(&self) -> Presence<&T> {
        match self {
            Presence::Present(v) => Presence::Present(v),
            Presence::Absent => Presence::Absent,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Presence::Present(v) => Some(v),
            Presence::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Presence<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Presence::Present(v),
            None => Presence::Absent,
        }
    }
}

/// The change staged for a single key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Change<K = String, S = Scalar>
where
    K: Hash + Eq,
{
    /// The key's value was replaced, created or deleted.
    Replaced {
        old: Presence<Value<K, S>>,
        new: Presence<Value<K, S>>,
    },
    /// The key holds a map that was edited in a nested transaction.
    Nested(Diff<K, S>),
}

impl<K, S> Change<K, S>
where
    K: Hash + Eq,
{
    /// A change from `old` to `new`, where either side may be [`Presence::Absent`].
    pub fn replaced(
        old: impl Into<Presence<Value<K, S>>>,
        new: impl Into<Presence<Value<K, S>>>,
    ) -> Self {
        Change::Replaced {
            old: old.into(),
            new: new.into(),
        }
    }

    /// A key that did not exist before and holds `new` now.
    pub fn created(new: impl Into<Value<K, S>>) -> Self {
        Change::Replaced {
            old: Presence::Absent,
            new: Presence::Present(new.into()),
        }
    }

    /// A key that held `old` and is deleted now.
    pub fn deleted(old: impl Into<Value<K, S>>) -> Self {
        Change::Replaced {
            old: Presence::Present(old.into()),
            new: Presence::Absent,
        }
    }

    /// A key whose value changed from `old` to `new`.
    pub fn updated(old: impl Into<Value<K, S>>, new: impl Into<Value<K, S>>) -> Self {
        Change::Replaced {
            old: Presence::Present(old.into()),
            new: Presence::Present(new.into()),
        }
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use crate::{map, transaction::Transaction};

    #[test]
    fn diff_survives_json_encoding() {
        let mut base = map! {
            "n" => { "a" => (Scalar::Bytes(vec![1, 2])) },
            "c" => {}
        };
        let mut tx = Transaction::new(&mut base);
        tx.set("z", 3);
        tx.delete(&"n".to_string()).unwrap();
        tx.get(&"c".to_string())
            .unwrap()
            .into_map()
            .unwrap()
            .set("k", true);
        let diff = tx.diff();
        assert!(matches!(diff[&"c".to_string()], Change::Nested(_)));

        let encoded = serde_json::to_value(&diff).unwrap();
        let decoded: Diff = serde_json::from_value(encoded.clone()).unwrap();
        assert_eq!(decoded, diff);
        insta::assert_snapshot!(encoded.to_string(), @r#"{"c":{"Nested":{"k":{"Replaced":{"new":{"Present":{"Scalar":{"Bool":true}}},"old":"Absent"}}}},"n":{"Replaced":{"new":"Absent","old":{"Present":{"Map":{"a":{"Scalar":{"Bytes":[1,2]}}}}}}},"z":{"Replaced":{"new":{"Present":{"Scalar":{"I64":3}}},"old":"Absent"}}}"#);
    }
}
