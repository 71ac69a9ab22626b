use super::NestedTransaction;
use crate::{Scalar, Value};
use std::{fmt, hash::Hash};

/// Result of reading a key through a transaction.
///
/// Maps that live in the base are handed out as a [`NestedTransaction`], so edits inside them
/// are staged too. Everything else is a mutable reference to the value staged in the overlay;
/// editing it in place edits the transaction, never the base.
///
/// # Example
///
/// ```
/// # use txmap::{map, transaction::{Transaction, TxValue}};
/// let mut base = map! { "user" => { "name" => "Alice" }, "count" => 1 };
/// let mut tx = Transaction::new(&mut base);
/// match tx.get(&"user".to_string()).unwrap() {
///     TxValue::Map(mut user) => user.set("name", "Bob"),
///     TxValue::Value(value) => panic!("expected a map, got {value:?}"),
/// }
/// ```
#[derive(Debug)]
pub enum TxValue<'tx, K = String, S = Scalar>
where
    K: Hash + Eq + fmt::Debug + Clone,
    S: Clone,
{
    /// A value staged in the overlay, either written in the transaction or cached from the base.
    ///
    /// This may be a [`Value::Map`] if a whole map was staged with `set`.
    Value(&'tx mut Value<K, S>),

    /// A map from the base, wrapped in a nested transaction.
    Map(NestedTransaction<'tx, K, S>),
}

impl<'tx, K, S> TxValue<'tx, K, S>
where
    K: Hash + Eq + fmt::Debug + Clone,
    S: Clone,
{
    /// The staged value, unless this is a nested transaction.
    pub fn as_value(&self) -> Option<&Value<K, S>> {
        match self {
            TxValue::Value(value) => Some(value),
            TxValue::Map(_) => None,
        }
    }

    /// The staged leaf value, if there is one.
    pub fn as_scalar(&self) -> Option<&S> {
        self.as_value().and_then(Value::as_scalar)
    }

    pub fn into_value_mut(self) -> Option<&'tx mut Value<K, S>> {
        match self {
            TxValue::Value(value) => Some(value),
            TxValue::Map(_) => None,
        }
    }

    pub fn into_map(self) -> Option<NestedTransaction<'tx, K, S>> {
        match self {
            TxValue::Map(map) => Some(map),
            TxValue::Value(_) => None,
        }
    }

    /// Materializes the effective value, applying any staged nested changes.
    pub fn to_value(&self) -> Value<K, S> {
        match self {
            TxValue::Value(value) => (**value).clone(),
            TxValue::Map(map) => Value::Map(map.snapshot()),
        }
    }
}
