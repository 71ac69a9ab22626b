use super::Transaction;
use crate::{Error, Map, Value};
use std::{fmt, hash::Hash};

/// Runs `scope` inside a transaction over `base`.
///
/// If `scope` returns `Ok`, the transaction is committed. If it returns `Err`, the transaction
/// is aborted and the error is returned unchanged. A panic inside `scope` unwinds past this
/// function without committing, so the base is left untouched.
///
/// # Example
///
/// ```
/// use txmap::{Scalar, map, transaction::transact};
///
/// let mut data = map! { "1" => 1 };
/// let read: Result<_, txmap::Error> = transact(&mut data, |tx| {
///     tx.set("1", "a");
///     Ok(tx.get(&"1".to_string())?.as_scalar().cloned())
/// });
/// assert_eq!(read, Ok(Some(Scalar::from("a"))));
/// assert_eq!(data, map! { "1" => "a" });
/// ```
pub fn transact<K, S, T, E, F>(base: &mut Map<K, S>, scope: F) -> Result<T, E>
where
    K: Hash + Eq + fmt::Debug + Clone,
    S: Clone,
    F: FnOnce(&mut Transaction<'_, K, S>) -> Result<T, E>,
{
    let mut tx = Transaction::new(base);
    match scope(&mut tx) {
        Ok(out) => {
            tx.commit();
            Ok(out)
        }
        Err(e) => {
            tx.abort();
            Err(e)
        }
    }
}

/// Like [`transact`], for a base that is only known to be a [`Value`].
///
/// # Errors
///
/// Fails with [`Error::PreconditionViolation`], before running `scope`, if `value` is not a
/// map. Errors returned by `scope` are passed through unchanged.
pub fn transact_value<K, S, T, E, F>(value: &mut Value<K, S>, scope: F) -> Result<T, E>
where
    K: Hash + Eq + fmt::Debug + Clone,
    S: Clone,
    E: From<Error>,
    F: FnOnce(&mut Transaction<'_, K, S>) -> Result<T, E>,
{
    match value {
        Value::Map(base) => transact(base, scope),
        other => Err(Error::PreconditionViolation {
            found: other.type_name(),
        }
        .into()),
    }
}
