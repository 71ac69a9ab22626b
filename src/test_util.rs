// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Implementation of the quickcheck::Arbitrary trait for values, and for traces of transaction
//! operations.
//!
//! A [`Trace`] is a base map plus a sequence of [`Op`]s. [`Trace::run`] plays the operations
//! against a [`Transaction`] and, in lockstep, against a plain [`Map`] that serves as the
//! reference model: every read made through the transaction must agree with the model, and the
//! returned model is what the transaction's effective map should look like afterwards.
//!
//! Keys are drawn from a small fixed set so that traces frequently revisit the same key, which
//! is where the interesting interactions (delete then set, read caching, nested promotion) live.

use crate::{
    Error, Map, Result, Scalar, Value,
    transaction::{NestedTransaction, Transaction, TxValue},
};
use quickcheck::{Arbitrary, Gen};
use std::{fmt, hash::Hash};

/// The keys traces and generated maps draw from.
pub const KEYS: [&str; 4] = ["a", "b", "c", "d"];

/// How deep generated maps and nested operations go.
const MAX_DEPTH: usize = 2;

impl Arbitrary for Scalar {
    fn arbitrary(g: &mut Gen) -> Self {
        // Skew towards a handful of values, so equal values (and thus no-op writes) are common.
        match *g
            .choose(&["null", "bool", "i64", "u64", "f64", "string", "bytes"])
            .unwrap()
        {
            "null" => Scalar::Null,
            "bool" => Scalar::Bool(bool::arbitrary(g)),
            "i64" => {
                let choices = [-1, 0, 1, 2, i64::arbitrary(g)];
                Scalar::I64(*g.choose(&choices).unwrap())
            }
            "u64" => {
                let choices = [0, 1, u64::arbitrary(g)];
                Scalar::U64(*g.choose(&choices).unwrap())
            }
            "f64" => {
                let choices = [0.0, 1.5, f64::arbitrary(g)];
                Scalar::F64(*g.choose(&choices).unwrap())
            }
            "string" => Scalar::String(g.choose(&["", "x", "hello"]).unwrap().to_string()),
            "bytes" => {
                let choices: [&[u8]; 3] = [&[], &[0], &[1, 2, 3]];
                Scalar::Bytes(g.choose(&choices).unwrap().to_vec())
            }
            _ => unreachable!(),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Scalar::Null => quickcheck::empty_shrinker(),
            Scalar::Bool(b) => Box::new(b.shrink().map(Scalar::Bool)),
            Scalar::I64(i) => Box::new(i.shrink().map(Scalar::I64)),
            Scalar::U64(u) => Box::new(u.shrink().map(Scalar::U64)),
            Scalar::F64(f) => Box::new(f.shrink().map(Scalar::F64)),
            Scalar::String(s) => Box::new(s.shrink().map(Scalar::String)),
            Scalar::Bytes(b) => Box::new(b.shrink().map(Scalar::Bytes)),
        }
    }
}

impl Arbitrary for Value<String, Scalar> {
    fn arbitrary(g: &mut Gen) -> Self {
        arbitrary_value(g, MAX_DEPTH)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Value::Scalar(s) => Box::new(s.shrink().map(Value::Scalar)),
            // shrinking a map to one of its values keeps the structure simple to read
            Value::Map(map) => Box::new(
                map.values()
                    .cloned()
                    .collect::<Vec<_>>()
                    .into_iter()
                    .chain(std::iter::once(Value::Scalar(Scalar::Null))),
            ),
        }
    }
}

fn arbitrary_value(g: &mut Gen, depth: usize) -> Value {
    if depth > 0 && *g.choose(&[false, false, true]).unwrap() {
        Value::Map(arbitrary_map(g, depth - 1))
    } else {
        Value::Scalar(Scalar::arbitrary(g))
    }
}

/// Generates a map over a subset of [`KEYS`], nesting at most `depth` maps deep.
pub fn arbitrary_map(g: &mut Gen, depth: usize) -> Map {
    let mut map = Map::default();
    for key in KEYS {
        if bool::arbitrary(g) {
            map.insert(key.to_string(), arbitrary_value(g, depth));
        }
    }
    map
}

/// A single operation in a [`Trace`].
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Read a key and compare the result with the model.
    Get(String),
    /// Write a value.
    Set(String, Value),
    /// Delete a key; only expected to fail if the key is absent from the model.
    Delete(String),
    /// Read a key and, if it holds a map, run the inner operations on it.
    Nested(String, Vec<Op>),
}

impl Op {
    fn arbitrary_at(g: &mut Gen, depth: usize) -> Self {
        let key = g.choose(&KEYS).unwrap().to_string();
        let kinds: &[&str] = if depth > 0 {
            &["get", "set", "delete", "nested", "nested"]
        } else {
            &["get", "set", "delete"]
        };
        match *g.choose(kinds).unwrap() {
            "get" => Op::Get(key),
            "set" => Op::Set(key, arbitrary_value(g, depth)),
            "delete" => Op::Delete(key),
            "nested" => {
                let len = usize::arbitrary(g) % 5;
                let ops = (0..len).map(|_| Op::arbitrary_at(g, depth - 1)).collect();
                Op::Nested(key, ops)
            }
            _ => unreachable!(),
        }
    }
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        Op::arbitrary_at(g, MAX_DEPTH)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Op::Get(_) | Op::Delete(_) => quickcheck::empty_shrinker(),
            Op::Set(key, value) => {
                let key = key.clone();
                Box::new(value.shrink().map(move |v| Op::Set(key.clone(), v)))
            }
            Op::Nested(key, ops) => {
                let key = key.clone();
                Box::new(ops.shrink().map(move |ops| Op::Nested(key.clone(), ops)))
            }
        }
    }
}

/// A base map and the operations a transaction over it performs.
#[derive(Debug, Clone)]
pub struct Trace {
    pub base: Map,
    pub ops: Vec<Op>,
}

impl Arbitrary for Trace {
    fn arbitrary(g: &mut Gen) -> Self {
        Trace {
            base: arbitrary_map(g, MAX_DEPTH),
            ops: Vec::arbitrary(g),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let base = self.base.clone();
        Box::new(self.ops.shrink().map(move |ops| Trace {
            base: base.clone(),
            ops,
        }))
    }
}

impl Trace {
    /// Plays the operations against `tx`.
    ///
    /// Panics if a read through the transaction disagrees with the reference model. Returns the
    /// model, which is what the transaction's effective map should equal.
    pub fn run(&self, tx: &mut Transaction<'_>) -> Map {
        let mut model = tx.snapshot();
        run_ops(&self.ops, tx, &mut model);
        model
    }
}

/// Anything [`Op`]s can be played against.
trait Target<K>
where
    K: Hash + Eq + fmt::Debug + Clone,
{
    fn read(&mut self, key: &K) -> Result<TxValue<'_, K>>;
    fn write(&mut self, key: K, value: Value<K>);
    fn erase(&mut self, key: &K) -> Result<()>;
}

impl<K> Target<K> for Transaction<'_, K>
where
    K: Hash + Eq + fmt::Debug + Clone,
{
    fn read(&mut self, key: &K) -> Result<TxValue<'_, K>> {
        Transaction::get(self, key)
    }

    fn write(&mut self, key: K, value: Value<K>) {
        Transaction::set(self, key, value)
    }

    fn erase(&mut self, key: &K) -> Result<()> {
        Transaction::delete(self, key)
    }
}

impl<K> Target<K> for NestedTransaction<'_, K>
where
    K: Hash + Eq + fmt::Debug + Clone,
{
    fn read(&mut self, key: &K) -> Result<TxValue<'_, K>> {
        NestedTransaction::get(self, key)
    }

    fn write(&mut self, key: K, value: Value<K>) {
        NestedTransaction::set(self, key, value)
    }

    fn erase(&mut self, key: &K) -> Result<()> {
        NestedTransaction::delete(self, key)
    }
}

// A map that was staged whole with `set` is edited in place, like any other staged value.
impl<K> Target<K> for Map<K>
where
    K: Hash + Eq + fmt::Debug + Clone,
{
    fn read(&mut self, key: &K) -> Result<TxValue<'_, K>> {
        self.get_mut(key)
            .map(TxValue::Value)
            .ok_or_else(|| Error::not_found(key))
    }

    fn write(&mut self, key: K, value: Value<K>) {
        self.insert(key, value);
    }

    fn erase(&mut self, key: &K) -> Result<()> {
        self.remove(key).map(|_| ()).ok_or_else(|| Error::not_found(key))
    }
}

fn run_ops<T: Target<String>>(ops: &[Op], target: &mut T, model: &mut Map) {
    for op in ops {
        match op {
            Op::Get(key) => {
                let read = target.read(key).ok().map(|value| value.to_value());
                assert_eq!(read.as_ref(), model.get(key), "read of {key:?}");
            }
            Op::Set(key, value) => {
                target.write(key.clone(), value.clone());
                model.insert(key.clone(), value.clone());
            }
            Op::Delete(key) => {
                let deleted = target.erase(key);
                assert!(
                    deleted.is_ok() || !model.contains_key(key),
                    "delete of {key:?} failed with {deleted:?}"
                );
                model.remove(key);
            }
            Op::Nested(key, inner) => {
                let Some(Value::Map(model_inner)) = model.get_mut(key) else {
                    continue;
                };
                match target.read(key) {
                    Ok(TxValue::Map(mut nested)) => run_ops(inner, &mut nested, model_inner),
                    Ok(TxValue::Value(Value::Map(staged))) => run_ops(inner, staged, model_inner),
                    other => panic!("expected a map under {key:?}, got {other:?}"),
                }
            }
        }
    }
}
