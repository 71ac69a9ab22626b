// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Values stored in transactional maps.
//!
//! A [`Value`] is a closed set of two kinds: a leaf [`Scalar`] (or any other leaf type `S` you
//! choose), or a nested [`Map`]. Transactions only ever look inside the `Map` variant; leaves
//! are opaque to them.

use crate::MapRandomState;
use std::{collections::HashMap, fmt, hash::Hash};

/// A key-value map whose values may themselves be maps.
///
/// This is the type transactions operate on. Create one with [`Map::default`] or the
/// [`map!`](crate::map) literal.
pub type Map<K = String, S = Scalar> = HashMap<K, Value<K, S>, MapRandomState>;

/// A value in a [`Map`]: either a leaf, or another map.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Value<K = String, S = Scalar>
where
    K: Hash + Eq,
{
    /// A leaf value.
    Scalar(S),
    /// A nested map.
    Map(Map<K, S>),
}

impl<K, S> Value<K, S>
where
    K: Hash + Eq,
{
    /// Returns the leaf value, if this is not a map.
    pub fn as_scalar(&self) -> Option<&S> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Map(_) => None,
        }
    }

    /// Returns the nested map, if this is one.
    pub fn as_map(&self) -> Option<&Map<K, S>> {
        match self {
            Value::Map(m) => Some(m),
            Value::Scalar(_) => None,
        }
    }

    /// Returns the nested map mutably, if this is one.
    pub fn as_map_mut(&mut self) -> Option<&mut Map<K, S>> {
        match self {
            Value::Map(m) => Some(m),
            Value::Scalar(_) => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Gives a short name to describe the kind of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Map(_) => "map",
        }
    }
}

impl<K, S> From<S> for Value<K, S>
where
    K: Hash + Eq,
{
    fn from(value: S) -> Self {
        Value::Scalar(value)
    }
}

impl<K, S> From<Map<K, S>> for Value<K, S>
where
    K: Hash + Eq,
{
    fn from(map: Map<K, S>) -> Self {
        Value::Map(map)
    }
}

/// The default leaf type of a [`Value`].
// NOTE: Why no U32 or I32? Make this a serialization concern.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Scalar {
    /// An explicit "no value". Distinct from a deleted key.
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    // NOTE: the #[serde] here is needed to get efficient encoding of byte-arrays for
    // protocols that support it (like msgpack).
    Bytes(#[cfg_attr(feature = "serde", serde(with = "serde_bytes"))] Vec<u8>),
}

macro_rules! impl_from {
(
    $(
        $source:ty => $target:ident $(with $conv:ident)?
    ),* $(,)?
    ) => {
        $(
            impl From<$source> for Scalar {
                fn from(value: $source) -> Self {
                    Self::$target(impl_from!(value$(, $conv)?))
                }
            }

            impl<K> From<$source> for Value<K, Scalar>
            where
                K: Hash + Eq,
            {
                fn from(value: $source) -> Self {
                    Value::Scalar(Scalar::from(value))
                }
            }
        )*
    };

    ($value:ident, $conv:ident) => {
        $value.$conv()
    };

    ($value:ident) => {
        $value
    };
}

impl_from!(
    &[u8]      => Bytes with into,
    Vec<u8>    => Bytes,
    String     => String,
    &str       => String with to_string,
    f64        => F64,
    u8         => U64 with into,
    u16        => U64 with into,
    u32        => U64 with into,
    u64        => U64,
    i8         => I64 with into,
    i16        => I64 with into,
    i32        => I64 with into,
    i64        => I64,
    bool       => Bool,
);

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bytes(inner) => write!(f, "{inner:02X?}"),
            Self::String(inner) => inner.fmt(f),
            Self::Bool(inner) => inner.fmt(f),
            // Always print at least 1 decimal, so floats and I64 are not ambiguous.
            Self::F64(inner) => write!(f, "{inner:?}d"),
            Self::U64(inner) => write!(f, "{inner}u"),
            Self::I64(inner) => write!(f, "{inner}"),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        use Scalar::*;
        match (self, other) {
            (Null, Null) => true,
            (Bytes(b1), Bytes(b2)) => b1.eq(b2),
            (String(s1), String(s2)) => s1.eq(s2),
            (F64(d1), F64(d2)) => d1.total_cmp(d2).is_eq(),
            (U64(u1), U64(u2)) => u1.eq(u2),
            (I64(i1), I64(i2)) => i1.eq(i2),
            (Bool(b1), Bool(b2)) => b1.eq(b2),
            _ => false,
        }
    }
}
impl Eq for Scalar {}

impl PartialEq<str> for Scalar {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Self::String(s) if s == other)
    }
}
impl PartialEq<&str> for Scalar {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Self::String(s) if s == other)
    }
}
impl PartialEq<bool> for Scalar {
    fn eq(&self, other: &bool) -> bool {
        matches!(self, Self::Bool(b) if b == other)
    }
}
impl PartialEq<i64> for Scalar {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Self::I64(i) if i == other)
    }
}
impl PartialEq<u64> for Scalar {
    fn eq(&self, other: &u64) -> bool {
        matches!(self, Self::U64(u) if u == other)
    }
}
