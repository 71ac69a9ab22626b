// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! JSON representation
//!
//! Maps convert to JSON objects and scalars to their natural JSON counterparts. Byte strings
//! are encoded as base64 strings, so they come back as [`Scalar::String`].
//!
//! JSON arrays have no [`Value`] representation and are rejected when converting from JSON.
//!
//! # Examples
//!
//! ```json
//! {
//!   "name": "John Doe",
//!   "age": 43,
//!   "address": {
//!     "city": "Berlin"
//!   }
//! }
//! ```
use crate::{Error, Map, Result, Scalar, Value, create_map};
use serde_json::Value as Json;

/// Converts a [`Scalar`] to a [`serde_json::Value`].
///
/// Non-finite floats become `null`, as JSON cannot represent them.
impl From<Scalar> for Json {
    fn from(val: Scalar) -> Self {
        match val {
            Scalar::Null => Json::Null,
            Scalar::Bytes(v) => {
                base64::Engine::encode(&base64::engine::general_purpose::STANDARD, v).into()
            }
            Scalar::String(v) => v.into(),
            Scalar::F64(v) => v.into(),
            Scalar::U64(v) => v.into(),
            Scalar::I64(v) => v.into(),
            Scalar::Bool(v) => v.into(),
        }
    }
}

/// Converts a [`Value`] to a [`serde_json::Value`].
impl From<Value<String, Scalar>> for Json {
    fn from(val: Value<String, Scalar>) -> Self {
        match val {
            Value::Scalar(s) => s.into(),
            Value::Map(map) => to_json(map),
        }
    }
}

/// Converts a [`Map`] to a JSON object.
pub fn to_json(map: Map<String, Scalar>) -> Json {
    let obj = map.into_iter().map(|(k, v)| (k, Json::from(v))).collect();
    Json::Object(obj)
}

/// Converts a [`serde_json::Value`] into a [`Value`].
///
/// Integers that fit an `i64` become [`Scalar::I64`], larger ones [`Scalar::U64`].
impl TryFrom<Json> for Value<String, Scalar> {
    type Error = Error;

    fn try_from(json: Json) -> Result<Self> {
        Ok(match json {
            Json::Null => Scalar::Null.into(),
            Json::Bool(b) => b.into(),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.into()
                } else if let Some(u) = n.as_u64() {
                    u.into()
                } else {
                    n.as_f64().map(Scalar::F64).unwrap_or(Scalar::Null).into()
                }
            }
            Json::String(s) => s.into(),
            Json::Array(_) => return Err(Error::Unsupported { found: "array" }),
            Json::Object(obj) => Value::Map(object_to_map(obj)?),
        })
    }
}

fn object_to_map(obj: serde_json::Map<String, Json>) -> Result<Map<String, Scalar>> {
    let mut map = create_map();
    for (k, v) in obj {
        map.insert(k, Value::try_from(v)?);
    }
    Ok(map)
}

/// Parses a JSON document into a [`Map`] that a transaction can be opened over.
///
/// # Errors
///
/// [`Error::PreconditionViolation`] if the document is not a JSON object, and
/// [`Error::Unsupported`] if it contains an array.
///
/// # Example
///
/// ```
/// # use txmap::{from_json, map};
/// let map = from_json(serde_json::json!({ "a": 1, "n": { "b": "x" } })).unwrap();
/// assert_eq!(map, map! { "a" => 1, "n" => { "b" => "x" } });
/// ```
pub fn from_json(json: Json) -> Result<Map<String, Scalar>> {
    match json {
        Json::Object(obj) => object_to_map(obj),
        other => Err(Error::PreconditionViolation {
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
