// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Convenience macro for creating a [`Map`](crate::Map) with `String` keys and
/// [`Scalar`](crate::Scalar) leaves.
///
/// Keys are anything `String` can be built from. Values are either a single token tree that
/// converts into a [`Value`](crate::Value) or a brace-delimited nested map. Values made of more
/// than one token need parentheses.
///
/// ```rust
/// # use txmap::{Scalar, Value, map};
/// let map = map! {
///     "field_x" => "Hello",
///     "field_y" => 42,
///     "field_n" => (Scalar::Null),
///     "field_z" => {
///         "field_x" => "Nested",
///         "field_y" => true
///     }
/// };
/// assert_eq!(map.len(), 4);
/// assert!(map["field_z"].is_map());
/// assert_eq!(map["field_n"], Value::Scalar(Scalar::Null));
/// ```
///
/// An empty invocation creates an empty map:
/// ```rust
/// # use txmap::map;
/// assert!(map! {}.is_empty());
/// ```
#[macro_export]
macro_rules! map {
    // Helpers for creating map values
    (@value { $($inner:tt)* }) => {
        $crate::Value::Map($crate::map! { $($inner)* })
    };
    (@value $v:expr) => {
        $crate::Value::<::std::string::String, $crate::Scalar>::from($v)
    };

    () => {
        $crate::Map::<::std::string::String, $crate::Scalar>::default()
    };

    ($($k:expr => $v:tt),+ $(,)?) => {
        {
            let mut map = $crate::Map::<::std::string::String, $crate::Scalar>::default();
            $( map.insert(::std::string::String::from($k), $crate::map!(@value $v)); )+
            map
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Map, Scalar, Value};

    #[test]
    fn flat_literal() {
        let map = map! { "a" => 1, "b" => "x", "c" => 2.5, "d" => false, };
        let mut expected = Map::default();
        expected.insert("a".to_string(), Value::Scalar(Scalar::I64(1)));
        expected.insert("b".to_string(), Value::Scalar(Scalar::String("x".into())));
        expected.insert("c".to_string(), Value::Scalar(Scalar::F64(2.5)));
        expected.insert("d".to_string(), Value::Scalar(Scalar::Bool(false)));
        assert_eq!(map, expected);
    }

    #[test]
    fn nested_literal() {
        let map = map! {
            "outer" => {
                "inner" => { "leaf" => 7u64 },
                "empty" => {}
            }
        };
        let outer = map["outer"].as_map().unwrap();
        assert_eq!(outer["empty"], Value::Map(Map::default()));
        let inner = outer["inner"].as_map().unwrap();
        assert_eq!(inner["leaf"], Value::Scalar(Scalar::U64(7)));
    }

    #[test]
    fn later_keys_win() {
        let map = map! { "a" => 1, "a" => 2 };
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], Value::Scalar(Scalar::I64(2)));
    }

    #[test]
    fn values_can_be_expressions() {
        let name = String::from("Alice");
        let map = map! { "name" => (name.clone()), "bytes" => (vec![1u8, 2]) };
        assert_eq!(map["name"], Value::Scalar(Scalar::String(name)));
        assert_eq!(map["bytes"], Value::Scalar(Scalar::Bytes(vec![1, 2])));
    }
}
