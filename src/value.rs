// ABOUTME: Value types representing template data and rendered results

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use std::fmt;

/// A dynamically typed template value.
///
/// Integers and floats are distinct variants and stay distinct through
/// arithmetic; maps preserve insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// The name of this value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Boolean interpretation of a value.
    ///
    /// Nil, false, the empty string, numeric zero, the empty list and the
    /// empty map are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Convert a JSON document into a template value.
    ///
    /// JSON numbers become integers when they fit `i64`, floats otherwise.
    /// Object key order is preserved.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => {
                Value::List(arr.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(obj) => {
                let mut map = IndexMap::new();
                for (key, val) in obj {
                    map.insert(key.clone(), Value::from_json(val));
                }
                Value::Map(map)
            }
        }
    }

    /// Convert a template value into a JSON document.
    ///
    /// Fails for non-finite floats, which JSON cannot represent.
    pub fn to_json(&self) -> Result<serde_json::Value, String> {
        match self {
            Value::Nil => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Int(n) => Ok(serde_json::Value::Number((*n).into())),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| format!("cannot represent {} as JSON", f)),
            Value::String(s) => Ok(serde_json::Value::String(s.clone())),
            Value::List(items) => {
                let json_items: Result<Vec<_>, _> = items.iter().map(Value::to_json).collect();
                Ok(serde_json::Value::Array(json_items?))
            }
            Value::Map(map) => {
                let mut json_map = serde_json::Map::new();
                for (key, val) in map {
                    json_map.insert(key.clone(), val.to_json()?);
                }
                Ok(serde_json::Value::Object(json_map))
            }
        }
    }

    // Debug rendering used inside containers, where bare strings would be
    // ambiguous.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Nil => write!(f, "nil"),
            other => write!(f, "{}", other),
        }
    }
}

/// Serialize with the same JSON mapping as [`Value::to_json`]: nil becomes
/// null, integers stay integers, map entries keep insertion order.
impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut entries = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    entries.serialize_entry(key, value)?;
                }
                entries.end()
            }
        }
    }
}

/// Output formatting for interpolated values.
///
/// Strings render as themselves, nil as the empty string, floats in their
/// shortest round-trip form. Lists and maps have a debug form that is only
/// reached via misuse and is not a stable format.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    value.fmt_nested(f)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_and_float_display() {
        assert_eq!(format!("{}", Value::Int(42)), "42");
        assert_eq!(format!("{}", Value::Int(-7)), "-7");
        assert_eq!(format!("{}", Value::Float(-2.5)), "-2.5");
        // Shortest round-trip form drops a redundant fraction
        assert_eq!(format!("{}", Value::Float(2.0)), "2");
    }

    #[test]
    fn test_nil_renders_empty() {
        assert_eq!(format!("{}", Value::Nil), "");
    }

    #[test]
    fn test_bool_display() {
        assert_eq!(format!("{}", Value::Bool(true)), "true");
        assert_eq!(format!("{}", Value::Bool(false)), "false");
    }

    #[test]
    fn test_string_renders_raw() {
        assert_eq!(format!("{}", Value::String("hello".into())), "hello");
    }

    #[test]
    fn test_list_debug_form() {
        let list = Value::List(vec![Value::Int(1), Value::String("a".into()), Value::Nil]);
        assert_eq!(format!("{}", list), "[1, \"a\", nil]");
    }

    #[test]
    fn test_map_debug_form_keeps_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("z".to_string(), Value::Int(1));
        map.insert("a".to_string(), Value::Int(2));
        assert_eq!(format!("{}", Value::Map(map)), "{z: 1, a: 2}");
    }

    #[test]
    fn test_truthiness_table() {
        let falsy = [
            Value::Nil,
            Value::Bool(false),
            Value::String(String::new()),
            Value::Int(0),
            Value::Float(0.0),
            Value::List(vec![]),
            Value::Map(IndexMap::new()),
        ];
        for v in falsy {
            assert!(!v.is_truthy(), "{:?} should be falsy", v);
        }

        let truthy = [
            Value::Bool(true),
            Value::String(" ".into()),
            Value::Int(-1),
            Value::Float(0.5),
            Value::List(vec![Value::Nil]),
        ];
        for v in truthy {
            assert!(v.is_truthy(), "{:?} should be truthy", v);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let doc: serde_json::Value = serde_json::from_str(
            r#"{"name": "alice", "age": 30, "tags": ["a", "b"], "score": 1.5, "ok": true, "missing": null}"#,
        )
        .unwrap();

        let value = Value::from_json(&doc);
        match &value {
            Value::Map(map) => {
                assert_eq!(map.get("name"), Some(&Value::String("alice".into())));
                assert_eq!(map.get("age"), Some(&Value::Int(30)));
                assert_eq!(map.get("score"), Some(&Value::Float(1.5)));
                assert_eq!(map.get("missing"), Some(&Value::Nil));
            }
            other => panic!("expected map, got {:?}", other),
        }

        assert_eq!(value.to_json().unwrap(), doc);
    }

    #[test]
    fn test_serialize_matches_json_mapping() {
        let mut map = IndexMap::new();
        map.insert("n".to_string(), Value::Int(1));
        map.insert("gone".to_string(), Value::Nil);
        map.insert("xs".to_string(), Value::List(vec![Value::Bool(true)]));
        let value = Value::Map(map);

        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"n":1,"gone":null,"xs":[true]}"#
        );
    }

    #[test]
    fn test_non_finite_float_rejected_by_json() {
        assert!(Value::Float(f64::NAN).to_json().is_err());
        assert!(Value::Float(f64::INFINITY).to_json().is_err());
    }
}
