//! JSON-shaped value tree used as the encoded form of every codec.
//!
//! Codecs produce and consume `Value` trees; the envelope serializers turn
//! the root tree plus the session's blobs into bytes. Blob references appear
//! in the tree as ordinary strings of the form `blob:<id>` and are only
//! meaningful to the session that created them.
//!
//! ## Wire rules
//!
//! | Variant | JSON |
//! |---------|------|
//! | Null | `null` |
//! | Bool | `true`/`false` |
//! | Int | number |
//! | Float (finite) | number |
//! | Float (NaN, ±Inf) | `{"$f64": "NaN" \| "+Inf" \| "-Inf"}` |
//! | String | `"..."` |
//! | Array | `[...]` |
//! | Object | `{...}` |
//!
//! `-0.0` survives plain JSON and needs no wrapper. Objects use a `BTreeMap`
//! so serialized output has deterministic key order.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A JSON-compatible tree: the encoded form exchanged between codecs and
/// envelope serializers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON null.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit IEEE-754 float. Non-finite values travel through the `$f64`
    /// wrapper object.
    Float(f64),
    /// UTF-8 string. Blob references are strings with a `blob:` prefix.
    String(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// String-keyed mapping with deterministic iteration order.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Variant name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// True for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow as float. Integers do not coerce.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric view: integers and floats both read as `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as array slice.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as object map.
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Object field lookup; `None` for non-objects and missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Object(value)
    }
}

/// Wrapper key for floats JSON cannot carry.
const F64_WRAPPER: &str = "$f64";

fn special_float_str(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f == f64::INFINITY {
        "+Inf"
    } else {
        "-Inf"
    }
}

fn special_float_value(s: &str) -> Option<f64> {
    match s {
        "NaN" => Some(f64::NAN),
        "+Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(F64_WRAPPER, special_float_str(*f))?;
                map.end()
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map_) => {
                let mut map = serializer.serialize_map(Some(map_.len()))?;
                for (key, value) in map_ {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON value")
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        if v <= i64::MAX as u64 {
            Ok(Value::Int(v as i64))
        } else {
            Ok(Value::Float(v as f64))
        }
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        if map.len() == 1 {
            if let Some(Value::String(tag)) = map.get(F64_WRAPPER) {
                return match special_float_value(tag) {
                    Some(f) => Ok(Value::Float(f)),
                    None => Err(de::Error::custom(format!("invalid $f64 value: {tag}"))),
                };
            }
        }
        Ok(Value::Object(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: &Value) -> Value {
        let json = serde_json::to_string(value).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    // === Scalars ===

    #[test]
    fn test_roundtrip_null() {
        assert_eq!(roundtrip(&Value::Null), Value::Null);
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
    }

    #[test]
    fn test_roundtrip_bool() {
        for b in [true, false] {
            assert_eq!(roundtrip(&Value::Bool(b)), Value::Bool(b));
        }
    }

    #[test]
    fn test_roundtrip_int() {
        for i in [0, 1, -1, i64::MAX, i64::MIN] {
            assert_eq!(roundtrip(&Value::Int(i)), Value::Int(i));
        }
    }

    #[test]
    fn test_roundtrip_float_normal() {
        for f in [0.0, 1.5, -2.5, 1e10, 1e-10] {
            assert_eq!(roundtrip(&Value::Float(f)), Value::Float(f));
        }
    }

    #[test]
    fn test_roundtrip_string() {
        for s in ["", "hello", "日本語", "a\n\t\"b", "blob:0000"] {
            assert_eq!(roundtrip(&Value::from(s)), Value::from(s));
        }
    }

    // === $f64 wrapper ===

    #[test]
    fn test_nan_uses_wrapper() {
        let json = serde_json::to_string(&Value::Float(f64::NAN)).unwrap();
        assert_eq!(json, r#"{"$f64":"NaN"}"#);
        match roundtrip(&Value::Float(f64::NAN)) {
            Value::Float(f) => assert!(f.is_nan()),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn test_infinities_use_wrapper() {
        assert_eq!(
            serde_json::to_string(&Value::Float(f64::INFINITY)).unwrap(),
            r#"{"$f64":"+Inf"}"#
        );
        assert_eq!(
            roundtrip(&Value::Float(f64::NEG_INFINITY)),
            Value::Float(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_negative_zero_stays_plain() {
        let json = serde_json::to_string(&Value::Float(-0.0)).unwrap();
        assert!(!json.contains("$f64"));
        match roundtrip(&Value::Float(-0.0)) {
            Value::Float(f) => {
                assert_eq!(f, 0.0);
                assert!(f.is_sign_negative());
            }
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_f64_wrapper_rejected() {
        let result: Result<Value, _> = serde_json::from_str(r#"{"$f64":"bogus"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_f64_wrapper_collision_multi_key() {
        // A two-key object that happens to contain $f64 is an ordinary object.
        let value: Value = serde_json::from_str(r#"{"$f64":"NaN","extra":1}"#).unwrap();
        assert!(matches!(value, Value::Object(ref m) if m.len() == 2));
    }

    // === Containers ===

    #[test]
    fn test_roundtrip_nested() {
        let mut inner = BTreeMap::new();
        inner.insert("shape".to_string(), Value::Array(vec![Value::Int(3)]));
        inner.insert("dtype".to_string(), Value::from("int64"));
        let value = Value::Array(vec![Value::Object(inner), Value::Null, Value::Bool(true)]);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_object_keys_sorted_in_output() {
        let mut map = BTreeMap::new();
        map.insert("z".to_string(), Value::Int(1));
        map.insert("a".to_string(), Value::Int(2));
        let json = serde_json::to_string(&Value::Object(map)).unwrap();
        assert_eq!(json, r#"{"a":2,"z":1}"#);
    }

    // === Accessors ===

    #[test]
    fn test_accessors() {
        let mut map = BTreeMap::new();
        map.insert("count".to_string(), Value::Int(4));
        let obj = Value::Object(map);
        assert_eq!(obj.get("count").and_then(Value::as_int), Some(4));
        assert_eq!(obj.get("missing"), None);
        assert_eq!(Value::Int(3).as_number(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_number(), Some(2.5));
        assert_eq!(Value::from("x").as_number(), None);
    }
}
