//! JSON bridge (`feature = "json"`): converts between a generic
//! `serde_json::Value` document and this crate's abstract [`Value`].
//!
//! Binary data has no native JSON representation, so `Value::Binary` round-
//! trips through a single-key wrapper object `{"$binary": "<hex>"}`.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::EncodeError;
use crate::value::Value;

const BINARY_KEY: &str = "$binary";

/// Converts a `serde_json::Value` into this crate's `Value`.
pub fn value_from_json(json: &serde_json::Value) -> Result<Value, EncodeError> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i as i128))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Int(u as i128))
            } else {
                // Floating-point numbers have no wire encoding (§1 non-goal).
                Err(EncodeError::UnsupportedType)
            }
        }
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(value_from_json(item)?);
            }
            Ok(Value::Array(out))
        }
        serde_json::Value::Object(map) => {
            if map.len() == 1 {
                if let Some(serde_json::Value::String(hex_str)) = map.get(BINARY_KEY) {
                    let bytes = hex::decode(hex_str).map_err(|_| EncodeError::InvalidMapKey)?;
                    return Ok(Value::Binary(bytes));
                }
            }
            let mut out = BTreeMap::new();
            for (k, v) in map.iter() {
                out.insert(k.clone(), value_from_json(v)?);
            }
            Ok(Value::Map(out))
        }
    }
}

/// Converts this crate's `Value` into a `serde_json::Value`.
pub fn json_from_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(v) => {
            if let Ok(i) = i64::try_from(*v) {
                serde_json::Value::Number(serde_json::Number::from(i))
            } else {
                // Falls back to the value's decimal string form if it does
                // not fit in i64 (e.g. a full UINT64 range value).
                serde_json::Value::String(v.to_string())
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Binary(b) => {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(
                String::from(BINARY_KEY),
                serde_json::Value::String(hex::encode(b)),
            );
            serde_json::Value::Object(wrapper)
        }
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(json_from_value).collect())
        }
        Value::Map(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map.iter() {
                out.insert(k.clone(), json_from_value(v));
            }
            serde_json::Value::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn binary_round_trips_through_hex_wrapper() {
        let original = Value::Binary(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let json = json_from_value(&original);
        assert_eq!(json["$binary"], "deadbeef");
        let back = value_from_json(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn plain_object_is_not_mistaken_for_binary_wrapper() {
        let json = serde_json::json!({"$binary": 5});
        let back = value_from_json(&json).unwrap();
        assert!(matches!(back, Value::Map(_)));
    }

    #[test]
    fn float_has_no_encoding() {
        let json = serde_json::json!(1.5);
        let err = value_from_json(&json).unwrap_err();
        assert_eq!(err, EncodeError::UnsupportedType);
    }
}
