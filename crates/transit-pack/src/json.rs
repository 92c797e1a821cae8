//! JSON codec for [`PackValue`] trees.
//!
//! Parsing and printing is delegated to `serde_json`, streaming straight
//! into and out of [`PackValue`]. Objects keep every key in the order it was
//! written, repeats included: two keys of one object may be the same rolling
//! cache code standing for different strings. Several top-level values may
//! share one buffer; they are separated by whitespace, which is what
//! [`next_value`] walks over.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::PackValue;

impl Serialize for PackValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PackValue::Null => serializer.serialize_unit(),
            PackValue::Bool(b) => serializer.serialize_bool(*b),
            PackValue::Integer(i) => serializer.serialize_i64(*i),
            PackValue::UInteger(u) => serializer.serialize_u64(*u),
            // JSON has no NaN/Infinity; transit never emits them natively.
            PackValue::Float(f) if !f.is_finite() => serializer.serialize_unit(),
            PackValue::Float(f) => serializer.serialize_f64(*f),
            PackValue::Str(s) => serializer.serialize_str(s),
            PackValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PackValue::Object(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, value) in pairs {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

struct PackValueVisitor;

impl<'de> Visitor<'de> for PackValueVisitor {
    type Value = PackValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<PackValue, E> {
        Ok(PackValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<PackValue, E> {
        Ok(PackValue::Null)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<PackValue, E> {
        Ok(PackValue::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<PackValue, E> {
        Ok(PackValue::Integer(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<PackValue, E> {
        Ok(i64::try_from(u).map_or(PackValue::UInteger(u), PackValue::Integer))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<PackValue, E> {
        Ok(PackValue::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<PackValue, E> {
        Ok(PackValue::Str(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<PackValue, E> {
        Ok(PackValue::Str(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PackValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(PackValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<PackValue, A::Error> {
        let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0).min(1024));
        while let Some(entry) = map.next_entry::<String, PackValue>()? {
            pairs.push(entry);
        }
        Ok(PackValue::Object(pairs))
    }
}

impl<'de> Deserialize<'de> for PackValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PackValueVisitor)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error(transparent)]
    Syntax(#[from] serde_json::Error),
}

/// Serialize a node tree to compact JSON bytes.
pub fn to_vec(value: &PackValue) -> Result<Vec<u8>, JsonError> {
    Ok(serde_json::to_vec(value)?)
}

/// Serialize a node tree to a compact JSON string.
pub fn to_string(value: &PackValue) -> Result<String, JsonError> {
    Ok(serde_json::to_string(value)?)
}

/// Parse exactly one JSON document.
pub fn from_slice(input: &[u8]) -> Result<PackValue, JsonError> {
    Ok(serde_json::from_slice(input)?)
}

/// Parse one JSON document from a UTF-8 string.
pub fn from_str(input: &str) -> Result<PackValue, JsonError> {
    from_slice(input.as_bytes())
}

/// Read the next whitespace-separated document from `input`.
///
/// Returns `None` when only whitespace is left, otherwise the parsed node
/// and the number of bytes consumed (trailing separator excluded).
pub fn next_value(input: &[u8]) -> Option<Result<(PackValue, usize), JsonError>> {
    let mut stream = serde_json::Deserializer::from_slice(input).into_iter::<PackValue>();
    match stream.next()? {
        Ok(node) => Some(Ok((node, stream.byte_offset()))),
        Err(err) => Some(Err(err.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_output_keeps_key_order() {
        let node = PackValue::Object(vec![
            ("~:b".into(), PackValue::Integer(2)),
            ("~:a".into(), PackValue::Integer(1)),
        ]);
        assert_eq!(to_string(&node).unwrap(), r#"{"~:b":2,"~:a":1}"#);
    }

    #[test]
    fn next_value_walks_a_stream() {
        let input = b"[\"~#'\",1]\n{\"a\":true}\n  ";
        let (first, used) = next_value(input).unwrap().unwrap();
        assert_eq!(
            first,
            PackValue::Array(vec![PackValue::from("~#'"), PackValue::Integer(1)])
        );
        let rest = &input[used..];
        let (second, used2) = next_value(rest).unwrap().unwrap();
        assert_eq!(
            second,
            PackValue::Object(vec![("a".into(), PackValue::Bool(true))])
        );
        assert!(next_value(&rest[used2..]).is_none());
    }

    #[test]
    fn repeated_object_keys_are_kept_in_order() {
        let text = r#"{"^!":[1],"^!":2}"#;
        let node = from_str(text).unwrap();
        assert_eq!(
            node,
            PackValue::Object(vec![
                ("^!".into(), PackValue::Array(vec![PackValue::Integer(1)])),
                ("^!".into(), PackValue::Integer(2)),
            ])
        );
        assert_eq!(to_string(&node).unwrap(), text);
    }

    #[test]
    fn numbers_pick_narrowest_node() {
        assert_eq!(from_str("-3").unwrap(), PackValue::Integer(-3));
        assert_eq!(from_str("7").unwrap(), PackValue::Integer(7));
        assert_eq!(
            from_str("18446744073709551615").unwrap(),
            PackValue::UInteger(u64::MAX)
        );
        assert_eq!(from_str("1.0").unwrap(), PackValue::Float(1.0));
        assert_eq!(to_string(&PackValue::Float(f64::NAN)).unwrap(), "null");
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(from_str("{\"a\":").is_err());
        assert!(matches!(next_value(b"[1,"), Some(Err(_))));
    }
}
