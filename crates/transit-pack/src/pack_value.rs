//! [`PackValue`]: the node tree shared by the transit engine and the codecs.

/// A node of the generic tree that sits between the transit engine and a
/// byte-level codec.
///
/// This is deliberately the lowest common denominator of JSON and
/// MessagePack: there are no byte strings, extension types or non-string
/// map keys. Everything richer is expressed by transit through tags.
#[derive(Debug, Clone, PartialEq)]
pub enum PackValue {
    /// JSON null / MsgPack nil
    Null,
    Bool(bool),
    /// Any integer that fits in an `i64`.
    Integer(i64),
    /// Unsigned integer above `i64::MAX`.
    UInteger(u64),
    Float(f64),
    Str(String),
    Array(Vec<PackValue>),
    /// Ordered key/value pairs. Order is significant to transit's rolling
    /// cache, so it is never sorted or deduplicated here.
    Object(Vec<(String, PackValue)>),
}

impl PackValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PackValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PackValue]> {
        match self {
            PackValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, PackValue)]> {
        match self {
            PackValue::Object(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Short name of the node kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            PackValue::Null => "null",
            PackValue::Bool(_) => "bool",
            PackValue::Integer(_) | PackValue::UInteger(_) => "integer",
            PackValue::Float(_) => "float",
            PackValue::Str(_) => "string",
            PackValue::Array(_) => "array",
            PackValue::Object(_) => "object",
        }
    }
}

impl From<&str> for PackValue {
    fn from(s: &str) -> Self {
        PackValue::Str(s.to_owned())
    }
}

impl From<String> for PackValue {
    fn from(s: String) -> Self {
        PackValue::Str(s)
    }
}

impl From<i64> for PackValue {
    fn from(i: i64) -> Self {
        PackValue::Integer(i)
    }
}

impl From<bool> for PackValue {
    fn from(b: bool) -> Self {
        PackValue::Bool(b)
    }
}

impl From<serde_json::Value> for PackValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => PackValue::Null,
            serde_json::Value::Bool(b) => PackValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PackValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    PackValue::UInteger(u)
                } else {
                    PackValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => PackValue::Str(s),
            serde_json::Value::Array(arr) => {
                PackValue::Array(arr.into_iter().map(PackValue::from).collect())
            }
            serde_json::Value::Object(obj) => PackValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, PackValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<PackValue> for serde_json::Value {
    fn from(v: PackValue) -> Self {
        match v {
            PackValue::Null => serde_json::Value::Null,
            PackValue::Bool(b) => serde_json::Value::Bool(b),
            PackValue::Integer(i) => serde_json::Value::Number(i.into()),
            PackValue::UInteger(u) => serde_json::Value::Number(u.into()),
            // JSON has no NaN/Infinity; transit never emits them natively.
            PackValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PackValue::Str(s) => serde_json::Value::String(s),
            PackValue::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            PackValue::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_pick_narrowest_node() {
        assert_eq!(PackValue::from(json!(-3)), PackValue::Integer(-3));
        assert_eq!(
            PackValue::from(json!(u64::MAX)),
            PackValue::UInteger(u64::MAX)
        );
        assert_eq!(PackValue::from(json!(0.25)), PackValue::Float(0.25));
    }

    #[test]
    fn object_order_survives_json_conversion() {
        let node = PackValue::Object(vec![
            ("zeta".into(), PackValue::Integer(1)),
            ("alpha".into(), PackValue::Integer(2)),
        ]);
        let back = PackValue::from(serde_json::Value::from(node.clone()));
        assert_eq!(back, node);
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert_eq!(
            serde_json::Value::from(PackValue::Float(f64::NAN)),
            serde_json::Value::Null
        );
    }
}
