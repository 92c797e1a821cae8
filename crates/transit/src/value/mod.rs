//! In-memory value model.
//!
//! [`Value`] is the closed set of kinds the engine writes and reads
//! natively, plus two open slots: [`Value::Tagged`] for tags nobody has a
//! read handler for, and [`Value::Ext`] for application types.
//!
//! `Value` is `Eq + Hash` so it can key maps and populate sets. Floats are
//! compared by normalized bits (every NaN is equal to every other NaN,
//! `-0.0 == 0.0`); maps and sets compare and hash without regard to order.

mod display;
mod extension;
mod types;

pub use extension::{DynExtension, ExtValue, Extension};
pub use types::{Link, LinkRender, Ratio, TaggedValue, TypedArray};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::handlers::TypeKey;

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    String(String),
    /// Arbitrary precision; the transport decides whether it travels as a
    /// native number or as a `~n` string.
    Integer(BigInt),
    Float(f64),
    Decimal(BigDecimal),
    Keyword(String),
    Symbol(String),
    Char(char),
    /// Millisecond resolution on the wire.
    Instant(DateTime<Utc>),
    Uuid(Uuid),
    Uri(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    List(Vec<Value>),
    Set(IndexSet<Value>),
    Map(IndexMap<Value, Value>),
    TypedArray(TypedArray),
    Ratio(Ratio),
    Link(Link),
    Tagged(TaggedValue),
    Ext(ExtValue),
}

/// Bit pattern used for float equality and hashing.
pub(crate) fn float_key(f: f64) -> u64 {
    if f.is_nan() {
        u64::MAX
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items
        .map(|item| {
            let mut h = DefaultHasher::new();
            item.hash(&mut h);
            h.finish()
        })
        .fold(0u64, u64::wrapping_add)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => float_key(*a) == float_key(*b),
            (Decimal(a), Decimal(b)) => a == b,
            (Keyword(a), Keyword(b)) => a == b,
            (Symbol(a), Symbol(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Instant(a), Instant(b)) => a == b,
            (Uuid(a), Uuid(b)) => a == b,
            (Uri(a), Uri(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Set(a), Set(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (TypedArray(a), TypedArray(b)) => a == b,
            (Ratio(a), Ratio(b)) => a == b,
            (Link(a), Link(b)) => a == b,
            (Tagged(a), Tagged(b)) => a == b,
            (Ext(a), Ext(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::String(s) | Value::Keyword(s) | Value::Symbol(s) | Value::Uri(s) => {
                s.hash(state)
            }
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => float_key(*f).hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Instant(t) => t.hash(state),
            Value::Uuid(u) => u.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Array(items) | Value::List(items) => items.hash(state),
            Value::Set(set) => {
                set.len().hash(state);
                unordered_hash(set.iter()).hash(state);
            }
            Value::Map(map) => {
                map.len().hash(state);
                unordered_hash(map.iter()).hash(state);
            }
            Value::TypedArray(t) => t.hash(state),
            Value::Ratio(r) => r.hash(state),
            Value::Link(l) => l.hash(state),
            Value::Tagged(t) => t.hash(state),
            Value::Ext(e) => e.hash(state),
        }
    }
}

impl Value {
    pub fn keyword(name: impl Into<String>) -> Self {
        Value::Keyword(name.into())
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        Value::Uri(uri.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(items.into_iter().collect())
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(entries.into_iter().collect())
    }

    pub fn tagged(tag: impl Into<String>, rep: Value) -> Self {
        Value::Tagged(TaggedValue::new(tag, rep))
    }

    pub fn ext<T: Extension>(value: T) -> Self {
        Value::Ext(ExtValue::new(value))
    }

    /// Instant from milliseconds since the Unix epoch.
    pub fn instant_millis(millis: i64) -> Option<Self> {
        crate::time::from_millis(millis).map(Value::Instant)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|i| i64::try_from(i).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<Value, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_ext<T: Extension>(&self) -> Option<&T> {
        match self {
            Value::Ext(e) => e.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Registry key for this value's runtime type.
    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::Null => TypeKey::Null,
            Value::Bool(_) => TypeKey::Bool,
            Value::String(_) => TypeKey::String,
            Value::Integer(_) => TypeKey::Integer,
            Value::Float(_) => TypeKey::Float,
            Value::Decimal(_) => TypeKey::Decimal,
            Value::Keyword(_) => TypeKey::Keyword,
            Value::Symbol(_) => TypeKey::Symbol,
            Value::Char(_) => TypeKey::Char,
            Value::Instant(_) => TypeKey::Instant,
            Value::Uuid(_) => TypeKey::Uuid,
            Value::Uri(_) => TypeKey::Uri,
            Value::Bytes(_) => TypeKey::Bytes,
            Value::Array(_) => TypeKey::Array,
            Value::List(_) => TypeKey::List,
            Value::Set(_) => TypeKey::Set,
            Value::Map(_) => TypeKey::Map,
            Value::TypedArray(_) => TypeKey::TypedArray,
            Value::Ratio(_) => TypeKey::Ratio,
            Value::Link(_) => TypeKey::Link,
            Value::Tagged(_) => TypeKey::Tagged,
            Value::Ext(e) => e.type_key(),
        }
    }

    /// Human-readable type name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::Char(_) => "char",
            Value::Instant(_) => "instant",
            Value::Uuid(_) => "uuid",
            Value::Uri(_) => "uri",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::TypedArray(_) => "typed array",
            Value::Ratio(_) => "ratio",
            Value::Link(_) => "link",
            Value::Tagged(_) => "tagged value",
            Value::Ext(e) => e.type_name(),
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(BigInt::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(BigInt::from(i))
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Value::Integer(BigInt::from(i))
    }
}

impl From<BigInt> for Value {
    fn from(i: BigInt) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Instant(t)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<TypedArray> for Value {
    fn from(t: TypedArray) -> Self {
        Value::TypedArray(t)
    }
}

impl From<Ratio> for Value {
    fn from(r: Ratio) -> Self {
        Value::Ratio(r)
    }
}

impl From<Link> for Value {
    fn from(l: Link) -> Self {
        Value::Link(l)
    }
}

impl From<TaggedValue> for Value {
    fn from(t: TaggedValue) -> Self {
        Value::Tagged(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn hash_of(v: &Value) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn maps_and_sets_ignore_order() {
        let a = Value::map([(Value::keyword("a"), 1.into()), (Value::keyword("b"), 2.into())]);
        let b = Value::map([(Value::keyword("b"), 2.into()), (Value::keyword("a"), 1.into())]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let s1 = Value::set([1.into(), "x".into()]);
        let s2 = Value::set(["x".into(), 1.into()]);
        assert_eq!(s1, s2);
        assert_eq!(hash_of(&s1), hash_of(&s2));
    }

    #[test]
    fn array_and_list_are_distinct_kinds() {
        let items = vec![Value::from(1), Value::from(2)];
        assert_ne!(Value::Array(items.clone()), Value::List(items));
        assert_ne!(Value::from("k"), Value::keyword("k"));
    }

    #[test]
    fn floats_usable_as_set_members() {
        let mut seen = HashSet::new();
        assert!(seen.insert(Value::Float(f64::NAN)));
        assert!(!seen.insert(Value::Float(f64::NAN)));
        assert!(seen.insert(Value::Float(0.0)));
        assert!(!seen.insert(Value::Float(-0.0)));
    }

    #[test]
    fn type_keys_follow_variants() {
        assert_eq!(Value::from(1).type_key(), TypeKey::Integer);
        assert_eq!(Value::list([]).type_key(), TypeKey::List);
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(7i64).as_i64(), Some(7));
    }
}
