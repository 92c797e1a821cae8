//! Encoder: turns a [`Value`] into a [`PackValue`] node tree.
//!
//! The walk is depth-first and pre-order: a tag or map key is always passed
//! through the rolling cache before the value under it is encoded, which is
//! the same order in which the decoder sees them.

use indexmap::IndexMap;
use num_bigint::BigInt;
use transit_pack::PackValue;

use crate::cache::RollingCache;
use crate::error::EncodeError;
use crate::handlers::{TypeKey, WriteHandler, WriteHandlers};
use crate::transport::{Transport, TransportProfile};
use crate::value::{Extension, Value};
use crate::{ESC, MAP_AS_ARRAY, RES, SUB, TAG};

/// One-character tags are scalar tags.
pub(crate) fn is_scalar_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some() && chars.next().is_none()
}

/// Prefix strings that would otherwise read as tagged or cached.
fn escape(s: &str) -> String {
    if s.starts_with([ESC, SUB, RES]) {
        format!("{ESC}{s}")
    } else {
        s.to_owned()
    }
}

#[derive(Debug, Clone)]
pub struct Encoder {
    handlers: WriteHandlers,
    profile: TransportProfile,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(Transport::Json)
    }
}

impl Encoder {
    pub fn new(transport: Transport) -> Self {
        Self::with_profile(TransportProfile::new(transport))
    }

    pub fn with_profile(profile: TransportProfile) -> Self {
        Encoder {
            handlers: WriteHandlers::new(profile.scalar_form),
            profile,
        }
    }

    pub fn with_handlers(profile: TransportProfile, handlers: WriteHandlers) -> Self {
        Encoder { handlers, profile }
    }

    pub fn profile(&self) -> &TransportProfile {
        &self.profile
    }

    pub fn handlers(&self) -> &WriteHandlers {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut WriteHandlers {
        &mut self.handlers
    }

    pub fn register_write(
        &mut self,
        key: TypeKey,
        handler: impl WriteHandler + 'static,
    ) -> &mut Self {
        self.handlers.register(key, handler);
        self
    }

    pub fn register_extension<T: Extension>(
        &mut self,
        handler: impl WriteHandler + 'static,
    ) -> &mut Self {
        self.handlers.register_extension::<T>(handler);
        self
    }

    /// Encode one top-level value with a fresh cache.
    pub fn encode(&self, value: &Value) -> Result<PackValue, EncodeError> {
        let mut cache = RollingCache::new();
        self.encode_with_cache(value, &mut cache)
    }

    /// Encode with a caller-managed cache. The cache must be paired with
    /// the one the reading side passes to
    /// [`Decoder::decode_with_cache`](crate::Decoder::decode_with_cache).
    pub fn encode_with_cache(
        &self,
        value: &Value,
        cache: &mut RollingCache,
    ) -> Result<PackValue, EncodeError> {
        Marshal {
            handlers: &self.handlers,
            profile: &self.profile,
            cache,
        }
        .top(value)
    }
}

struct Marshal<'a> {
    handlers: &'a WriteHandlers,
    profile: &'a TransportProfile,
    cache: &'a mut RollingCache,
}

impl<'a> Marshal<'a> {
    /// The registered handler, or its verbose variant when the profile asks
    /// for one.
    fn handler_for(&self, value: &Value) -> &'a dyn WriteHandler {
        let handler = self.handlers.resolve(value);
        match handler.verbose_handler() {
            Some(verbose) if self.profile.verbose => verbose,
            _ => handler,
        }
    }

    fn cached(&mut self, s: String, as_map_key: bool) -> String {
        if self.profile.cache_enabled {
            self.cache.encode(s, as_map_key)
        } else {
            s
        }
    }

    fn emit_string(&mut self, s: String, as_map_key: bool) -> PackValue {
        PackValue::Str(self.cached(s, as_map_key))
    }

    fn top(&mut self, value: &Value) -> Result<PackValue, EncodeError> {
        let tag = self.handler_for(value).tag(value);
        if tag.is_empty() {
            return Err(EncodeError::MissingTag {
                type_name: value.type_name(),
            });
        }
        if self.profile.quote_scalars && is_scalar_tag(&tag) {
            return self.emit_tagged("'", value);
        }
        self.marshal(value, false)
    }

    fn marshal(&mut self, value: &Value, as_map_key: bool) -> Result<PackValue, EncodeError> {
        let handler = self.handler_for(value);
        let tag = handler.tag(value);
        if tag.is_empty() {
            return Err(EncodeError::MissingTag {
                type_name: value.type_name(),
            });
        }
        if as_map_key && !is_scalar_tag(&tag) {
            return Err(EncodeError::InvalidMapKey {
                tag: tag.into_owned(),
                type_name: value.type_name(),
            });
        }
        let rep = handler.rep(value);
        let unexpected = |expected| EncodeError::UnexpectedRep {
            tag: tag.to_string(),
            expected,
        };

        match (tag.as_ref(), rep.as_ref()) {
            ("_", _) if as_map_key => Ok(self.emit_string(format!("{ESC}_"), true)),
            ("_", _) => Ok(PackValue::Null),
            ("s", Value::String(s)) => Ok(self.emit_string(escape(s), as_map_key)),
            ("s", _) => Err(unexpected("string")),
            ("?", Value::Bool(b)) if as_map_key => {
                let flag = if *b { 't' } else { 'f' };
                Ok(self.emit_string(format!("{ESC}?{flag}"), true))
            }
            ("?", Value::Bool(b)) => Ok(PackValue::Bool(*b)),
            ("?", _) => Err(unexpected("boolean")),
            ("i", Value::Integer(i)) => Ok(self.emit_integer(i, as_map_key)),
            ("i", _) => Err(unexpected("integer")),
            ("d", Value::Float(f)) if as_map_key => Ok(self.emit_string(format!("{ESC}d{f:?}"), true)),
            ("d", Value::Float(f)) => Ok(PackValue::Float(*f)),
            ("d", _) => Err(unexpected("float")),
            ("array", Value::Array(items)) => self.emit_array(items),
            ("array", _) => Err(unexpected("array")),
            ("map", Value::Map(map)) => self.emit_map(map),
            ("map", _) => Err(unexpected("map")),
            (tag, rep) => self.emit_encoded(tag, handler, value, rep, as_map_key),
        }
    }

    fn emit_integer(&mut self, i: &BigInt, as_map_key: bool) -> PackValue {
        let in_range = i128::try_from(i)
            .ok()
            .filter(|n| self.profile.int_range.contains(*n));
        if let (Some(n), false) = (in_range, as_map_key) {
            if let Ok(v) = i64::try_from(n) {
                return PackValue::Integer(v);
            }
            if let Ok(v) = u64::try_from(n) {
                return PackValue::UInteger(v);
            }
        }
        let tag = if in_range.is_some() { 'i' } else { 'n' };
        self.emit_string(format!("{ESC}{tag}{i}"), as_map_key)
    }

    /// Everything that is not a ground type: extension tags, one-character
    /// semantic scalars and the built-in composites.
    fn emit_encoded(
        &mut self,
        tag: &str,
        handler: &dyn WriteHandler,
        value: &Value,
        rep: &Value,
        as_map_key: bool,
    ) -> Result<PackValue, EncodeError> {
        if is_scalar_tag(tag) {
            if let Value::String(s) = rep {
                return Ok(self.emit_string(format!("{ESC}{tag}{s}"), as_map_key));
            }
            if as_map_key || self.profile.prefer_strings {
                match handler.string_rep(value) {
                    Some(s) => return Ok(self.emit_string(format!("{ESC}{tag}{s}"), as_map_key)),
                    None if as_map_key => {
                        return Err(EncodeError::NotStringable {
                            tag: tag.to_owned(),
                            type_name: value.type_name(),
                        })
                    }
                    None => {}
                }
            }
        }
        self.emit_tagged(tag, rep)
    }

    fn tag_key(&mut self, tag: &str) -> String {
        let as_map_key = !self.profile.map_as_array;
        self.cached(format!("{TAG}{tag}"), as_map_key)
    }

    fn wrap_tagged(&self, key: String, inner: PackValue) -> PackValue {
        if self.profile.map_as_array {
            PackValue::Array(vec![PackValue::Str(key), inner])
        } else {
            PackValue::Object(vec![(key, inner)])
        }
    }

    fn emit_tagged(&mut self, tag: &str, rep: &Value) -> Result<PackValue, EncodeError> {
        let key = self.tag_key(tag);
        let inner = self.marshal(rep, false)?;
        Ok(self.wrap_tagged(key, inner))
    }

    fn emit_array(&mut self, items: &[Value]) -> Result<PackValue, EncodeError> {
        items
            .iter()
            .map(|item| self.marshal(item, false))
            .collect::<Result<Vec<_>, _>>()
            .map(PackValue::Array)
    }

    fn marshal_key(&mut self, key: &Value) -> Result<String, EncodeError> {
        match self.marshal(key, true)? {
            PackValue::Str(s) => Ok(s),
            _ => Err(EncodeError::InvalidMapKey {
                tag: self.handler_for(key).tag(key).into_owned(),
                type_name: key.type_name(),
            }),
        }
    }

    fn emit_map(&mut self, map: &IndexMap<Value, Value>) -> Result<PackValue, EncodeError> {
        let stringable = map
            .keys()
            .all(|k| is_scalar_tag(&self.handler_for(k).tag(k)));
        if !stringable {
            return self.emit_cmap(map);
        }

        if self.profile.map_as_array {
            let mut out = Vec::with_capacity(1 + 2 * map.len());
            out.push(PackValue::Str(MAP_AS_ARRAY.to_owned()));
            for (k, v) in map {
                out.push(PackValue::Str(self.marshal_key(k)?));
                out.push(self.marshal(v, false)?);
            }
            Ok(PackValue::Array(out))
        } else {
            let mut pairs = Vec::with_capacity(map.len());
            for (k, v) in map {
                let key = self.marshal_key(k)?;
                pairs.push((key, self.marshal(v, false)?));
            }
            Ok(PackValue::Object(pairs))
        }
    }

    /// Map with at least one composite key: `{"~#cmap": [k1, v1, k2, v2, ...]}`.
    fn emit_cmap(&mut self, map: &IndexMap<Value, Value>) -> Result<PackValue, EncodeError> {
        let key = self.tag_key("cmap");
        let mut flat = Vec::with_capacity(2 * map.len());
        for (k, v) in map {
            flat.push(self.marshal(k, false)?);
            flat.push(self.marshal(v, false)?);
        }
        Ok(self.wrap_tagged(key, PackValue::Array(flat)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::FnWriteHandler;
    use serde_json::json;
    use std::borrow::Cow;

    fn json_of(encoder: &Encoder, value: &Value) -> serde_json::Value {
        serde_json::Value::from(encoder.encode(value).unwrap())
    }

    #[test]
    fn top_level_scalars_are_quoted_in_json() {
        let enc = Encoder::new(Transport::Json);
        assert_eq!(json_of(&enc, &Value::from(1)), json!({"~#'": 1}));
        assert_eq!(json_of(&enc, &Value::keyword("a")), json!({"~#'": "~:a"}));
        assert_eq!(json_of(&enc, &Value::Null), json!({"~#'": null}));

        let enc = Encoder::new(Transport::MsgPack);
        assert_eq!(json_of(&enc, &Value::keyword("a")), json!("~:a"));
    }

    #[test]
    fn sigil_strings_are_escaped() {
        let enc = Encoder::new(Transport::MsgPack);
        for (raw, wire) in [("~hello", "~~hello"), ("^x", "~^x"), ("`y", "~`y"), ("^ ", "~^ ")] {
            assert_eq!(json_of(&enc, &Value::from(raw)), json!(wire));
        }
        assert_eq!(json_of(&enc, &Value::from("plain")), json!("plain"));
    }

    #[test]
    fn map_vs_cmap() {
        let enc = Encoder::new(Transport::JsonVerbose);
        let scalar_keys = Value::map([(Value::from(1), "a".into()), ("k".into(), "b".into())]);
        assert_eq!(json_of(&enc, &scalar_keys), json!({"~i1": "a", "k": "b"}));

        let composite = Value::map([(Value::from(vec![Value::from(1), Value::from(1)]), "x".into())]);
        assert_eq!(json_of(&enc, &composite), json!({"~#cmap": [[1, 1], "x"]}));
    }

    #[test]
    fn scalar_map_keys_use_string_forms() {
        let enc = Encoder::new(Transport::JsonVerbose);
        let v = Value::map([
            (Value::Null, 1.into()),
            (Value::Bool(true), 2.into()),
            (Value::Float(1.5), 3.into()),
            (Value::Instant(crate::time::from_millis(0).unwrap()), 4.into()),
        ]);
        assert_eq!(
            json_of(&enc, &v),
            json!({"~_": 1, "~?t": 2, "~d1.5": 3, "~t1970-01-01T00:00:00.000Z": 4})
        );
    }

    #[test]
    fn json_integer_boundary() {
        let enc = Encoder::new(Transport::Json);
        let two53 = BigInt::from(1u64 << 53);
        assert_eq!(
            json_of(&enc, &Value::Integer(two53.clone())),
            json!({"~#'": 9007199254740992u64})
        );
        assert_eq!(
            json_of(&enc, &Value::Integer(two53 + 1)),
            json!({"~#'": "~n9007199254740993"})
        );
    }

    #[test]
    fn msgpack_integer_boundary() {
        let enc = Encoder::new(Transport::MsgPack);
        let enc_int = |i: BigInt| enc.encode(&Value::Integer(i)).unwrap();
        assert_eq!(enc_int(BigInt::from(i64::MIN)), PackValue::Integer(i64::MIN));
        assert_eq!(enc_int(BigInt::from(1u64 << 63)), PackValue::UInteger(1u64 << 63));
        assert_eq!(enc_int(BigInt::from(u64::MAX)), PackValue::UInteger(u64::MAX));
        assert_eq!(
            enc_int(BigInt::from(u64::MAX) + 1),
            PackValue::from("~n18446744073709551616")
        );
        assert_eq!(
            enc_int(BigInt::from(i64::MIN) - 1),
            PackValue::from("~n-9223372036854775809")
        );
    }

    #[test]
    fn repeated_keys_and_keywords_are_cached() {
        let enc = Encoder::new(Transport::Json);
        let row = |n: i64| Value::map([(Value::from("name"), n.into())]);
        let v = Value::from(vec![row(1), row(2), Value::keyword("a"), Value::keyword("a")]);
        assert_eq!(
            json_of(&enc, &v),
            json!([{"name": 1}, {"^!": 2}, "~:a", "^\""])
        );

        let verbose = Encoder::new(Transport::JsonVerbose);
        assert_eq!(
            json_of(&verbose, &v),
            json!([{"name": 1}, {"name": 2}, "~:a", "~:a"])
        );
    }

    #[test]
    fn instant_and_uuid_forms_follow_transport() {
        let t = Value::instant_millis(1_000).unwrap();
        assert_eq!(
            json_of(&Encoder::new(Transport::Json), &t),
            json!({"~#'": "~t1970-01-01T00:00:01.000Z"})
        );
        assert_eq!(json_of(&Encoder::new(Transport::MsgPack), &t), json!({"~#t": 1000}));

        let u = Value::Uuid(uuid::Uuid::from_u64_pair(1, 2));
        assert_eq!(json_of(&Encoder::new(Transport::MsgPack), &u), json!({"~#u": [1, 2]}));
    }

    #[test]
    fn array_layout() {
        let profile = TransportProfile::new(Transport::JsonVerbose).with_map_as_array(true);
        let enc = Encoder::with_profile(profile);
        let v = Value::from(vec![
            Value::map([(Value::from("a"), 1.into())]),
            Value::set([Value::from(1)]),
        ]);
        assert_eq!(json_of(&enc, &v), json!([["^ ", "a", 1], ["~#set", [1]]]));
    }

    #[derive(Debug, PartialEq, Eq, Hash)]
    struct Opaque;
    impl Extension for Opaque {}

    struct OneCharNoString;
    impl WriteHandler for OneCharNoString {
        fn tag<'a>(&'a self, _value: &'a Value) -> Cow<'a, str> {
            Cow::Borrowed("x")
        }
        fn rep<'a>(&self, _value: &'a Value) -> Cow<'a, Value> {
            Cow::Owned(Value::from(vec![Value::from(1)]))
        }
    }

    #[test]
    fn configuration_errors() {
        let enc = Encoder::new(Transport::Json);
        let err = enc.encode(&Value::ext(Opaque)).unwrap_err();
        assert!(matches!(err, EncodeError::MissingTag { .. }));

        let mut enc = Encoder::new(Transport::MsgPack);
        enc.register_extension::<Opaque>(OneCharNoString);
        let key = Value::map([(Value::ext(Opaque), Value::Null)]);
        assert!(matches!(
            enc.encode(&key).unwrap_err(),
            EncodeError::NotStringable { .. }
        ));
        // outside key position the tagged form is used instead
        assert_eq!(
            json_of(&enc, &Value::ext(Opaque)),
            json!({"~#x": [1]})
        );
    }

    #[test]
    fn extension_keys_with_long_tags_force_cmap() {
        let mut enc = Encoder::new(Transport::JsonVerbose);
        enc.register_extension::<Opaque>(FnWriteHandler::new("opaque", |_: &Value| Value::Null));
        let v = Value::map([(Value::ext(Opaque), 1.into())]);
        assert_eq!(json_of(&enc, &v), json!({"~#cmap": [{"~#opaque": null}, 1]}));
    }
}
