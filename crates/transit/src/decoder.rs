//! Decoder: turns a [`PackValue`] node tree back into a [`Value`].

use indexmap::IndexMap;
use transit_pack::PackValue;

use crate::cache::RollingCache;
use crate::error::DecodeError;
use crate::handlers::{DefaultReadHandler, ReadHandler, ReadHandlers};
use crate::value::Value;
use crate::{ESC, MAP_AS_ARRAY, RES, SUB, TAG};

#[derive(Debug, Clone, Default)]
pub struct Decoder {
    handlers: ReadHandlers,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handlers(handlers: ReadHandlers) -> Self {
        Decoder { handlers }
    }

    pub fn handlers(&self) -> &ReadHandlers {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut ReadHandlers {
        &mut self.handlers
    }

    pub fn register_read(
        &mut self,
        tag: impl Into<String>,
        handler: impl ReadHandler + 'static,
    ) -> &mut Self {
        self.handlers.register(tag, handler);
        self
    }

    pub fn set_default(&mut self, handler: impl DefaultReadHandler + 'static) -> &mut Self {
        self.handlers.set_default(handler);
        self
    }

    /// Decode one top-level value with a fresh cache.
    pub fn decode(&self, node: &PackValue) -> Result<Value, DecodeError> {
        let mut cache = RollingCache::new();
        self.decode_with_cache(node, &mut cache)
    }

    pub fn decode_with_cache(
        &self,
        node: &PackValue,
        cache: &mut RollingCache,
    ) -> Result<Value, DecodeError> {
        Parse {
            handlers: &self.handlers,
            cache,
        }
        .node(node, false)
    }
}

struct Parse<'a> {
    handlers: &'a ReadHandlers,
    cache: &'a mut RollingCache,
}

impl Parse<'_> {
    fn read(&self, tag: &str, rep: Value) -> Result<Value, DecodeError> {
        self.handlers
            .read(tag, rep)
            .map_err(|source| DecodeError::Handler {
                tag: tag.to_owned(),
                source,
            })
    }

    fn node(&mut self, node: &PackValue, as_map_key: bool) -> Result<Value, DecodeError> {
        match node {
            PackValue::Null => Ok(Value::Null),
            PackValue::Bool(b) => Ok(Value::Bool(*b)),
            PackValue::Integer(i) => Ok(Value::from(*i)),
            PackValue::UInteger(u) => Ok(Value::from(*u)),
            PackValue::Float(f) => Ok(Value::Float(*f)),
            PackValue::Str(s) => {
                let s = self.cache.decode(s, as_map_key);
                self.string(s)
            }
            PackValue::Array(items) => self.array(items),
            PackValue::Object(pairs) => self.object(pairs),
        }
    }

    /// A string that has already been through the cache.
    fn string(&self, s: String) -> Result<Value, DecodeError> {
        let mut chars = s.chars();
        if chars.next() != Some(ESC) {
            return Ok(Value::String(s));
        }
        match chars.next() {
            Some(ESC | SUB | RES) => Ok(Value::String(s[ESC.len_utf8()..].to_owned())),
            // tag strings only mean something at the head of a composite
            Some('#') | None => Ok(Value::String(s)),
            Some(tag) => {
                let payload = chars.as_str().to_owned();
                self.read(tag.encode_utf8(&mut [0; 4]), Value::String(payload))
            }
        }
    }

    fn array(&mut self, items: &[PackValue]) -> Result<Value, DecodeError> {
        let Some((PackValue::Str(raw), rest)) = items.split_first() else {
            return items
                .iter()
                .map(|item| self.node(item, false))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array);
        };

        // the head is resolved against the cache exactly once
        let head = self.cache.decode(raw, false);
        if head == MAP_AS_ARRAY {
            return self.map_array(rest);
        }
        if let (Some(tag), [rep]) = (head.strip_prefix(TAG), rest) {
            let rep = self.node(rep, false)?;
            return self.read(tag, rep);
        }

        let mut out = Vec::with_capacity(items.len());
        out.push(self.string(head)?);
        for item in rest {
            out.push(self.node(item, false)?);
        }
        Ok(Value::Array(out))
    }

    fn map_array(&mut self, flat: &[PackValue]) -> Result<Value, DecodeError> {
        if flat.len() % 2 != 0 {
            return Err(DecodeError::OddMapArray(flat.len()));
        }
        let mut map = IndexMap::with_capacity(flat.len() / 2);
        for pair in flat.chunks_exact(2) {
            let key = self.node(&pair[0], true)?;
            let value = self.node(&pair[1], false)?;
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    fn object(&mut self, pairs: &[(String, PackValue)]) -> Result<Value, DecodeError> {
        let mut map = IndexMap::with_capacity(pairs.len());
        for (raw, value) in pairs {
            let key = self.cache.decode(raw, true);
            if pairs.len() == 1 {
                if let Some(tag) = key.strip_prefix(TAG) {
                    let rep = self.node(value, false)?;
                    return self.read(tag, rep);
                }
            }
            let key = self.string(key)?;
            map.insert(key, self.node(value, false)?);
        }
        Ok(Value::Map(map))
    }
}
