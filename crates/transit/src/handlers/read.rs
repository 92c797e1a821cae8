//! Read handlers and the tag → handler registry.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::read_defaults;
use crate::error::RepError;
use crate::value::{TaggedValue, Value};

/// Turns a decoded representation back into a value.
///
/// Any `Fn(Value) -> Result<Value, RepError>` closure is a read handler.
pub trait ReadHandler: Send + Sync {
    fn from_rep(&self, rep: Value) -> Result<Value, RepError>;
}

impl<F> ReadHandler for F
where
    F: Fn(Value) -> Result<Value, RepError> + Send + Sync,
{
    fn from_rep(&self, rep: Value) -> Result<Value, RepError> {
        self(rep)
    }
}

/// Fallback for tags without a registered handler.
pub trait DefaultReadHandler: Send + Sync {
    fn from_rep(&self, tag: &str, rep: Value) -> Result<Value, RepError>;
}

impl<F> DefaultReadHandler for F
where
    F: Fn(&str, Value) -> Result<Value, RepError> + Send + Sync,
{
    fn from_rep(&self, tag: &str, rep: Value) -> Result<Value, RepError> {
        self(tag, rep)
    }
}

/// Keeps unknown tags as [`Value::Tagged`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepTagged;

impl DefaultReadHandler for KeepTagged {
    fn from_rep(&self, tag: &str, rep: Value) -> Result<Value, RepError> {
        Ok(Value::Tagged(TaggedValue::new(tag, rep)))
    }
}

pub(super) type ReadTable = HashMap<String, Arc<dyn ReadHandler>>;

static DEFAULTS: OnceLock<Arc<ReadTable>> = OnceLock::new();

/// Tag-keyed read handler registry. Copy-on-write over a shared default
/// table, like [`WriteHandlers`](super::WriteHandlers).
#[derive(Clone)]
pub struct ReadHandlers {
    table: Arc<ReadTable>,
    default: Arc<dyn DefaultReadHandler>,
}

impl ReadHandlers {
    pub fn new() -> Self {
        ReadHandlers {
            table: Arc::clone(DEFAULTS.get_or_init(|| Arc::new(read_defaults::table()))),
            default: Arc::new(KeepTagged),
        }
    }

    /// Register (or replace) the handler for `tag`.
    pub fn register(&mut self, tag: impl Into<String>, handler: impl ReadHandler + 'static) -> &mut Self {
        let tag = tag.into();
        tracing::debug!(%tag, "registering read handler");
        Arc::make_mut(&mut self.table).insert(tag, Arc::new(handler));
        self
    }

    /// Replace the fallback used for unknown tags.
    pub fn set_default(&mut self, handler: impl DefaultReadHandler + 'static) -> &mut Self {
        self.default = Arc::new(handler);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&dyn ReadHandler> {
        self.table.get(tag).map(|h| h.as_ref())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.table.contains_key(tag)
    }

    /// Apply the handler for `tag`, or the fallback when there is none.
    pub fn read(&self, tag: &str, rep: Value) -> Result<Value, RepError> {
        match self.get(tag) {
            Some(handler) => handler.from_rep(rep),
            None => {
                tracing::debug!(%tag, "no read handler, using default");
                self.default.from_rep(tag, rep)
            }
        }
    }

    pub fn is_default(&self) -> bool {
        DEFAULTS.get().is_some_and(|d| Arc::ptr_eq(d, &self.table))
    }
}

impl Default for ReadHandlers {
    fn default() -> Self {
        ReadHandlers::new()
    }
}

impl std::fmt::Debug for ReadHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.table.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("ReadHandlers").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tags_become_tagged_values() {
        let handlers = ReadHandlers::new();
        let v = handlers.read("Xcustom", Value::from(1)).unwrap();
        assert_eq!(v, Value::tagged("Xcustom", Value::from(1)));
    }

    #[test]
    fn closures_register_as_handlers() {
        let mut handlers = ReadHandlers::new();
        handlers.register("upper", |rep: Value| match rep {
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            other => Err(RepError::expected("string", other)),
        });
        assert_eq!(handlers.read("upper", "abc".into()).unwrap(), Value::from("ABC"));
        assert!(handlers.read("upper", Value::Null).is_err());
        assert!(!handlers.is_default());
        assert!(ReadHandlers::new().is_default());
        assert!(!ReadHandlers::new().contains("upper"));
    }

    #[test]
    fn default_handler_is_replaceable() {
        let mut handlers = ReadHandlers::new();
        handlers.set_default(|tag: &str, _rep: Value| Ok::<_, RepError>(Value::symbol(tag)));
        assert_eq!(handlers.read("zzz", Value::Null).unwrap(), Value::symbol("zzz"));
        // registered tags are unaffected
        assert_eq!(handlers.read(":", "k".into()).unwrap(), Value::keyword("k"));
    }
}
