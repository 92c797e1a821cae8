//! Write handlers and the type → handler registry.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::type_key::TypeKey;
use super::write_defaults;
use crate::transport::ScalarForm;
use crate::value::{Extension, Value};

/// How to write values of one runtime type.
///
/// A one-character tag marks a scalar representation that can appear
/// inside a string (`~t...`); longer tags are written as a tagged
/// structure (`{"~#tag": rep}`).
pub trait WriteHandler: Send + Sync {
    /// Wire tag. May depend on the value; an empty tag is a configuration
    /// error reported by the encoder.
    fn tag<'a>(&'a self, value: &'a Value) -> Cow<'a, str>;

    /// The value to encode in place of `value`.
    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value>;

    /// String form, used when the value is a map key or the transport
    /// prefers strings. `None` when the type has no string form.
    fn string_rep(&self, value: &Value) -> Option<String> {
        match self.rep(value) {
            Cow::Borrowed(Value::String(s)) => Some(s.clone()),
            Cow::Owned(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Handler used instead of this one when writing for human readers,
    /// e.g. an instant as an ISO string rather than milliseconds.
    fn verbose_handler(&self) -> Option<&dyn WriteHandler> {
        None
    }
}

/// Write handler built from a fixed tag and a representation function.
pub struct FnWriteHandler<F> {
    tag: Cow<'static, str>,
    rep: F,
}

impl<F> FnWriteHandler<F>
where
    F: Fn(&Value) -> Value + Send + Sync,
{
    pub fn new(tag: impl Into<Cow<'static, str>>, rep: F) -> Self {
        FnWriteHandler {
            tag: tag.into(),
            rep,
        }
    }
}

impl<F> WriteHandler for FnWriteHandler<F>
where
    F: Fn(&Value) -> Value + Send + Sync,
{
    fn tag<'a>(&'a self, _value: &'a Value) -> Cow<'a, str> {
        Cow::Borrowed(&self.tag)
    }

    fn rep<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        Cow::Owned((self.rep)(value))
    }
}

pub(super) type WriteTable = HashMap<TypeKey, Arc<dyn WriteHandler>>;

static TEXTUAL_DEFAULTS: OnceLock<Arc<WriteTable>> = OnceLock::new();
static STRUCTURAL_DEFAULTS: OnceLock<Arc<WriteTable>> = OnceLock::new();

fn defaults(form: ScalarForm) -> Arc<WriteTable> {
    let cell = match form {
        ScalarForm::Textual => &TEXTUAL_DEFAULTS,
        ScalarForm::Structural => &STRUCTURAL_DEFAULTS,
    };
    Arc::clone(cell.get_or_init(|| Arc::new(write_defaults::table(form))))
}

/// Type-keyed write handler registry.
///
/// Starts out sharing a process-wide default table. The first
/// registration copies that table, so customizing one registry never
/// affects another.
#[derive(Clone)]
pub struct WriteHandlers {
    table: Arc<WriteTable>,
}

impl WriteHandlers {
    pub fn new(form: ScalarForm) -> Self {
        WriteHandlers {
            table: defaults(form),
        }
    }

    /// Register (or replace) the handler for `key`.
    pub fn register(&mut self, key: TypeKey, handler: impl WriteHandler + 'static) -> &mut Self {
        tracing::debug!(?key, "registering write handler");
        Arc::make_mut(&mut self.table).insert(key, Arc::new(handler));
        self
    }

    /// Register the handler for extension type `T`.
    pub fn register_extension<T: Extension>(
        &mut self,
        handler: impl WriteHandler + 'static,
    ) -> &mut Self {
        self.register(TypeKey::of::<T>(), handler)
    }

    pub fn get(&self, key: &TypeKey) -> Option<&dyn WriteHandler> {
        self.table.get(key).map(|h| h.as_ref())
    }

    /// Handler for `value`: its exact type, then (for extensions) its
    /// declared supertypes in order, then the top type.
    pub fn resolve(&self, value: &Value) -> &dyn WriteHandler {
        if let Some(h) = self.get(&value.type_key()) {
            return h;
        }
        if let Value::Ext(ext) = value {
            for key in ext.supertypes() {
                if let Some(h) = self.get(&key) {
                    return h;
                }
            }
        }
        match self.get(&TypeKey::Any) {
            Some(h) => h,
            None => &write_defaults::UnknownType,
        }
    }

    /// Whether this registry still uses the shared default table.
    pub fn is_default(&self) -> bool {
        [&TEXTUAL_DEFAULTS, &STRUCTURAL_DEFAULTS]
            .iter()
            .any(|cell| cell.get().is_some_and(|d| Arc::ptr_eq(d, &self.table)))
    }
}

impl Default for WriteHandlers {
    fn default() -> Self {
        WriteHandlers::new(ScalarForm::Textual)
    }
}

impl std::fmt::Debug for WriteHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self.table.keys().map(|k| format!("{k:?}")).collect();
        keys.sort();
        f.debug_struct("WriteHandlers").field("types", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Hash)]
    struct Celsius(i64);
    impl Extension for Celsius {}

    trait Temperature {}

    #[derive(Debug, PartialEq, Eq, Hash)]
    struct Kelvin(i64);
    impl Extension for Kelvin {
        fn supertypes(&self) -> Vec<TypeKey> {
            vec![TypeKey::of::<dyn Temperature>()]
        }
    }

    #[test]
    fn builtins_resolve_by_variant() {
        let handlers = WriteHandlers::default();
        assert_eq!(handlers.resolve(&Value::from("x")).tag(&Value::from("x")), "s");
        let kw = Value::keyword("k");
        assert_eq!(handlers.resolve(&kw).tag(&kw), ":");
        let set = Value::set([]);
        assert_eq!(handlers.resolve(&set).tag(&set), "set");
    }

    #[test]
    fn unregistered_extension_falls_back_to_empty_tag() {
        let handlers = WriteHandlers::default();
        let v = Value::ext(Celsius(20));
        assert_eq!(handlers.resolve(&v).tag(&v), "");
    }

    #[test]
    fn supertypes_are_consulted_before_top_type() {
        let mut handlers = WriteHandlers::default();
        handlers.register(
            TypeKey::of::<dyn Temperature>(),
            FnWriteHandler::new("temp", |_: &Value| Value::Null),
        );
        let v = Value::ext(Kelvin(300));
        assert_eq!(handlers.resolve(&v).tag(&v), "temp");
    }

    #[test]
    fn registration_copies_on_write() {
        let shared = WriteHandlers::default();
        let mut custom = shared.clone();
        assert!(custom.is_default());
        custom.register_extension::<Celsius>(FnWriteHandler::new("c!", |_: &Value| Value::Null));
        assert!(!custom.is_default());
        assert!(shared.is_default());
        assert!(shared.get(&TypeKey::of::<Celsius>()).is_none());
        assert!(custom.get(&TypeKey::of::<Celsius>()).is_some());
    }
}
