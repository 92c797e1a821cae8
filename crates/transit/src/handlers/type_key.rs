//! Keys of the write-handler table.

use std::any::TypeId;

/// Runtime type of a [`Value`](crate::Value) as seen by the write registry.
///
/// Built-in kinds have one variant each. Application types are keyed by
/// their `TypeId`; `TypeKey::of::<dyn Trait>()` keys a trait-object marker
/// that extensions can list among their supertypes. `Any` is the top type
/// every lookup ends at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Null,
    Bool,
    String,
    Integer,
    Float,
    Decimal,
    Keyword,
    Symbol,
    Char,
    Instant,
    Uuid,
    Uri,
    Bytes,
    Array,
    List,
    Set,
    Map,
    TypedArray,
    Ratio,
    Link,
    Tagged,
    Extension(TypeId),
    Any,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey::Extension(TypeId::of::<T>())
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, TypeKey::Extension(_) | TypeKey::Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Marker {}

    #[test]
    fn application_keys_are_distinct() {
        assert_eq!(TypeKey::of::<u8>(), TypeKey::of::<u8>());
        assert_ne!(TypeKey::of::<u8>(), TypeKey::of::<dyn Marker>());
        assert!(!TypeKey::of::<u8>().is_builtin());
        assert!(TypeKey::Set.is_builtin());
        assert!(!TypeKey::Any.is_builtin());
    }
}
