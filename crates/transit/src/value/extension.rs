//! Open extension slot of the value model.
//!
//! Application types that transit knows nothing about ride inside
//! [`Value::Ext`](super::Value::Ext). A write handler for them is registered
//! under [`TypeKey::of::<T>()`](crate::TypeKey::of); on the way back a read
//! handler for the chosen tag rebuilds the extension value.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::handlers::TypeKey;

/// Object-safe equality and hashing for extension values.
///
/// Implemented automatically for every `'static` type that is
/// `PartialEq + Hash`; there is no reason to implement it by hand.
pub trait DynExtension {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn Any) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn dyn_type_name(&self) -> &'static str;
}

impl<T: Any + PartialEq + Hash> DynExtension for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn dyn_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A user-defined value type carried by the engine.
///
/// ```
/// use transit::{Extension, TypeKey};
///
/// trait Shape {}
///
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// struct Square(u32);
///
/// impl Shape for Square {}
/// impl Extension for Square {
///     fn supertypes(&self) -> Vec<TypeKey> {
///         vec![TypeKey::of::<dyn Shape>()]
///     }
/// }
/// ```
pub trait Extension: DynExtension + fmt::Debug + Send + Sync + 'static {
    /// Type keys consulted, most specific first, when no write handler is
    /// registered for the concrete type.
    fn supertypes(&self) -> Vec<TypeKey> {
        Vec::new()
    }
}

/// Shared handle to an extension value.
#[derive(Clone)]
pub struct ExtValue(Arc<dyn Extension>);

impl ExtValue {
    pub fn new<T: Extension>(value: T) -> Self {
        ExtValue(Arc::new(value))
    }

    pub fn downcast_ref<T: Extension>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Extension>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Key of the concrete type.
    pub fn type_key(&self) -> TypeKey {
        TypeKey::Extension(self.0.as_any().type_id())
    }

    pub fn supertypes(&self) -> Vec<TypeKey> {
        self.0.supertypes()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.dyn_type_name()
    }
}

impl fmt::Debug for ExtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for ExtValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.dyn_eq(other.0.as_any())
    }
}

impl Eq for ExtValue {}

impl Hash for ExtValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    #[derive(Debug, PartialEq, Eq, Hash)]
    struct Meters(u32);
    impl Extension for Meters {}

    #[derive(Debug, PartialEq, Eq, Hash)]
    struct Feet(u32);
    impl Extension for Feet {}

    fn hash_of(v: &ExtValue) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn equality_is_by_type_and_value() {
        assert_eq!(ExtValue::new(Meters(3)), ExtValue::new(Meters(3)));
        assert_ne!(ExtValue::new(Meters(3)), ExtValue::new(Meters(4)));
        assert_ne!(ExtValue::new(Meters(3)), ExtValue::new(Feet(3)));
        assert_eq!(
            hash_of(&ExtValue::new(Meters(3))),
            hash_of(&ExtValue::new(Meters(3)))
        );
    }

    #[test]
    fn downcast_and_keys() {
        let v = ExtValue::new(Feet(10));
        assert_eq!(v.downcast_ref::<Feet>(), Some(&Feet(10)));
        assert!(v.downcast_ref::<Meters>().is_none());
        assert_eq!(v.type_key(), TypeKey::of::<Feet>());
        assert!(v.type_name().ends_with("Feet"));
    }
}
