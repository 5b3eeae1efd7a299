//! The [`Injectable`] contract and type keys.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::dependency::Slot;

/// Identity of a concrete type in the instance pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeKey {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The type name without its module path.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Upcast of a shared instance to `Any`, used to recover the concrete type.
pub trait IntoAnyArc: Any + Send + Sync {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> IntoAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A type that lives exactly once in the instance pool and may declare
/// dependency slots.
///
/// Managers and systems alike implement this. Slots are [`Dependency`]
/// fields listed by [`Injectable::dependencies`]; the container binds each of
/// them to the single pooled instance of the slot's type.
///
/// ```rust
/// use engine_inject::{Dependency, Injectable, Slot};
///
/// #[derive(Default)]
/// struct Clock;
/// impl Injectable for Clock {}
///
/// #[derive(Default)]
/// struct Scheduler {
///     clock: Dependency<Clock>,
/// }
///
/// impl Injectable for Scheduler {
///     fn dependencies(&self) -> Vec<&dyn Slot> {
///         vec![&self.clock]
///     }
/// }
/// ```
///
/// [`Dependency`]: crate::Dependency
pub trait Injectable: IntoAnyArc {
    /// Declared dependency slots, in declaration order.
    fn dependencies(&self) -> Vec<&dyn Slot> {
        Vec::new()
    }

    /// The pool key of the concrete type.
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Self>()
    }
}

/// A pooled, shared instance.
pub type Instance = Arc<dyn Injectable>;

/// Recover the concrete type of a pooled instance.
#[must_use]
pub fn downcast_instance<T: Injectable>(instance: &Instance) -> Option<Arc<T>> {
    Arc::clone(instance).into_any_arc().downcast::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod nested {
        #[derive(Default)]
        pub struct Widget;
        impl crate::Injectable for Widget {}
    }

    #[test]
    fn test_type_key_of_instance_is_concrete_type() {
        let instance: Instance = Arc::new(nested::Widget);
        assert_eq!(instance.type_key(), TypeKey::of::<nested::Widget>());
        assert_eq!(instance.type_key().short_name(), "Widget");
    }

    #[test]
    fn test_downcast_instance() {
        let instance: Instance = Arc::new(nested::Widget);
        assert!(downcast_instance::<nested::Widget>(&instance).is_some());
    }

    #[test]
    fn test_short_name_strips_generics() {
        let key = TypeKey::of::<Vec<String>>();
        assert_eq!(key.short_name(), "Vec");
    }
}
