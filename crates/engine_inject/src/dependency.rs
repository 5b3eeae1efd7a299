//! Dependency slots.
//!
//! A [`Dependency<T>`] is an empty cell until the container binds it. It
//! holds a weak reference: the instance pool owns every instance, so two
//! managers referring to each other do not keep each other alive once the
//! container is gone.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::error::InjectError;
use crate::injectable::{Injectable, Instance, TypeKey, downcast_instance};

/// Object-safe view of a dependency slot.
pub trait Slot: Send + Sync {
    /// The type this slot must be bound to.
    fn required(&self) -> TypeKey;

    /// Bind the slot to a pooled instance.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::TypeMismatch`] if `instance` is not of the
    /// required type and [`InjectError::AlreadyBound`] if the slot already
    /// holds a different instance.
    fn bind(&self, instance: &Instance) -> Result<(), InjectError>;

    fn is_bound(&self) -> bool;
}

/// A declared dependency on the single instance of `T`.
pub struct Dependency<T> {
    cell: OnceLock<Weak<T>>,
}

impl<T> Dependency<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }
}

impl<T: Injectable> Dependency<T> {
    /// Returns the bound instance.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Unbound`] before injection and
    /// [`InjectError::Released`] once the owning container is dropped.
    pub fn get(&self) -> Result<Arc<T>, InjectError> {
        let required = std::any::type_name::<T>();
        self.cell
            .get()
            .ok_or(InjectError::Unbound { required })?
            .upgrade()
            .ok_or(InjectError::Released { required })
    }

    /// Bind the slot directly to a typed instance.
    ///
    /// Binding the same instance twice is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::AlreadyBound`] if a different instance is bound.
    pub fn set(&self, instance: &Arc<T>) -> Result<(), InjectError> {
        let weak = Arc::downgrade(instance);
        match self.cell.set(weak) {
            Ok(()) => Ok(()),
            Err(weak) => match self.cell.get() {
                Some(existing) if Weak::ptr_eq(existing, &weak) => Ok(()),
                _ => Err(InjectError::AlreadyBound {
                    required: std::any::type_name::<T>(),
                }),
            },
        }
    }
}

impl<T> Default for Dependency<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Dependency<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("type", &std::any::type_name::<T>())
            .field("bound", &self.cell.get().is_some())
            .finish()
    }
}

impl<T: Injectable> Slot for Dependency<T> {
    fn required(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn bind(&self, instance: &Instance) -> Result<(), InjectError> {
        let typed = downcast_instance::<T>(instance).ok_or_else(|| InjectError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            actual: instance.type_key().name,
        })?;
        self.set(&typed)
    }

    fn is_bound(&self) -> bool {
        self.cell.get().is_some()
    }
}
