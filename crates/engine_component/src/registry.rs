//! Kind registry: maps component kind names to constructors.
//!
//! The registry is populated once by the composition root before startup and
//! is read-only afterwards. Registration order is kept so listings are stable.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::component::{Component, ComponentKind, ComponentMeta};
use crate::error::ComponentError;

/// Registry of every component kind the runtime can create or decode.
#[derive(Debug, Default, Clone)]
pub struct KindRegistry {
    /// Constructor tables keyed by kind.
    metas: HashMap<ComponentKind, ComponentMeta>,
    /// Declared names to kinds.
    names: HashMap<&'static str, ComponentKind>,
    /// Kinds in registration order.
    order: Vec<ComponentKind>,
}

impl KindRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the component type `T`. Registering the same type twice is a
    /// no-op.
    pub fn register<T: Component>(&mut self) -> ComponentKind {
        self.register_meta(T::meta())
    }

    /// Register a kind from its constructor table. The first table
    /// registered for a kind is kept.
    pub fn register_meta(&mut self, meta: ComponentMeta) -> ComponentKind {
        let kind = meta.kind;
        if let Entry::Vacant(slot) = self.metas.entry(kind) {
            slot.insert(meta);
            self.names.insert(meta.name, kind);
            self.order.push(kind);
        }
        kind
    }

    /// Resolve a declared kind name.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::KindNotFound`] if no kind has that name.
    pub fn get_kind_by_name(&self, name: &str) -> Result<ComponentKind, ComponentError> {
        self.try_get_kind_by_name(name)
            .ok_or_else(|| ComponentError::KindNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve a declared kind name, returning `None` if it is unknown.
    #[must_use]
    pub fn try_get_kind_by_name(&self, name: &str) -> Option<ComponentKind> {
        self.names.get(name).copied()
    }

    /// Returns the constructor table of a kind.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::UnknownKind`] if the kind was never registered.
    pub fn meta(&self, kind: ComponentKind) -> Result<&ComponentMeta, ComponentError> {
        self.metas.get(&kind).ok_or(ComponentError::UnknownKind(kind))
    }

    /// Returns `true` if the kind is registered.
    #[must_use]
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.metas.contains_key(&kind)
    }

    /// Returns the declared name of a kind, if registered.
    #[must_use]
    pub fn name_of(&self, kind: ComponentKind) -> Option<&'static str> {
        self.metas.get(&kind).map(|meta| meta.name)
    }

    /// Iterate registered kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentMeta> {
        self.order.iter().filter_map(|kind| self.metas.get(kind))
    }

    /// Returns the number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
