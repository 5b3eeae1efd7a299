//! The component store.
//!
//! Sole owner of every component instance. Components are created directly
//! from a registered kind, or cloned from an existing component or from a
//! prototype template. Each creation is announced on the [`EventBus`].
//!
//! Instances are shared through [`ComponentRef`] handles. Identity (id and
//! owning entity) lives in the handle; the component value sits behind a
//! lock inside it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use engine_component::{
    Component, ComponentId, ComponentKind, EntityId, ErasedComponent, IdSequence,
};
use engine_inject::{Dependency, Injectable, Slot};
use tracing::debug;

use crate::entity::EntityRegistry;
use crate::error::WorldError;
use crate::event::{ComponentCloned, ComponentCreated, EventBus};
use crate::lock;
use crate::types::TypeRegistry;

struct ComponentCell {
    id: ComponentId,
    kind: ComponentKind,
    type_name: &'static str,
    /// Raw [`EntityId`]; 0 while unowned.
    owner: AtomicU64,
    data: RwLock<Box<dyn ErasedComponent>>,
}

/// Shared handle to one stored component.
///
/// Cloning the handle aliases the same component; use
/// [`ComponentStore::clone_component`] for an independent copy.
#[derive(Clone)]
pub struct ComponentRef(Arc<ComponentCell>);

impl ComponentRef {
    fn new(id: ComponentId, data: Box<dyn ErasedComponent>) -> Self {
        Self(Arc::new(ComponentCell {
            id,
            kind: data.erased_kind(),
            type_name: data.erased_type_name(),
            owner: AtomicU64::new(EntityId::INVALID.id()),
            data: RwLock::new(data),
        }))
    }

    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.0.id
    }

    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.0.kind
    }

    /// The declared kind name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.type_name
    }

    /// The owning entity, or [`EntityId::INVALID`] if unattached.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        EntityId(self.0.owner.load(Ordering::Acquire))
    }

    pub fn set_owner(&self, owner: EntityId) {
        self.0.owner.store(owner.id(), Ordering::Release);
    }

    /// Returns `true` if the component is a `C`.
    #[must_use]
    pub fn is<C: Component>(&self) -> bool {
        self.0.kind == C::kind()
    }

    /// Returns `true` if both handles refer to the same component.
    #[must_use]
    pub fn ptr_eq(&self, other: &ComponentRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Run `f` with shared access to the value.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::KindMismatch`] if the component is not a `C`.
    pub fn read<C: Component, R>(&self, f: impl FnOnce(&C) -> R) -> Result<R, WorldError> {
        let data = lock::read(&self.0.data);
        let value = data.downcast_ref::<C>().ok_or_else(|| self.mismatch::<C>())?;
        Ok(f(value))
    }

    /// Run `f` with exclusive access to the value.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::KindMismatch`] if the component is not a `C`.
    pub fn write<C: Component, R>(&self, f: impl FnOnce(&mut C) -> R) -> Result<R, WorldError> {
        let mut data = lock::write(&self.0.data);
        let value = data.downcast_mut::<C>().ok_or_else(|| self.mismatch::<C>())?;
        Ok(f(value))
    }

    /// A copy of the current value.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::KindMismatch`] if the component is not a `C`.
    pub fn get<C: Component>(&self) -> Result<C, WorldError> {
        self.read(C::clone)
    }

    /// Field-for-field copy of the value into fresh storage.
    #[must_use]
    pub fn duplicate_value(&self) -> Box<dyn ErasedComponent> {
        lock::read(&self.0.data).duplicate()
    }

    fn mismatch<C: Component>(&self) -> WorldError {
        WorldError::KindMismatch {
            component: self.0.id,
            expected: C::type_name(),
            actual: self.0.type_name,
        }
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("id", &self.0.id)
            .field("kind", &self.0.type_name)
            .field("owner", &self.owner())
            .finish()
    }
}

/// Owner of all component instances.
pub struct ComponentStore {
    types: Dependency<TypeRegistry>,
    events: Dependency<EventBus>,
    entities: Dependency<EntityRegistry>,
    ids: IdSequence,
    components: RwLock<Vec<ComponentRef>>,
}

impl Default for ComponentStore {
    fn default() -> Self {
        Self {
            types: Dependency::new(),
            events: Dependency::new(),
            entities: Dependency::new(),
            ids: IdSequence::components(),
            components: RwLock::new(Vec::new()),
        }
    }
}

impl Injectable for ComponentStore {
    fn dependencies(&self) -> Vec<&dyn Slot> {
        vec![&self.types, &self.events, &self.entities]
    }
}

impl ComponentStore {
    /// Create a zero-initialised component of a registered kind.
    ///
    /// Raises [`ComponentCreated`].
    ///
    /// # Errors
    ///
    /// Returns `UnknownKind` if the kind is not registered, or the first
    /// error of an event callback.
    pub fn create_component(&self, kind: ComponentKind) -> Result<ComponentRef, WorldError> {
        let value = self.types.get()?.kinds().meta(kind)?.create();
        let component = self.insert(value);
        self.raise_created(&component)?;
        Ok(component)
    }

    /// Create a zero-initialised component from its declared kind name.
    ///
    /// # Errors
    ///
    /// Returns `KindNotFound` if no kind has that name.
    pub fn create_component_by_name(&self, name: &str) -> Result<ComponentRef, WorldError> {
        let kind = self.get_kind_by_name(name)?;
        self.create_component(kind)
    }

    /// Create a zero-initialised `C`. The kind must be registered.
    ///
    /// # Errors
    ///
    /// See [`ComponentStore::create_component`].
    pub fn create<C: Component>(&self) -> Result<ComponentRef, WorldError> {
        self.create_component(C::kind())
    }

    /// Copy `source` into a new component with a fresh id. The owner is
    /// copied along with the data.
    ///
    /// Raises [`ComponentCreated`] and then [`ComponentCloned`].
    ///
    /// # Errors
    ///
    /// Returns the first error of an event callback.
    pub fn clone_component(&self, source: &ComponentRef) -> Result<ComponentRef, WorldError> {
        let component = self.insert(source.duplicate_value());
        component.set_owner(source.owner());
        self.raise_created(&component)?;
        self.events.get()?.raise(&ComponentCloned {
            component: component.clone(),
            original: Some(source.clone()),
        })?;
        Ok(component)
    }

    /// Copy a prototype template into a new component.
    ///
    /// Templates are not stored components, so the raised
    /// [`ComponentCloned`] carries no original.
    ///
    /// # Errors
    ///
    /// Returns the first error of an event callback.
    pub fn clone_template(&self, template: &dyn ErasedComponent) -> Result<ComponentRef, WorldError> {
        let component = self.insert(template.duplicate());
        self.raise_created(&component)?;
        self.events.get()?.raise(&ComponentCloned {
            component: component.clone(),
            original: None,
        })?;
        Ok(component)
    }

    /// Resolve a declared kind name.
    ///
    /// # Errors
    ///
    /// Returns `KindNotFound` if no kind has that name.
    pub fn get_kind_by_name(&self, name: &str) -> Result<ComponentKind, WorldError> {
        Ok(self.types.get()?.kinds().get_kind_by_name(name)?)
    }

    /// Resolve a declared kind name, returning `None` if it is unknown or
    /// the registry is not injected yet.
    #[must_use]
    pub fn try_get_kind_by_name(&self, name: &str) -> Option<ComponentKind> {
        self.types.get().ok()?.kinds().try_get_kind_by_name(name)
    }

    /// Returns `true` if the entity exists and owns a component of `kind`.
    #[must_use]
    pub fn has_component(&self, entity: EntityId, kind: ComponentKind) -> bool {
        self.try_get_component(entity, kind).is_some()
    }

    #[must_use]
    pub fn has<C: Component>(&self, entity: EntityId) -> bool {
        self.has_component(entity, C::kind())
    }

    /// The first component of `kind` in the entity's set.
    #[must_use]
    pub fn try_get_component(&self, entity: EntityId, kind: ComponentKind) -> Option<ComponentRef> {
        self.entities
            .get()
            .ok()?
            .get_entity_by_id(entity)?
            .component_of_kind(kind)
    }

    #[must_use]
    pub fn try_get<C: Component>(&self, entity: EntityId) -> Option<ComponentRef> {
        self.try_get_component(entity, C::kind())
    }

    /// Look up a component by id.
    #[must_use]
    pub fn get_component(&self, id: ComponentId) -> Option<ComponentRef> {
        let components = lock::read(&self.components);
        // Ids are handed out in insertion order, so the list is sorted.
        components
            .binary_search_by_key(&id, ComponentRef::id)
            .ok()
            .map(|index| components[index].clone())
    }

    /// Every live component of `kind`, in creation order.
    #[must_use]
    pub fn components_of_kind(&self, kind: ComponentKind) -> Vec<ComponentRef> {
        lock::read(&self.components)
            .iter()
            .filter(|component| component.kind() == kind)
            .cloned()
            .collect()
    }

    /// Every live component, in creation order.
    #[must_use]
    pub fn components(&self) -> Vec<ComponentRef> {
        lock::read(&self.components).clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock::read(&self.components).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, value: Box<dyn ErasedComponent>) -> ComponentRef {
        let mut components = lock::write(&self.components);
        let component = ComponentRef::new(self.ids.next_component(), value);
        components.push(component.clone());
        debug!(id = %component.id(), kind = component.type_name(), "component created");
        component
    }

    fn raise_created(&self, component: &ComponentRef) -> Result<(), WorldError> {
        self.events.get()?.raise(&ComponentCreated {
            component: component.clone(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::testing::{Position, Velocity, world};

    #[tokio::test]
    async fn test_ids_are_sequential_from_zero() {
        let world = world().await;
        let store = world.store();

        let first = store.create_component_by_name("Position").unwrap();
        let second = store.create_component_by_name("Position").unwrap();
        first.write(|p: &mut Position| {
            p.x = 3.0;
            p.y = 4.0;
        })
        .unwrap();
        let copy = store.clone_component(&first).unwrap();

        assert_eq!(first.id(), ComponentId(0));
        assert_eq!(second.id(), ComponentId(1));
        assert_eq!(copy.id(), ComponentId(2));
        assert_eq!(copy.get::<Position>().unwrap(), first.get::<Position>().unwrap());
    }

    #[tokio::test]
    async fn test_ids_strictly_increase() {
        let world = world().await;
        let store = world.store();
        let ids: Vec<_> = (0..20)
            .map(|i| {
                if i % 3 == 0 {
                    store.create::<Velocity>().unwrap().id()
                } else {
                    store.create::<Position>().unwrap().id()
                }
            })
            .collect();
        assert!(ids.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[tokio::test]
    async fn test_clone_is_independent_storage() {
        let world = world().await;
        let store = world.store();

        let original = store.create::<Position>().unwrap();
        original
            .write(|p: &mut Position| p.path = vec![1.0, 2.0])
            .unwrap();
        let copy = store.clone_component(&original).unwrap();
        copy.write(|p: &mut Position| {
            p.x = 9.0;
            p.path.push(3.0);
        })
        .unwrap();

        assert!(!copy.ptr_eq(&original));
        let original = original.get::<Position>().unwrap();
        assert_eq!(original.x, 0.0);
        assert_eq!(original.path, vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_clone_copies_owner() {
        let world = world().await;
        let store = world.store();
        let entity = world.entities().create_empty("Holder");
        let original = store.create::<Position>().unwrap();
        entity.attach(original.clone()).unwrap();

        let copy = store.clone_component(&original).unwrap();
        assert_eq!(copy.owner(), entity.id());
        assert_ne!(copy.id(), original.id());

        let template = store.clone_template(&Position::default()).unwrap();
        assert_eq!(template.owner(), EntityId::INVALID);
    }

    #[tokio::test]
    async fn test_unregistered_kind_is_rejected() {
        #[derive(Debug, Clone, Default, Deserialize)]
        struct Unregistered;
        impl Component for Unregistered {
            fn type_name() -> &'static str {
                "Unregistered"
            }
        }

        let world = world().await;
        let err = world.store().create::<Unregistered>().unwrap_err();
        assert!(matches!(
            err,
            WorldError::Component(engine_component::ComponentError::UnknownKind(_))
        ));
        assert!(world.store().is_empty());
    }

    #[tokio::test]
    async fn test_kind_lookups() {
        let world = world().await;
        let store = world.store();
        assert_eq!(store.get_kind_by_name("Position").unwrap(), Position::kind());
        assert!(store.get_kind_by_name("Nope").is_err());
        assert_eq!(store.try_get_kind_by_name("Velocity"), Some(Velocity::kind()));
        assert_eq!(store.try_get_kind_by_name("Nope"), None);
    }

    #[tokio::test]
    async fn test_typed_access_checks_kind() {
        let world = world().await;
        let component = world.store().create::<Velocity>().unwrap();
        assert!(component.is::<Velocity>());
        assert!(matches!(
            component.read(|p: &Position| p.x),
            Err(WorldError::KindMismatch { expected: "Position", actual: "Velocity", .. })
        ));
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_kind() {
        let world = world().await;
        let store = world.store();
        let a = store.create::<Position>().unwrap();
        let b = store.create::<Velocity>().unwrap();
        store.create::<Position>().unwrap();

        assert!(store.get_component(b.id()).unwrap().ptr_eq(&b));
        assert!(store.get_component(ComponentId(99)).is_none());
        let positions = store.components_of_kind(Position::kind());
        assert_eq!(positions.len(), 2);
        assert!(positions[0].ptr_eq(&a));
    }

    #[tokio::test]
    async fn test_entity_queries() {
        let world = world().await;
        let store = world.store();
        let entity = world.entities().create_empty("Scout");
        let position = store.create::<Position>().unwrap();
        entity.attach(position.clone()).unwrap();

        assert!(store.has::<Position>(entity.id()));
        assert!(!store.has::<Velocity>(entity.id()));
        assert!(!store.has_component(EntityId(404), Position::kind()));
        assert!(store.try_get::<Position>(entity.id()).unwrap().ptr_eq(&position));
        assert!(store.try_get_component(entity.id(), Velocity::kind()).is_none());
    }
}
