//! Entities and the entity registry.
//!
//! An entity is an id, a display name and an ordered set of component
//! handles. Entities are assembled from [`EntityPrototype`]s by cloning each
//! component template into the [`ComponentStore`].

use std::fmt;
use std::sync::{Arc, RwLock};

use engine_component::{Component, ComponentKind, EntityId, IdSequence};
use engine_inject::{Dependency, Injectable, Slot};
use tracing::debug;

use crate::error::WorldError;
use crate::event::{EntityCreated, EventBus};
use crate::lock;
use crate::prototype::{EntityPrototype, PrototypeRegistry};
use crate::store::{ComponentRef, ComponentStore};

/// An entity and the components it owns.
pub struct Entity {
    id: EntityId,
    name: String,
    components: RwLock<Vec<ComponentRef>>,
}

/// Shared handle to a registered entity.
pub type EntityRef = Arc<Entity>;

impl Entity {
    fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            components: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a component to the set and make this entity its owner.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateComponent`] if the component is already
    /// in the set.
    pub fn attach(&self, component: ComponentRef) -> Result<(), WorldError> {
        let mut components = lock::write(&self.components);
        if components.iter().any(|c| c.ptr_eq(&component)) {
            return Err(WorldError::DuplicateComponent {
                entity: self.id,
                component: component.id(),
            });
        }
        component.set_owner(self.id);
        components.push(component);
        Ok(())
    }

    /// The owned components in attachment order.
    #[must_use]
    pub fn components(&self) -> Vec<ComponentRef> {
        lock::read(&self.components).clone()
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        lock::read(&self.components).len()
    }

    /// The first owned component of `kind`.
    #[must_use]
    pub fn component_of_kind(&self, kind: ComponentKind) -> Option<ComponentRef> {
        lock::read(&self.components)
            .iter()
            .find(|c| c.kind() == kind)
            .cloned()
    }

    #[must_use]
    pub fn component<C: Component>(&self) -> Option<ComponentRef> {
        self.component_of_kind(C::kind())
    }

    #[must_use]
    pub fn has<C: Component>(&self) -> bool {
        self.component::<C>().is_some()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("components", &*lock::read(&self.components))
            .finish()
    }
}

/// Owner of every entity and of the entity id sequence.
pub struct EntityRegistry {
    store: Dependency<ComponentStore>,
    prototypes: Dependency<PrototypeRegistry>,
    events: Dependency<EventBus>,
    ids: IdSequence,
    entities: RwLock<Vec<EntityRef>>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self {
            store: Dependency::new(),
            prototypes: Dependency::new(),
            events: Dependency::new(),
            ids: IdSequence::entities(),
            entities: RwLock::new(Vec::new()),
        }
    }
}

impl Injectable for EntityRegistry {
    fn dependencies(&self) -> Vec<&dyn Slot> {
        vec![&self.store, &self.prototypes, &self.events]
    }
}

impl EntityRegistry {
    /// Build an entity from an [`EntityPrototype`].
    ///
    /// Every component template is cloned into the store and attached in
    /// declaration order. Raises [`EntityCreated`] once assembled.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PrototypeNotFound`] if no entity prototype has
    /// that id, or the first error of an event callback.
    pub fn create_entity(&self, prototype_id: &str) -> Result<EntityRef, WorldError> {
        let prototype = self
            .prototypes
            .get()?
            .get_prototype::<EntityPrototype>(prototype_id)?;
        let store = self.store.get()?;

        let entity = Arc::new(Entity::new(self.ids.next_entity(), prototype.display_name()));
        for template in &prototype.components {
            let component = store.clone_template(template.as_ref())?;
            entity.attach(component)?;
        }

        lock::write(&self.entities).push(Arc::clone(&entity));
        debug!(
            entity = %entity.id(),
            prototype = prototype_id,
            components = entity.component_count(),
            "entity created"
        );

        self.events.get()?.raise(&EntityCreated { entity: entity.id() })?;
        Ok(entity)
    }

    /// Register an entity with no components.
    pub fn create_empty(&self, name: impl Into<String>) -> EntityRef {
        let entity = Arc::new(Entity::new(self.ids.next_entity(), name));
        lock::write(&self.entities).push(Arc::clone(&entity));
        entity
    }

    /// Attach a component to a registered entity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`] if no entity has that id, or
    /// [`WorldError::DuplicateComponent`] if it already owns the component.
    pub fn attach_component(&self, entity: EntityId, component: ComponentRef) -> Result<(), WorldError> {
        self.get_entity_by_id(entity)
            .ok_or(WorldError::EntityNotFound(entity))?
            .attach(component)
    }

    /// Remove an entity from the registry.
    ///
    /// Its components stay in the store; their owner id still names the
    /// removed entity.
    pub fn remove_entity(&self, entity: EntityId) -> Option<EntityRef> {
        let mut entities = lock::write(&self.entities);
        let index = entities.iter().position(|e| e.id() == entity)?;
        let removed = entities.remove(index);
        debug!(entity = %entity, "entity removed");
        Some(removed)
    }

    #[must_use]
    pub fn get_entity_by_id(&self, entity: EntityId) -> Option<EntityRef> {
        lock::read(&self.entities)
            .iter()
            .find(|e| e.id() == entity)
            .cloned()
    }

    /// Every registered entity in creation order.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityRef> {
        lock::read(&self.entities).clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock::read(&self.entities).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use super::*;
    use crate::event::ComponentCloned;
    use crate::testing::{Position, Velocity, world, world_in};

    fn prototypes_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("box.json"),
            r#"{"Type":"EntityPrototype","Id":"p1","Name":"Box","Components":[{"Type":"Position","x":1,"y":2}]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("mover.json"),
            r#"{"Type":"EntityPrototype","Id":"mover","Components":[
                {"Type":"Position","x":5,"path":[1,2]},
                {"Type":"Velocity","dx":0.5}
            ]}"#,
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_create_entity_from_prototype() {
        let dir = prototypes_dir();
        let world = world_in(dir.path()).await;
        world.prototypes().load_prototypes().unwrap();

        let entity = world.entities().create_entity("p1").unwrap();
        assert_eq!(entity.name(), "Box");
        let components = entity.components();
        assert_eq!(components.len(), 1);
        let position = components[0].get::<Position>().unwrap();
        assert_eq!((position.x, position.y), (1.0, 2.0));
        assert_eq!(components[0].owner(), entity.id());
    }

    #[tokio::test]
    async fn test_components_are_fresh_clones_in_declaration_order() {
        let dir = prototypes_dir();
        let world = world_in(dir.path()).await;
        world.prototypes().load_prototypes().unwrap();
        let entities = world.entities();

        let first = entities.create_entity("mover").unwrap();
        let second = entities.create_entity("mover").unwrap();
        assert!(second.id() > first.id());
        assert_eq!(first.name(), crate::prototype::DEFAULT_ENTITY_NAME);

        let kinds: Vec<_> = first.components().iter().map(ComponentRef::type_name).collect();
        assert_eq!(kinds, vec!["Position", "Velocity"]);

        let a = first.component::<Position>().unwrap();
        let b = second.component::<Position>().unwrap();
        assert_ne!(a.id(), b.id());
        a.write(|p: &mut Position| p.path.push(3.0)).unwrap();
        assert_eq!(b.get::<Position>().unwrap().path, vec![1.0, 2.0]);
        assert_eq!(b.owner(), second.id());
    }

    #[tokio::test]
    async fn test_unknown_prototype() {
        let world = world().await;
        assert!(matches!(
            world.entities().create_entity("ghost"),
            Err(WorldError::PrototypeNotFound { ref id, shape: "EntityPrototype" }) if id == "ghost"
        ));
        assert!(world.entities().is_empty());
    }

    #[tokio::test]
    async fn test_creation_events_fire_for_templates() {
        let dir = prototypes_dir();
        let world = world_in(dir.path()).await;
        world.prototypes().load_prototypes().unwrap();

        let cloned = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&cloned);
        world
            .events()
            .subscribe::<Velocity, ComponentCloned, _>(move |component, event| {
                if event.component.ptr_eq(component) {
                    sink.lock().unwrap().push(event.original.is_none());
                }
                Ok(())
            });

        world.entities().create_entity("mover").unwrap();
        assert_eq!(*cloned.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_removal_does_not_reclaim_components() {
        let dir = prototypes_dir();
        let world = world_in(dir.path()).await;
        world.prototypes().load_prototypes().unwrap();

        let entity = world.entities().create_entity("mover").unwrap();
        let before = world.store().len();
        let removed = world.entities().remove_entity(entity.id()).unwrap();

        assert_eq!(removed.id(), entity.id());
        assert!(world.entities().get_entity_by_id(entity.id()).is_none());
        assert!(world.entities().remove_entity(entity.id()).is_none());
        assert_eq!(world.store().len(), before);
        let orphan = world.store().components()[0].clone();
        assert_eq!(orphan.owner(), entity.id());
        assert!(!world.store().has::<Position>(entity.id()));
    }

    #[tokio::test]
    async fn test_attach_rejects_duplicates() {
        let world = world().await;
        let entity = world.entities().create_empty("Probe");
        let position = world.store().create::<Position>().unwrap();

        world
            .entities()
            .attach_component(entity.id(), position.clone())
            .unwrap();
        assert!(matches!(
            entity.attach(position.clone()),
            Err(WorldError::DuplicateComponent { .. })
        ));
        assert!(matches!(
            world.entities().attach_component(EntityId(999), position),
            Err(WorldError::EntityNotFound(EntityId(999)))
        ));
        assert_eq!(entity.component_count(), 1);
        assert!(entity.has::<Position>());
        assert!(!entity.has::<Velocity>());
    }

    #[tokio::test]
    async fn test_entity_ids_start_at_one() {
        let world = world().await;
        let first = world.entities().create_empty("a");
        let second = world.entities().create_empty("b");
        assert_eq!(first.id(), EntityId(1));
        assert_eq!(second.id(), EntityId(2));
        assert_eq!(world.entities().get_entity_by_id(EntityId(2)).unwrap().name(), "b");
        assert!(world.entities().get_entity_by_id(EntityId(3)).is_none());
    }
}
