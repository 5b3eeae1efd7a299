use engine_inject::{Dependency, Injectable, Slot};
use engine_system::{Priority, RuntimeError, System};
use engine_world::EntityRegistry;
use tracing::info;

/// Prototype ids to instantiate at startup, in order.
#[derive(Debug, Clone, Default)]
pub struct SpawnList(pub Vec<String>);

impl Injectable for SpawnList {}

/// Creates the startup entities. Runs last so every other system has
/// subscribed before the first component is cloned.
#[derive(Default)]
pub struct SpawnSystem {
    entities: Dependency<EntityRegistry>,
    spawn: Dependency<SpawnList>,
}

impl Injectable for SpawnSystem {
    fn dependencies(&self) -> Vec<&dyn Slot> {
        vec![&self.entities, &self.spawn]
    }
}

impl System for SpawnSystem {
    fn priority(&self) -> Option<Priority> {
        Some(Priority::Low)
    }

    fn init(&self) -> Result<(), RuntimeError> {
        let entities = self.entities.get()?;
        for prototype in &self.spawn.get()?.0 {
            let entity = entities.create_entity(prototype)?;
            info!(
                entity = %entity.id(),
                name = entity.name(),
                prototype = %prototype,
                components = entity.component_count(),
                "entity spawned"
            );
        }
        Ok(())
    }
}
