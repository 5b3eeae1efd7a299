use engine_component::ComponentKind;
use engine_inject::{Dependency, Injectable, Slot};
use engine_math::{Transform, Vec2};
use engine_system::{RuntimeError, System};
use engine_world::ComponentStore;
use tracing::trace;

use crate::components::Velocity;

/// Moves every owned transform by its entity's velocity.
#[derive(Default)]
pub struct MotionSystem {
    store: Dependency<ComponentStore>,
}

impl Injectable for MotionSystem {
    fn dependencies(&self) -> Vec<&dyn Slot> {
        vec![&self.store]
    }
}

impl System for MotionSystem {
    fn update(&self, dt: f64) -> Result<(), RuntimeError> {
        let store = self.store.get()?;
        let dt = dt as f32;
        for velocity in store.components_of_kind(ComponentKind::of::<Velocity>()) {
            let owner = velocity.owner();
            if !owner.is_valid() {
                continue;
            }
            let Some(transform) = store.try_get::<Transform>(owner) else {
                trace!(entity = %owner, "velocity without transform");
                continue;
            };
            let offset: Vec2 = velocity.read::<Velocity, _>(|v| v.velocity * dt)?;
            transform.write::<Transform, _>(|t| t.position += offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use engine_system::{Orchestrator, RuntimeConfig};
    use engine_world::EntityRegistry;

    use super::*;

    #[tokio::test]
    async fn test_moves_owned_transforms_only() {
        let mut runtime = Orchestrator::builder()
            .config(RuntimeConfig::new("no-prototypes"))
            .component::<Transform>()
            .component::<Velocity>()
            .system::<MotionSystem>()
            .build();
        runtime.start().await.unwrap();

        let store = runtime.resolve::<ComponentStore>().unwrap();
        let entities = runtime.resolve::<EntityRegistry>().unwrap();

        let mover = entities.create_empty("mover");
        let transform = store.create::<Transform>().unwrap();
        let velocity = store.create::<Velocity>().unwrap();
        velocity
            .write::<Velocity, _>(|v| v.velocity = Vec2::new(2.0, -4.0))
            .unwrap();
        entities.attach_component(mover.id(), transform.clone()).unwrap();
        entities.attach_component(mover.id(), velocity).unwrap();

        // Unowned velocity and a velocity whose entity has no transform.
        let stray = store.create::<Velocity>().unwrap();
        stray.write::<Velocity, _>(|v| v.velocity = Vec2::ONE).unwrap();
        let ghost = entities.create_empty("ghost");
        entities
            .attach_component(ghost.id(), store.create::<Velocity>().unwrap())
            .unwrap();

        runtime.update_all(0.5).unwrap();
        runtime.update_all(0.5).unwrap();

        let moved = transform.get::<Transform>().unwrap();
        assert_eq!(moved.position, Vec2::new(2.0, -4.0));
        assert_eq!(store.len(), 4);
    }
}
