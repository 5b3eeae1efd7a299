//! # engine_world
//!
//! The managers that hold the ECS world.
//!
//! This crate provides:
//!
//! - [`ComponentStore`]: owns every component, assigns ids, creates and clones.
//! - [`EntityRegistry`]: owns every entity, assembles entities from prototypes.
//! - [`PrototypeRegistry`]: loads JSON templates from a directory tree.
//! - [`EventBus`]: (component kind, event type) subscriptions and dispatch.
//! - [`TypeRegistry`]: component kinds, enum types and prototype shapes.
//!
//! The managers refer to each other through dependency slots and are wired
//! by an [`engine_inject::Container`]; [`core_registrations`] lists them.

pub mod config;
pub mod entity;
pub mod error;
pub mod event;
mod lock;
pub mod prototype;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

use engine_inject::Registration;

pub use config::RuntimeConfig;
pub use entity::{Entity, EntityRef, EntityRegistry};
pub use error::{PrototypeError, WorldError};
pub use event::{
    AllSystemsInitialized, ComponentCloned, ComponentCreated, EntityCreated, Event, EventBus,
    EventRef, Subscription,
};
pub use prototype::{EntityPrototype, LoadFailure, LoadReport, PrototypeRegistry};
pub use store::{ComponentRef, ComponentStore};
pub use types::{PrototypeShape, ShapeMeta, TypeRegistry};

/// Registrations of the four core managers.
///
/// The [`TypeRegistry`] and [`RuntimeConfig`] they depend on are not
/// constructible and must be provided to the container.
#[must_use]
pub fn core_registrations() -> Vec<Registration> {
    vec![
        Registration::eager::<ComponentStore>(),
        Registration::eager::<EntityRegistry>(),
        Registration::eager::<EventBus>(),
        Registration::eager::<PrototypeRegistry>(),
    ]
}
