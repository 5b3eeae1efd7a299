//! Fixtures shared by the unit tests of this crate.

use std::path::Path;
use std::sync::Arc;

use engine_component::{Component, RegisteredEnum, enum_token};
use engine_inject::{Container, Injectable};
use serde::Deserialize;

use crate::{
    ComponentStore, EntityRegistry, EventBus, PrototypeRegistry, RuntimeConfig, TypeRegistry,
    core_registrations,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub path: Vec<f32>,
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Background,
    Foreground,
}

impl RegisteredEnum for Layer {
    fn enum_name() -> &'static str {
        "Layer"
    }

    fn members() -> &'static [(&'static str, Self)] {
        &[("Background", Layer::Background), ("Foreground", Layer::Foreground)]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Sprite {
    pub path: String,
    #[serde(deserialize_with = "enum_token::deserialize")]
    pub layer: Layer,
}

impl Component for Sprite {
    fn type_name() -> &'static str {
        "Sprite"
    }
}

/// The four managers, injected and ready. Owns the container that keeps
/// them alive.
pub struct TestWorld {
    container: Container,
}

impl TestWorld {
    fn get<T: Injectable>(&self) -> Arc<T> {
        self.container.resolve::<T>().unwrap()
    }

    pub fn store(&self) -> Arc<ComponentStore> {
        self.get()
    }

    pub fn entities(&self) -> Arc<EntityRegistry> {
        self.get()
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.get()
    }

    pub fn prototypes(&self) -> Arc<PrototypeRegistry> {
        self.get()
    }
}

pub async fn world() -> TestWorld {
    world_with(Path::new("prototypes"), |_| {}).await
}

pub async fn world_in(root: &Path) -> TestWorld {
    world_with(root, |_| {}).await
}

pub async fn world_with(root: &Path, configure: impl FnOnce(&mut TypeRegistry)) -> TestWorld {
    let mut types = TypeRegistry::new();
    types
        .register_component::<Position>()
        .register_component::<Velocity>()
        .register_component::<Sprite>()
        .register_enum::<Layer>();
    configure(&mut types);

    let mut builder = Container::builder()
        .provide(Arc::new(types))
        .provide(Arc::new(RuntimeConfig::new(root)));
    for registration in core_registrations() {
        builder.push(registration);
    }
    let mut container = builder.build();
    container.instantiate().await.unwrap();
    container.inject_all().await.unwrap();
    TestWorld { container }
}
