//! The startup and frame orchestrator.
//!
//! Drives the runtime through its phases:
//!
//! ```text
//! Unstarted -> Instantiating -> Injecting -> PrototypesLoaded -> Initialized -> Running
//! ```
//!
//! Instantiation and injection run concurrently on tokio tasks (see
//! [`engine_inject::Container`]). Everything after that is sequential:
//! prototypes load once, each system's `init` runs once in priority order,
//! and every frame calls `update` on each system in the same order.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use engine_component::{Component, RegisteredEnum};
use engine_inject::{
    Container, ContainerBuilder, Injectable, Instance, Registration, TypeKey, downcast_instance,
};
use engine_world::{
    AllSystemsInitialized, EventBus, LoadReport, PrototypeRegistry, PrototypeShape, RuntimeConfig,
    TypeRegistry, core_registrations,
};
use tracing::{debug, info};

use crate::error::RuntimeError;
use crate::system::{Priority, System};

/// Lifecycle phase of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unstarted,
    Instantiating,
    Injecting,
    PrototypesLoaded,
    Initialized,
    Running,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Unstarted => "unstarted",
            Phase::Instantiating => "instantiating",
            Phase::Injecting => "injecting",
            Phase::PrototypesLoaded => "prototypes loaded",
            Phase::Initialized => "initialized",
            Phase::Running => "running",
        };
        f.write_str(name)
    }
}

/// A registered system type and how to view its pooled instance as a
/// [`System`].
#[derive(Clone, Copy)]
struct SystemSlot {
    key: TypeKey,
    as_system: fn(&Instance) -> Option<Arc<dyn System>>,
}

fn as_system<S: System>(instance: &Instance) -> Option<Arc<dyn System>> {
    downcast_instance::<S>(instance).map(|system| system as Arc<dyn System>)
}

/// Collects component kinds, enum types, prototype shapes, managers and
/// systems for an [`Orchestrator`].
pub struct OrchestratorBuilder {
    types: TypeRegistry,
    config: RuntimeConfig,
    container: ContainerBuilder,
    systems: Vec<SystemSlot>,
}

impl OrchestratorBuilder {
    fn new() -> Self {
        let mut container = ContainerBuilder::new();
        for registration in core_registrations() {
            container.push(registration);
        }
        Self {
            types: TypeRegistry::new(),
            config: RuntimeConfig::default(),
            container,
            systems: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Make component kind `C` creatable and nameable in prototypes.
    #[must_use]
    pub fn component<C: Component>(mut self) -> Self {
        self.types.register_component::<C>();
        self
    }

    /// Make enum `E` usable as an `enum.<Enum>.<Member>` token.
    #[must_use]
    pub fn enumeration<E: RegisteredEnum>(mut self) -> Self {
        self.types.register_enum::<E>();
        self
    }

    /// Accept prototype files whose `"Type"` is `P`'s shape name.
    #[must_use]
    pub fn prototype_shape<P: PrototypeShape>(mut self) -> Self {
        self.types.register_shape::<P>();
        self
    }

    /// Register a system. Registration order is the tie-break within a
    /// priority tier. Registering the same type twice is a no-op.
    #[must_use]
    pub fn system<S: System + Default>(mut self) -> Self {
        let key = TypeKey::of::<S>();
        if self.systems.iter().all(|slot| slot.key != key) {
            self.container.push(Registration::eager::<S>());
            self.systems.push(SystemSlot {
                key,
                as_system: as_system::<S>,
            });
        }
        self
    }

    /// Register a manager constructed during instantiation.
    #[must_use]
    pub fn manager<M: Injectable + Default>(mut self) -> Self {
        self.container.push(Registration::eager::<M>());
        self
    }

    /// Register a manager constructed only if some slot requires it.
    #[must_use]
    pub fn lazy<M: Injectable + Default>(mut self) -> Self {
        self.container.push(Registration::lazy::<M>());
        self
    }

    /// Hand a pre-built collaborator to the container.
    #[must_use]
    pub fn provide<T: Injectable>(mut self, instance: Arc<T>) -> Self {
        self.container.provide_instance(instance);
        self
    }

    #[must_use]
    pub fn build(self) -> Orchestrator {
        let container = self
            .container
            .provide(Arc::new(self.types))
            .provide(Arc::new(self.config))
            .build();
        Orchestrator {
            container,
            phase: Phase::Unstarted,
            pending: self.systems,
            systems: Vec::new(),
            frame: 0,
        }
    }
}

/// Owns the object graph and runs startup and the frame sequence.
pub struct Orchestrator {
    container: Container,
    phase: Phase,
    pending: Vec<SystemSlot>,
    /// Systems in execution order, filled during startup.
    systems: Vec<Arc<dyn System>>,
    frame: u64,
}

impl Orchestrator {
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of completed `update_all` calls.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// System names in execution order. Empty before startup.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    /// Fetch the single instance of any injectable.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Inject`] if `T` was never instantiated.
    pub fn resolve<T: Injectable>(&self) -> Result<Arc<T>, RuntimeError> {
        Ok(self.container.resolve::<T>()?)
    }

    /// Bring the runtime from `Unstarted` to `Initialized`.
    ///
    /// Returns the prototype load report.
    ///
    /// # Errors
    ///
    /// Fails on a missing dependency, a failing `init`, or when called twice.
    /// Prototype files that fail to load are reported, not returned as
    /// errors.
    pub async fn start(&mut self) -> Result<LoadReport, RuntimeError> {
        if self.phase != Phase::Unstarted {
            return Err(RuntimeError::InvalidPhase {
                operation: "start",
                actual: self.phase,
            });
        }
        let started = Instant::now();

        self.phase = Phase::Instantiating;
        self.container.instantiate().await?;

        self.phase = Phase::Injecting;
        self.container.inject_all().await?;

        let report = self.resolve::<PrototypeRegistry>()?.load_prototypes()?;
        self.phase = Phase::PrototypesLoaded;

        self.systems = self.ordered_systems()?;
        for system in &self.systems {
            system.init().map_err(|source| RuntimeError::System {
                system: system.name(),
                hook: "init",
                source: Box::new(source),
            })?;
            debug!(
                system = system.name(),
                priority = %system.priority().map_or_else(|| "none".to_string(), |p| p.to_string()),
                "system initialized"
            );
        }
        self.phase = Phase::Initialized;
        self.resolve::<EventBus>()?.raise(&AllSystemsInitialized)?;

        info!(
            systems = self.systems.len(),
            prototypes = report.loaded,
            prototype_failures = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "runtime initialized"
        );
        Ok(report)
    }

    /// Call `update(dt)` on every system, in initialisation order.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::InvalidPhase`] before [`Orchestrator::start`]
    /// has completed, or the first failing system's error.
    pub fn update_all(&mut self, dt: f64) -> Result<(), RuntimeError> {
        if !matches!(self.phase, Phase::Initialized | Phase::Running) {
            return Err(RuntimeError::InvalidPhase {
                operation: "update",
                actual: self.phase,
            });
        }
        self.phase = Phase::Running;

        for system in &self.systems {
            system.update(dt).map_err(|source| RuntimeError::System {
                system: system.name(),
                hook: "update",
                source: Box::new(source),
            })?;
        }
        self.frame += 1;
        Ok(())
    }

    /// Registered systems sorted by tier, undeclared last, ties in
    /// registration order.
    fn ordered_systems(&self) -> Result<Vec<Arc<dyn System>>, RuntimeError> {
        let mut systems = self
            .pending
            .iter()
            .map(|slot| {
                self.container
                    .pool()
                    .get(slot.key.id)
                    .as_ref()
                    .and_then(slot.as_system)
                    .ok_or(RuntimeError::Inject(
                        engine_inject::InjectError::NotInstantiated {
                            required: slot.key.name,
                        },
                    ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        systems.sort_by_key(|system| sort_key(system.priority()));
        Ok(systems)
    }
}

fn sort_key(priority: Option<Priority>) -> (bool, Option<Priority>) {
    (priority.is_none(), priority)
}
