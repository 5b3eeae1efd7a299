//! The container runs the two concurrent startup phases.
//!
//! 1. **Instantiate**: one task per eager registration constructs its
//!    instance into the pool.
//! 2. **Inject**: one task per (instance, slot) pair resolves the slot's
//!    type in the pool, constructing lazily registered types on demand, and
//!    binds it. Instances created during a round are injected in the next
//!    round until no uninjected instance remains.
//!
//! Each phase ends with a join barrier over all of its tasks.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::error::InjectError;
use crate::injectable::{Injectable, Instance, TypeKey};
use crate::pool::{InstancePool, PoolEntry};

/// When a registered type is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// During the instantiate phase.
    Eager,
    /// Only when some slot requires it.
    Lazy,
}

/// A constructible type known to the container.
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub key: TypeKey,
    pub activation: Activation,
    construct_fn: fn() -> Instance,
}

impl Registration {
    #[must_use]
    pub fn eager<T: Injectable + Default>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            activation: Activation::Eager,
            construct_fn: construct_default::<T>,
        }
    }

    #[must_use]
    pub fn lazy<T: Injectable + Default>() -> Self {
        Self {
            activation: Activation::Lazy,
            ..Self::eager::<T>()
        }
    }

    /// Build a fresh instance with the type's no-argument constructor.
    #[must_use]
    pub fn construct(&self) -> Instance {
        (self.construct_fn)()
    }
}

fn construct_default<T: Injectable + Default>() -> Instance {
    Arc::new(T::default())
}

/// Collects registrations and provided instances.
#[derive(Default)]
pub struct ContainerBuilder {
    registrations: Vec<Registration>,
    provided: Vec<Instance>,
}

impl ContainerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` for construction during the instantiate phase.
    #[must_use]
    pub fn register<T: Injectable + Default>(mut self) -> Self {
        self.push(Registration::eager::<T>());
        self
    }

    /// Register `T` for construction only when a slot requires it.
    #[must_use]
    pub fn register_lazy<T: Injectable + Default>(mut self) -> Self {
        self.push(Registration::lazy::<T>());
        self
    }

    /// Hand a pre-built instance to the container.
    #[must_use]
    pub fn provide<T: Injectable>(mut self, instance: Arc<T>) -> Self {
        self.provided.push(instance);
        self
    }

    /// Add a registration. A second registration of the same type is ignored.
    pub fn push(&mut self, registration: Registration) {
        if self
            .registrations
            .iter()
            .all(|existing| existing.key.id != registration.key.id)
        {
            self.registrations.push(registration);
        }
    }

    pub fn provide_instance(&mut self, instance: Instance) {
        self.provided.push(instance);
    }

    #[must_use]
    pub fn build(self) -> Container {
        let pool = Arc::new(InstancePool::new());
        for instance in self.provided {
            pool.insert(instance);
        }

        let offset = pool.len();
        let eager: Vec<(usize, Registration)> = self
            .registrations
            .iter()
            .filter(|r| r.activation == Activation::Eager)
            .enumerate()
            .map(|(index, r)| (offset + index, *r))
            .collect();
        pool.reserve_from(offset + eager.len());

        let registrations = self
            .registrations
            .into_iter()
            .map(|r| (r.key.id, r))
            .collect();

        Container {
            pool,
            registrations: Arc::new(registrations),
            eager,
            injected: HashSet::new(),
        }
    }
}

/// Counters from one injection phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InjectionReport {
    /// Instances whose slots were processed.
    pub instances: usize,
    /// Slots bound.
    pub bindings: usize,
    /// Instances constructed on demand.
    pub lazily_created: usize,
    /// Rounds needed until no uninjected instance remained.
    pub rounds: usize,
}

/// Owner of the instance pool and the registration table.
pub struct Container {
    pool: Arc<InstancePool>,
    registrations: Arc<HashMap<TypeId, Registration>>,
    eager: Vec<(usize, Registration)>,
    injected: HashSet<TypeId>,
}

impl Container {
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<InstancePool> {
        &self.pool
    }

    /// Fetch the single instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::NotInstantiated`] if `T` is not pooled.
    pub fn resolve<T: Injectable>(&self) -> Result<Arc<T>, InjectError> {
        self.pool.resolve::<T>()
    }

    /// Construct every eager registration concurrently. Types already in the
    /// pool are skipped. Returns the number of instances created.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Task`] if a construction task fails to join.
    pub async fn instantiate(&self) -> Result<usize, InjectError> {
        let started = Instant::now();
        let handles: Vec<_> = self
            .eager
            .iter()
            .map(|&(seq, registration)| {
                let pool = Arc::clone(&self.pool);
                tokio::spawn(async move {
                    let (_, created) =
                        pool.get_or_insert_with(registration.key, seq, || registration.construct());
                    if created {
                        debug!(instance = registration.key.short_name(), seq, "instantiated");
                    }
                    created
                })
            })
            .collect();

        let created = try_join_all(handles)
            .await
            .map_err(|e| InjectError::Task(e.to_string()))?
            .into_iter()
            .filter(|created| *created)
            .count();

        info!(
            created,
            pooled = self.pool.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "instantiated injectables"
        );
        Ok(created)
    }

    /// Bind every declared slot of every pooled instance.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::MissingDependency`] when a slot's type can be
    /// neither found nor constructed, or any binding error of a slot.
    pub async fn inject_all(&mut self) -> Result<InjectionReport, InjectError> {
        let started = Instant::now();
        let mut report = InjectionReport::default();

        loop {
            let pending: Vec<PoolEntry> = self
                .pool
                .snapshot()
                .into_iter()
                .filter(|entry| !self.injected.contains(&entry.key.id))
                .collect();
            if pending.is_empty() {
                break;
            }
            report.rounds += 1;

            let mut handles = Vec::new();
            for entry in &pending {
                let slot_count = entry.instance.dependencies().len();
                for index in 0..slot_count {
                    let instance = Arc::clone(&entry.instance);
                    let pool = Arc::clone(&self.pool);
                    let registrations = Arc::clone(&self.registrations);
                    handles.push(tokio::spawn(async move {
                        inject_slot(&instance, index, &pool, &registrations)
                    }));
                }
            }

            let outcomes = try_join_all(handles)
                .await
                .map_err(|e| InjectError::Task(e.to_string()))?;
            for outcome in outcomes {
                if outcome? {
                    report.lazily_created += 1;
                }
                report.bindings += 1;
            }

            for entry in pending {
                self.injected.insert(entry.key.id);
                report.instances += 1;
            }
        }

        info!(
            instances = report.instances,
            bindings = report.bindings,
            lazily_created = report.lazily_created,
            rounds = report.rounds,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "injected dependencies"
        );
        Ok(report)
    }
}

/// Resolve and bind slot `index` of `instance`. Returns `true` if the target
/// had to be constructed on demand.
fn inject_slot(
    instance: &Instance,
    index: usize,
    pool: &InstancePool,
    registrations: &HashMap<TypeId, Registration>,
) -> Result<bool, InjectError> {
    let dependent = instance.type_key();
    let slots = instance.dependencies();
    let Some(slot) = slots.get(index) else {
        return Ok(false);
    };
    let required = slot.required();

    let (target, created) = match pool.get(required.id) {
        Some(found) => (found, false),
        None => {
            let registration =
                registrations
                    .get(&required.id)
                    .ok_or(InjectError::MissingDependency {
                        dependent: dependent.name,
                        required: required.name,
                    })?;
            let seq = pool.reserve_seq();
            let (target, created) =
                pool.get_or_insert_with(required, seq, || registration.construct());
            if created {
                debug!(
                    instance = required.short_name(),
                    requested_by = dependent.short_name(),
                    "lazily instantiated"
                );
            }
            (target, created)
        }
    };

    slot.bind(&target)?;
    debug!(
        dependency = required.short_name(),
        into = dependent.short_name(),
        "injected dependency"
    );
    Ok(created)
}
