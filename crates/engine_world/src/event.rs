//! The event bus.
//!
//! A subscription pairs a component kind with an event type and a callback.
//! Raising an event invokes the callback of every subscription for that
//! event type once per live component of the subscription's kind.
//!
//! Subscriptions are never removed. They do not capture the component set:
//! components are queried from the [`ComponentStore`] when the subscription
//! is visited, so components created after subscribing are still reached.
//!
//! ## Dispatch order
//!
//! Each `raise` works on a snapshot of the subscription list taken when it
//! starts, visiting subscriptions in registration order and, within one
//! subscription, components in creation order. Callbacks may raise further
//! events; a nested raise takes its own snapshot.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use engine_component::{Component, ComponentKind, EntityId};
use engine_inject::{Dependency, Injectable, Slot};
use tracing::{debug, trace};

use crate::error::WorldError;
use crate::lock;
use crate::store::{ComponentRef, ComponentStore};

/// Marker for payloads that can be raised on the bus.
pub trait Event: Any + Send + Sync + fmt::Debug {}

/// A component was created, directly or by cloning.
#[derive(Debug, Clone)]
pub struct ComponentCreated {
    pub component: ComponentRef,
}

impl Event for ComponentCreated {}

/// A component was cloned. Raised after the matching [`ComponentCreated`].
#[derive(Debug, Clone)]
pub struct ComponentCloned {
    pub component: ComponentRef,
    /// The stored source component; `None` when cloned from a prototype
    /// template.
    pub original: Option<ComponentRef>,
}

impl Event for ComponentCloned {}

/// An entity was assembled from a prototype.
#[derive(Debug, Clone, Copy)]
pub struct EntityCreated {
    pub entity: EntityId,
}

impl Event for EntityCreated {}

/// Every system's `init` has returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllSystemsInitialized;

impl Event for AllSystemsInitialized {}

/// Type-erased view of a raised event.
#[derive(Clone, Copy)]
pub struct EventRef<'a> {
    name: &'static str,
    value: &'a dyn Any,
}

impl<'a> EventRef<'a> {
    pub fn of<E: Event>(event: &'a E) -> Self {
        Self {
            name: std::any::type_name::<E>(),
            value: event,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn downcast<E: Event>(&self) -> Option<&'a E> {
        self.value.downcast_ref::<E>()
    }
}

type Callback = Arc<dyn Fn(&ComponentRef, EventRef<'_>) -> Result<(), WorldError> + Send + Sync>;

fn checked_callback<F>(callback: F) -> Callback
where
    F: Fn(&ComponentRef, EventRef<'_>) -> Result<(), WorldError> + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// One (component kind, event type, callback) record.
#[derive(Clone)]
pub struct Subscription {
    component_kind: ComponentKind,
    event_type: TypeId,
    event_name: &'static str,
    callback: Callback,
}

impl Subscription {
    #[must_use]
    pub fn component_kind(&self) -> ComponentKind {
        self.component_kind
    }

    #[must_use]
    pub fn event_name(&self) -> &'static str {
        self.event_name
    }

    /// Returns `true` if this subscription listens for `E`.
    #[must_use]
    pub fn listens_for<E: Event>(&self) -> bool {
        self.event_type == TypeId::of::<E>()
    }

    /// Invoke the callback.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::WrongKindInvocation`] if the component or event
    /// is not of the subscribed kind, otherwise the callback's own result.
    pub fn invoke(&self, component: &ComponentRef, event: EventRef<'_>) -> Result<(), WorldError> {
        (self.callback)(component, event)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("component_kind", &self.component_kind)
            .field("event", &self.event_name)
            .finish_non_exhaustive()
    }
}

/// Records subscriptions and dispatches events to live components.
#[derive(Default)]
pub struct EventBus {
    store: Dependency<ComponentStore>,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl Injectable for EventBus {
    fn dependencies(&self) -> Vec<&dyn Slot> {
        vec![&self.store]
    }
}

impl EventBus {
    /// Subscribe to `E` raised for components of type `C`.
    pub fn subscribe<C, E, F>(&self, callback: F)
    where
        C: Component,
        E: Event,
        F: Fn(&ComponentRef, &E) -> Result<(), WorldError> + Send + Sync + 'static,
    {
        self.subscribe_with(C::kind(), C::type_name().to_string(), callback);
    }

    /// Subscribe to `E` raised for components of `kind`.
    pub fn subscribe_kind<E, F>(&self, kind: ComponentKind, callback: F)
    where
        E: Event,
        F: Fn(&ComponentRef, &E) -> Result<(), WorldError> + Send + Sync + 'static,
    {
        self.subscribe_with(kind, kind.to_string(), callback);
    }

    fn subscribe_with<E, F>(&self, kind: ComponentKind, kind_label: String, callback: F)
    where
        E: Event,
        F: Fn(&ComponentRef, &E) -> Result<(), WorldError> + Send + Sync + 'static,
    {
        let checked = checked_callback(move |component, event| {
            if component.kind() != kind {
                return Err(WorldError::WrongKindInvocation {
                    expected: kind_label.clone(),
                    actual: component.type_name().to_string(),
                });
            }
            let typed = event
                .downcast::<E>()
                .ok_or_else(|| WorldError::WrongKindInvocation {
                    expected: std::any::type_name::<E>().to_string(),
                    actual: event.name().to_string(),
                })?;
            callback(component, typed)
        });

        let subscription = Subscription {
            component_kind: kind,
            event_type: TypeId::of::<E>(),
            event_name: std::any::type_name::<E>(),
            callback: checked,
        };
        debug!(kind = %kind, event = subscription.event_name, "subscribed");
        lock::write(&self.subscriptions).push(subscription);
    }

    /// Dispatch `event` and return the number of callback invocations.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first callback error.
    pub fn raise<E: Event>(&self, event: &E) -> Result<usize, WorldError> {
        let matching: Vec<Subscription> = lock::read(&self.subscriptions)
            .iter()
            .filter(|subscription| subscription.listens_for::<E>())
            .cloned()
            .collect();
        if matching.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        let store = self.store.get()?;
        let event_ref = EventRef::of(event);
        let mut invoked = 0;
        for subscription in &matching {
            for component in store.components_of_kind(subscription.component_kind) {
                subscription.invoke(&component, event_ref)?;
                invoked += 1;
            }
        }

        trace!(
            event = event_ref.name(),
            subscriptions = matching.len(),
            invoked,
            elapsed_us = started.elapsed().as_micros() as u64,
            "event raised"
        );
        Ok(invoked)
    }

    /// Snapshot of every subscription in registration order.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        lock::read(&self.subscriptions).clone()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        lock::read(&self.subscriptions).len()
    }
}
