//! World-layer error types.

use engine_component::{ComponentError, ComponentId, EntityId};
use engine_inject::InjectError;

/// Errors returned by the component store, entity registry, prototype
/// registry and event bus.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Component(#[from] ComponentError),

    /// A manager was used before its dependencies were injected.
    #[error(transparent)]
    Inject(#[from] InjectError),

    /// No loaded prototype matches both the id and the requested shape.
    #[error("prototype '{id}' of type '{shape}' not found")]
    PrototypeNotFound { id: String, shape: &'static str },

    /// An event callback received a component or event of another kind than
    /// it subscribed to.
    #[error("event callback for '{expected}' was invoked with '{actual}'")]
    WrongKindInvocation { expected: String, actual: String },

    /// Typed access to a component that holds a different kind.
    #[error("{component} holds '{actual}', not '{expected}'")]
    KindMismatch {
        component: ComponentId,
        expected: &'static str,
        actual: &'static str,
    },

    /// The component is already part of the entity's set.
    #[error("{component} is already attached to {entity}")]
    DuplicateComponent {
        entity: EntityId,
        component: ComponentId,
    },

    #[error("{0} not found")]
    EntityNotFound(EntityId),

    /// Failure reported by an application callback.
    #[error("{0}")]
    Callback(String),
}

/// Why one prototype file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum PrototypeError {
    #[error("failed to read prototype file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed prototype JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("prototype must be a JSON object")]
    NotAnObject,

    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// The `"Type"` discriminator names no registered prototype shape.
    #[error("unknown prototype type '{name}'")]
    UnknownShape { name: String },

    #[error(transparent)]
    Component(#[from] ComponentError),

    /// Another file already declared this id for the same shape.
    #[error("duplicate {shape} id '{id}'")]
    DuplicateId { shape: &'static str, id: String },
}
