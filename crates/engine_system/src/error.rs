//! Runtime error types.

use engine_inject::InjectError;
use engine_world::WorldError;

use crate::orchestrator::Phase;

/// Errors raised while starting the runtime or running a frame.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    World(#[from] WorldError),

    /// Instantiation or injection failed; fatal at startup.
    #[error(transparent)]
    Inject(#[from] InjectError),

    /// The operation is not allowed in the orchestrator's current phase.
    #[error("cannot {operation} while {actual}")]
    InvalidPhase {
        operation: &'static str,
        actual: Phase,
    },

    /// A system's `init` or `update` hook failed.
    #[error("system '{system}' failed during {hook}: {source}")]
    System {
        system: &'static str,
        hook: &'static str,
        #[source]
        source: Box<RuntimeError>,
    },

    /// Failure reported by application code.
    #[error("{0}")]
    Custom(String),
}
