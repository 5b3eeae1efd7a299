//! Injection error types.

/// Errors that can occur while building or querying the object graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    /// A declared slot names a type that is neither instantiated nor
    /// registered, so it cannot be constructed.
    #[error("cannot satisfy dependency '{required}' of '{dependent}': no instance or registration")]
    MissingDependency {
        dependent: &'static str,
        required: &'static str,
    },

    /// A slot was read before injection bound it.
    #[error("dependency '{required}' has not been injected")]
    Unbound { required: &'static str },

    /// The bound instance no longer exists because its container was dropped.
    #[error("dependency '{required}' was released with its container")]
    Released { required: &'static str },

    /// The instance offered to a slot has the wrong concrete type.
    #[error("expected an instance of '{expected}', got '{actual}'")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The slot is already bound to a different instance.
    #[error("dependency '{required}' is already bound to a different instance")]
    AlreadyBound { required: &'static str },

    /// The pool holds no instance of the requested type.
    #[error("no instance of '{required}' has been instantiated")]
    NotInstantiated { required: &'static str },

    /// A startup task panicked or was cancelled before the join barrier.
    #[error("startup task failed: {0}")]
    Task(String),
}
