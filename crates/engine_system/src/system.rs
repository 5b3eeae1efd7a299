//! The [`System`] contract.

use std::fmt;

use engine_inject::Injectable;

use crate::error::RuntimeError;

/// Initialisation tier of a system.
///
/// Tiers run in declaration order: `High`, then `Medium`, then `Low`. Systems
/// without a tier run after all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        f.write_str(name)
    }
}

/// A stateful unit of per-frame logic.
///
/// Systems are injectables: the orchestrator constructs one instance with
/// `Default`, binds its dependency slots, calls [`System::init`] once and then
/// [`System::update`] every frame. Hooks take `&self`, so per-system state
/// lives behind interior mutability.
///
/// ```rust
/// use std::sync::Mutex;
/// use engine_inject::Injectable;
/// use engine_system::{Priority, RuntimeError, System};
///
/// #[derive(Default)]
/// struct Clock {
///     elapsed: Mutex<f64>,
/// }
///
/// impl Injectable for Clock {}
///
/// impl System for Clock {
///     fn priority(&self) -> Option<Priority> {
///         Some(Priority::High)
///     }
///
///     fn update(&self, dt: f64) -> Result<(), RuntimeError> {
///         *self.elapsed.lock().unwrap() += dt;
///         Ok(())
///     }
/// }
/// ```
pub trait System: Injectable {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str {
        self.type_key().short_name()
    }

    /// Initialisation tier; `None` sorts after every tier.
    fn priority(&self) -> Option<Priority> {
        None
    }

    /// Called once after injection and prototype loading.
    ///
    /// # Errors
    ///
    /// Any error aborts startup.
    fn init(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// Called once per frame with the frame's delta time in seconds.
    ///
    /// # Errors
    ///
    /// Any error aborts the frame.
    fn update(&self, _dt: f64) -> Result<(), RuntimeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let mut tiers = vec![Some(Priority::Low), None, Some(Priority::High), Some(Priority::Medium)];
        tiers.sort_by_key(|p| (p.is_none(), *p));
        assert_eq!(
            tiers,
            vec![Some(Priority::High), Some(Priority::Medium), Some(Priority::Low), None]
        );
    }

    #[test]
    fn test_default_name_is_type_name() {
        #[derive(Default)]
        struct Gravity;
        impl Injectable for Gravity {}
        impl System for Gravity {}

        assert_eq!(Gravity.name(), "Gravity");
        assert_eq!(Gravity.priority(), None);
        assert!(Gravity.update(0.1).is_ok());
    }
}
