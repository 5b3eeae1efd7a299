//! # engine_math
//!
//! Math types for the ECS runtime. Re-exports [`glam`] for linear algebra and
//! defines spatial components that implement
//! [`Component`](engine_component::Component).

pub mod transform;

// Re-export glam types for convenience.
pub use glam::{Mat3, Vec2, Vec3};

pub use transform::Transform;
