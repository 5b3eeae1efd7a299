//! 2D transform component.
//!
//! [`Transform`] places an axis-aligned box in the world: its lower-left
//! position and its size. Prototype files write both as `[x, y]` arrays.

use engine_component::Component;
use glam::{Mat3, Vec2};
use serde::{Deserialize, Serialize};

/// Position and size of an entity in 2D world space.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Transform {
    /// Extent of the entity. Zero until set.
    pub size: Vec2,
    /// World-space position.
    pub position: Vec2,
}

impl Transform {
    /// A transform at `position` with the given `size`.
    #[must_use]
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self { size, position }
    }

    /// Translate the transform by the given offset.
    #[must_use]
    pub fn translated(mut self, offset: Vec2) -> Self {
        self.position += offset;
        self
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Returns `true` if `point` lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.position + self.size;
        point.cmpge(self.position).all() && point.cmple(max).all()
    }

    /// Model matrix scaling a unit quad to `size` and moving it to
    /// `position`.
    #[must_use]
    pub fn to_matrix(&self) -> Mat3 {
        Mat3::from_scale_angle_translation(self.size, 0.0, self.position)
    }
}

impl Component for Transform {
    fn type_name() -> &'static str {
        "Transform"
    }
}
