//! Components and enums used by the bundled systems and prototypes.

use engine_component::{Component, RegisteredEnum, enum_token};
use engine_math::Vec2;
use serde::Deserialize;

/// Draw order bucket of a sprite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderLayer {
    Background,
    #[default]
    World,
    Foreground,
}

impl RegisteredEnum for RenderLayer {
    fn enum_name() -> &'static str {
        "RenderLayer"
    }

    fn members() -> &'static [(&'static str, Self)] {
        &[
            ("Background", RenderLayer::Background),
            ("World", RenderLayer::World),
            ("Foreground", RenderLayer::Foreground),
        ]
    }
}

/// A (possibly animated) image drawn at the entity's transform.
///
/// Prototypes declare the path, frame count and animation rate; the sprite
/// system fills in the texture handle and advances the current frame.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Sprite {
    pub sprite_path: String,
    #[serde(deserialize_with = "enum_token::deserialize")]
    pub layer: RenderLayer,
    pub animation_fps: f32,
    pub frame_count: u32,
    pub current_frame: u32,
    /// Texture handle; 0 until resolved.
    pub texture_id: u32,
    /// Time in seconds at which the next frame is shown.
    pub next_frame_at: Option<f64>,
}

impl Component for Sprite {
    fn type_name() -> &'static str {
        "Sprite"
    }
}

/// Units per second an entity's transform moves each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Velocity {
    pub velocity: Vec2,
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_decodes_layer_token() {
        let decoded = Sprite::meta()
            .decode(serde_json::json!({
                "sprite_path": "assets/torch.png",
                "layer": "enum.RenderLayer.Foreground",
                "frame_count": 4
            }))
            .unwrap();
        let sprite = decoded.downcast_ref::<Sprite>().unwrap();
        assert_eq!(sprite.layer, RenderLayer::Foreground);
        assert_eq!(sprite.frame_count, 4);
        assert_eq!(sprite.texture_id, 0);
    }

    #[test]
    fn test_sprite_layer_defaults_when_absent() {
        let decoded = Sprite::meta().decode(serde_json::json!({})).unwrap();
        assert_eq!(decoded.downcast_ref::<Sprite>().unwrap().layer, RenderLayer::World);
    }
}
