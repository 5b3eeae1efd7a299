use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use engine_component::ComponentKind;
use engine_inject::{Dependency, Injectable, Slot};
use engine_system::{Priority, RuntimeError, System};
use engine_world::{ComponentCloned, ComponentRef, ComponentStore, EventBus, WorldError};
use tracing::{debug, warn};

use crate::components::Sprite;
use crate::systems::TimeSystem;

/// Hands out texture handles. Handle 0 means "no texture".
///
/// Stands in for a renderer's texture upload; nothing is decoded.
#[derive(Debug, Default)]
pub struct TextureAllocator {
    issued: AtomicU32,
}

impl TextureAllocator {
    pub fn request_texture(&self, path: &str) -> u32 {
        let texture_id = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(path, texture_id, "texture allocated");
        texture_id
    }

    /// Number of handles issued so far.
    pub fn issued(&self) -> u32 {
        self.issued.load(Ordering::Relaxed)
    }
}

impl Injectable for TextureAllocator {}

type TextureCache = Arc<Mutex<HashMap<String, u32>>>;

/// Resolves sprite textures as sprites are cloned into the world and steps
/// their animation frames.
#[derive(Default)]
pub struct SpriteSystem {
    time: Dependency<TimeSystem>,
    textures: Dependency<TextureAllocator>,
    events: Dependency<EventBus>,
    store: Dependency<ComponentStore>,
    /// Path to handle; a path is allocated once.
    cache: TextureCache,
}

impl SpriteSystem {
    /// Number of distinct sprite paths resolved.
    pub fn cached_textures(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Injectable for SpriteSystem {
    fn dependencies(&self) -> Vec<&dyn Slot> {
        vec![&self.time, &self.textures, &self.events, &self.store]
    }
}

impl System for SpriteSystem {
    fn priority(&self) -> Option<Priority> {
        Some(Priority::High)
    }

    fn init(&self) -> Result<(), RuntimeError> {
        let textures = self.textures.get()?;
        let cache = Arc::clone(&self.cache);
        self.events
            .get()?
            .subscribe::<Sprite, ComponentCloned, _>(move |component, event| {
                // Broadcast reaches every sprite; only the new one needs work.
                if !event.component.ptr_eq(component) {
                    return Ok(());
                }
                resolve_texture(component, &textures, &cache)
            });
        Ok(())
    }

    fn update(&self, _dt: f64) -> Result<(), RuntimeError> {
        let now = self.time.get()?.time();
        for sprite in self.store.get()?.components_of_kind(ComponentKind::of::<Sprite>()) {
            sprite.write::<Sprite, _>(|sprite| advance_frame(sprite, now))?;
        }
        Ok(())
    }
}

fn resolve_texture(
    component: &ComponentRef,
    textures: &TextureAllocator,
    cache: &Mutex<HashMap<String, u32>>,
) -> Result<(), WorldError> {
    let path = component.read::<Sprite, _>(|sprite| sprite.sprite_path.clone())?;
    if path.is_empty() {
        warn!(component = %component.id(), "sprite has no path");
        return Ok(());
    }
    let texture_id = *cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(path)
        .or_insert_with_key(|path| textures.request_texture(path));
    component.write::<Sprite, _>(|sprite| sprite.texture_id = texture_id)
}

/// Moves to the next frame once `now` passes the scheduled time. Sprites
/// without a texture, a rate, or more than one frame stay put.
fn advance_frame(sprite: &mut Sprite, now: f64) {
    if sprite.texture_id == 0 || sprite.frame_count <= 1 || sprite.animation_fps <= 0.0 {
        return;
    }
    let frame_time = 1.0 / f64::from(sprite.animation_fps);
    let due = *sprite.next_frame_at.get_or_insert(now + frame_time);
    if now >= due {
        sprite.current_frame = (sprite.current_frame + 1) % sprite.frame_count;
        sprite.next_frame_at = Some(due + frame_time);
    }
}
