//! Systems bundled with the runtime binary.

mod motion;
mod spawn;
mod sprite;
mod time;

pub use motion::MotionSystem;
pub use spawn::{SpawnList, SpawnSystem};
pub use sprite::{SpriteSystem, TextureAllocator};
pub use time::TimeSystem;
