//! # engine_system
//!
//! Systems and the runtime lifecycle.
//!
//! This crate provides the [`System`] contract and the [`Orchestrator`] that
//! bootstraps the whole object graph:
//!
//! 1. Instantiate every manager and system concurrently.
//! 2. Inject every declared dependency slot concurrently.
//! 3. Load prototypes.
//! 4. Call `init` on every system in priority order.
//! 5. Call `update(dt)` on every system, once per frame.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use engine_inject::Injectable;
//! use engine_system::{Orchestrator, Priority, RuntimeConfig, RuntimeError, System};
//!
//! #[derive(Default)]
//! struct Physics;
//!
//! impl Injectable for Physics {}
//!
//! impl System for Physics {
//!     fn priority(&self) -> Option<Priority> {
//!         Some(Priority::High)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RuntimeError> {
//!     let mut runtime = Orchestrator::builder()
//!         .config(RuntimeConfig::from_env())
//!         .system::<Physics>()
//!         .build();
//!     runtime.start().await?;
//!     runtime.update_all(1.0 / 60.0)?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod orchestrator;
pub mod system;

pub use engine_world::RuntimeConfig;
pub use error::RuntimeError;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, Phase};
pub use system::{Priority, System};
