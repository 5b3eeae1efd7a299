//! # engine_inject
//!
//! Type-driven dependency injection for the ECS runtime.
//!
//! Every manager and system lives exactly once in a shared pool keyed by its
//! concrete type. Types declare [`Dependency`] slots and the [`Container`]
//! binds them in two concurrent phases:
//!
//! 1. [`Container::instantiate`]: construct every eager registration.
//! 2. [`Container::inject_all`]: bind every slot, constructing lazily
//!    registered types on demand.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use engine_inject::{Container, Dependency, Injectable, Slot};
//!
//! #[derive(Default)]
//! struct Clock;
//! impl Injectable for Clock {}
//!
//! #[derive(Default)]
//! struct Scheduler {
//!     clock: Dependency<Clock>,
//! }
//!
//! impl Injectable for Scheduler {
//!     fn dependencies(&self) -> Vec<&dyn Slot> {
//!         vec![&self.clock]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), engine_inject::InjectError> {
//!     let mut container = Container::builder()
//!         .register::<Scheduler>()
//!         .register_lazy::<Clock>()
//!         .build();
//!     container.instantiate().await?;
//!     container.inject_all().await?;
//!     let scheduler = container.resolve::<Scheduler>()?;
//!     assert!(scheduler.clock.get().is_ok());
//!     Ok(())
//! }
//! ```

pub mod container;
pub mod dependency;
pub mod error;
pub mod injectable;
pub mod pool;

pub use container::{Activation, Container, ContainerBuilder, InjectionReport, Registration};
pub use dependency::{Dependency, Slot};
pub use error::InjectError;
pub use injectable::{Injectable, Instance, IntoAnyArc, TypeKey, downcast_instance};
pub use pool::{InstancePool, PoolEntry};
