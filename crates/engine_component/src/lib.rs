//! # engine_component
//!
//! The "C" in ECS: defines what a component is, how its kind is identified,
//! and how prototype data names kinds and enum constants.
//!
//! This crate provides:
//!
//! - [`Component`] trait: the contract all component data must satisfy.
//! - [`ComponentKind`] / [`KindRegistry`]: kind tokens and the name-to-constructor table.
//! - [`EntityId`] / [`ComponentId`] / [`IdSequence`]: monotonically increasing identifiers.
//! - [`EnumRegistry`] / [`enum_token`]: `enum.<Enum>.<Member>` tokens.

pub mod component;
pub mod enums;
pub mod error;
pub mod id;
pub mod registry;

pub use component::{Component, ComponentKind, ComponentMeta, ErasedComponent};
pub use enums::{EnumMeta, EnumRegistry, EnumToken, RegisteredEnum, enum_token};
pub use error::ComponentError;
pub use id::{ComponentId, EntityId, IdSequence};
pub use registry::KindRegistry;
