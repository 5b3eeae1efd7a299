//! The runtime type registry.
//!
//! Bundles everything prototype data may name: component kinds, enum types
//! and prototype shapes. The composition root fills it before startup and
//! hands it to the container, after which it is read-only.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use engine_component::{Component, EnumRegistry, KindRegistry, RegisteredEnum};
use engine_inject::Injectable;
use serde_json::Value;

use crate::error::PrototypeError;
use crate::prototype::EntityPrototype;

/// A declarative template type that prototype files can name in their
/// `"Type"` field.
pub trait PrototypeShape: Send + Sync + 'static {
    /// The `"Type"` discriminator of this shape.
    fn shape_name() -> &'static str
    where
        Self: Sized;

    /// The unique id of this prototype within its shape.
    fn id(&self) -> &str;

    /// Decode a prototype from the parsed file contents.
    ///
    /// # Errors
    ///
    /// Returns a [`PrototypeError`] when a field is missing or malformed, or
    /// when a nested component cannot be resolved.
    fn decode(value: Value, types: &TypeRegistry) -> Result<Self, PrototypeError>
    where
        Self: Sized;
}

/// A decoded prototype with its shape erased.
pub struct DecodedPrototype {
    pub id: String,
    pub value: Arc<dyn Any + Send + Sync>,
}

/// Decoder table for one prototype shape.
#[derive(Clone, Copy)]
pub struct ShapeMeta {
    pub name: &'static str,
    pub type_id: TypeId,
    decode_fn: fn(Value, &TypeRegistry) -> Result<DecodedPrototype, PrototypeError>,
}

impl ShapeMeta {
    #[must_use]
    pub fn of<P: PrototypeShape>() -> Self {
        Self {
            name: P::shape_name(),
            type_id: TypeId::of::<P>(),
            decode_fn: decode_shape::<P>,
        }
    }

    /// Decode a file of this shape.
    ///
    /// # Errors
    ///
    /// Propagates the shape's decoding error.
    pub fn decode(&self, value: Value, types: &TypeRegistry) -> Result<DecodedPrototype, PrototypeError> {
        (self.decode_fn)(value, types)
    }
}

impl fmt::Debug for ShapeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeMeta").field("name", &self.name).finish()
    }
}

fn decode_shape<P: PrototypeShape>(
    value: Value,
    types: &TypeRegistry,
) -> Result<DecodedPrototype, PrototypeError> {
    let prototype = P::decode(value, types)?;
    Ok(DecodedPrototype {
        id: prototype.id().to_string(),
        value: Arc::new(prototype),
    })
}

/// Component kinds, enum types and prototype shapes known to the runtime.
#[derive(Debug)]
pub struct TypeRegistry {
    kinds: KindRegistry,
    enums: EnumRegistry,
    shapes: HashMap<&'static str, ShapeMeta>,
}

impl TypeRegistry {
    /// A registry knowing only the built-in [`EntityPrototype`] shape.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            kinds: KindRegistry::new(),
            enums: EnumRegistry::new(),
            shapes: HashMap::new(),
        };
        registry.register_shape::<EntityPrototype>();
        registry
    }

    pub fn register_component<C: Component>(&mut self) -> &mut Self {
        self.kinds.register::<C>();
        self
    }

    pub fn register_enum<E: RegisteredEnum>(&mut self) -> &mut Self {
        self.enums.register::<E>();
        self
    }

    /// Register a prototype shape. A second shape with the same
    /// discriminator replaces the first.
    pub fn register_shape<P: PrototypeShape>(&mut self) -> &mut Self {
        let meta = ShapeMeta::of::<P>();
        self.shapes.insert(meta.name, meta);
        self
    }

    #[must_use]
    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    #[must_use]
    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    /// Look up a prototype shape by its discriminator.
    #[must_use]
    pub fn shape(&self, name: &str) -> Option<&ShapeMeta> {
        self.shapes.get(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Injectable for TypeRegistry {}
