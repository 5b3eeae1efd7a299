//! Core [`Component`] trait and associated metadata.
//!
//! Components are plain data bundles. Identity (the component id and the
//! owning entity) lives in the store's handle, never in the component value,
//! so a component type only has to say what it is called and how it is
//! defaulted, cloned and decoded from prototype data.
//!
//! ## Kind Identity
//!
//! [`ComponentKind`] is derived from the component's **string name** using the
//! FNV-1a 64-bit hash algorithm. Prototype files refer to kinds by name, so
//! the same name always produces the same kind regardless of registration
//! order.

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ComponentError;

/// A kind token identifying a component type, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKind(pub u64);

impl ComponentKind {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentKind`] of a component name.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// The kind of the Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({:#018x})", self.0)
    }
}

/// Type-erased constructor table for one component kind.
///
/// The registry keeps one of these per kind so the store can build a
/// zero-initialised instance, and the prototype loader can decode one, from
/// nothing but a kind name.
#[derive(Debug, Clone, Copy)]
pub struct ComponentMeta {
    /// The kind token.
    pub kind: ComponentKind,
    /// The declared name, as written in prototype `"Type"` fields.
    pub name: &'static str,
    /// Build a default (zero-initialised) instance.
    pub create_fn: fn() -> Box<dyn ErasedComponent>,
    /// Decode an instance from a JSON object.
    pub decode_fn: fn(Value) -> Result<Box<dyn ErasedComponent>, serde_json::Error>,
}

impl ComponentMeta {
    /// Build a default instance of this kind.
    #[must_use]
    pub fn create(&self) -> Box<dyn ErasedComponent> {
        (self.create_fn)()
    }

    /// Decode an instance of this kind from prototype data.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Decode`] when the payload does not match the
    /// component's fields.
    pub fn decode(&self, value: Value) -> Result<Box<dyn ErasedComponent>, ComponentError> {
        (self.decode_fn)(value).map_err(|source| ComponentError::Decode {
            kind: self.name.to_string(),
            source,
        })
    }
}

/// The core component trait.
///
/// `Default` is the zero-initialised state used by direct creation, `Clone`
/// is the structural copy used when an entity is built from a prototype, and
/// `DeserializeOwned` lets prototype files declare instances.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use engine_component::Component;
///
/// #[derive(Debug, Clone, Default, Deserialize)]
/// #[serde(default)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Clone + Default + fmt::Debug + Send + Sync + DeserializeOwned + 'static {
    /// The kind name used in prototype files.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentKind`] for this component.
    fn kind() -> ComponentKind {
        ComponentKind::from_name(Self::type_name())
    }

    /// Returns the [`ComponentMeta`] descriptor for this component type.
    fn meta() -> ComponentMeta {
        ComponentMeta {
            kind: Self::kind(),
            name: Self::type_name(),
            create_fn: create_erased::<Self>,
            decode_fn: decode_erased::<Self>,
        }
    }
}

fn create_erased<T: Component>() -> Box<dyn ErasedComponent> {
    Box::new(T::default())
}

fn decode_erased<T: Component>(value: Value) -> Result<Box<dyn ErasedComponent>, serde_json::Error> {
    let component: T = serde_json::from_value(value)?;
    Ok(Box::new(component))
}

/// Object-safe view of a [`Component`], implemented for every component type.
pub trait ErasedComponent: fmt::Debug + Send + Sync {
    /// The kind of the concrete value.
    fn erased_kind(&self) -> ComponentKind;

    /// The kind name of the concrete value.
    fn erased_type_name(&self) -> &'static str;

    /// Field-for-field copy into fresh storage.
    fn duplicate(&self) -> Box<dyn ErasedComponent>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedComponent for T {
    fn erased_kind(&self) -> ComponentKind {
        T::kind()
    }

    fn erased_type_name(&self) -> &'static str {
        T::type_name()
    }

    fn duplicate(&self) -> Box<dyn ErasedComponent> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn ErasedComponent {
    /// Returns `true` if the concrete value is a `T`.
    #[must_use]
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Health {
        current: f32,
        max: f32,
        tags: Vec<String>,
    }

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    struct Velocity {
        x: f32,
    }

    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    #[test]
    fn test_kind_matches_from_name() {
        assert_eq!(Health::kind(), ComponentKind::from_name("Health"));
        assert_eq!(ComponentKind::of::<Health>(), Health::kind());
        assert_ne!(Health::kind(), Velocity::kind());
    }

    #[test]
    fn test_fnv1a_known_vector() {
        // FNV-1a of the empty string is the offset basis itself.
        assert_eq!(
            ComponentKind::from_name(""),
            ComponentKind(0xcbf2_9ce4_8422_2325)
        );
    }

    #[test]
    fn test_meta_creates_default_instance() {
        let meta = Health::meta();
        assert_eq!(meta.name, "Health");
        let created = meta.create();
        assert_eq!(created.erased_kind(), Health::kind());
        assert_eq!(created.downcast_ref::<Health>(), Some(&Health::default()));
    }

    #[test]
    fn test_meta_decode_ignores_type_discriminator() {
        let meta = Health::meta();
        let decoded = meta
            .decode(serde_json::json!({ "Type": "Health", "current": 5, "max": 10 }))
            .unwrap();
        let health = decoded.downcast_ref::<Health>().unwrap();
        assert_eq!(health.current, 5.0);
        assert_eq!(health.max, 10.0);
    }

    #[test]
    fn test_meta_decode_reports_kind_on_failure() {
        let err = Velocity::meta()
            .decode(serde_json::json!({ "x": "fast" }))
            .unwrap_err();
        assert!(matches!(err, ComponentError::Decode { ref kind, .. } if kind == "Velocity"));
    }

    #[test]
    fn test_duplicate_is_independent_storage() {
        let original: Box<dyn ErasedComponent> = Box::new(Health {
            current: 1.0,
            max: 2.0,
            tags: vec!["a".into()],
        });
        let mut copy = original.duplicate();
        copy.downcast_mut::<Health>().unwrap().tags.push("b".into());

        assert_eq!(original.downcast_ref::<Health>().unwrap().tags, vec!["a"]);
        assert_eq!(copy.downcast_ref::<Health>().unwrap().tags, vec!["a", "b"]);
    }

    #[test]
    fn test_downcast_wrong_type_is_none() {
        let value: Box<dyn ErasedComponent> = Box::new(Velocity { x: 1.0 });
        assert!(value.is::<Velocity>());
        assert!(value.downcast_ref::<Health>().is_none());
    }
}
