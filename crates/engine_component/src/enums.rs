//! Enumerated constants in prototype data.
//!
//! Prototype files never write enum members bare. Every enumerated value is a
//! dotted token `enum.<EnumName>.<Member>`, so a loader can tell an enum
//! constant apart from an ordinary string and check it against the enum
//! types the application registered.
//!
//! Component fields holding a registered enum decode through
//! [`enum_token::deserialize`]:
//!
//! ```rust
//! use serde::Deserialize;
//! use engine_component::{RegisteredEnum, enum_token};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Default)]
//! enum Facing { #[default] Left, Right }
//!
//! impl RegisteredEnum for Facing {
//!     fn enum_name() -> &'static str { "Facing" }
//!     fn members() -> &'static [(&'static str, Self)] {
//!         &[("Left", Facing::Left), ("Right", Facing::Right)]
//!     }
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct Actor {
//!     #[serde(deserialize_with = "enum_token::deserialize")]
//!     facing: Facing,
//! }
//!
//! let actor: Actor = serde_json::from_str(r#"{"facing":"enum.Facing.Right"}"#).unwrap();
//! assert_eq!(actor.facing, Facing::Right);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::ComponentError;

/// Every enum token starts with this prefix.
pub const ENUM_TOKEN_PREFIX: &str = "enum.";

/// An enum type that may appear in prototype data.
pub trait RegisteredEnum: Copy + PartialEq + Send + Sync + 'static {
    /// The `<EnumName>` part of the token.
    fn enum_name() -> &'static str;

    /// Every member with its token name.
    fn members() -> &'static [(&'static str, Self)];

    /// Parse a member name.
    fn from_member(member: &str) -> Option<Self> {
        Self::members()
            .iter()
            .find(|(name, _)| *name == member)
            .map(|(_, value)| *value)
    }

    /// The token name of this value.
    fn member_name(self) -> Option<&'static str> {
        Self::members()
            .iter()
            .find(|(_, value)| *value == self)
            .map(|(name, _)| *name)
    }
}

/// A parsed `enum.<EnumName>.<Member>` token borrowing from its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumToken<'a> {
    pub enum_name: &'a str,
    pub member: &'a str,
}

impl<'a> EnumToken<'a> {
    /// Split a raw token into its enum and member names.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidEnumToken`] when the prefix is missing
    /// or the token does not have exactly three dotted parts.
    pub fn parse(raw: &'a str) -> Result<Self, ComponentError> {
        let invalid = |reason| ComponentError::InvalidEnumToken {
            token: raw.to_string(),
            reason,
        };

        let rest = raw
            .strip_prefix(ENUM_TOKEN_PREFIX)
            .ok_or_else(|| invalid("value must begin with 'enum.'"))?;
        let (enum_name, member) = rest
            .split_once('.')
            .ok_or_else(|| invalid("expected 'enum.<Enum>.<Member>'"))?;
        if enum_name.is_empty() || member.is_empty() || member.contains('.') {
            return Err(invalid("expected 'enum.<Enum>.<Member>'"));
        }

        Ok(Self { enum_name, member })
    }
}

impl fmt::Display for EnumToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ENUM_TOKEN_PREFIX}{}.{}", self.enum_name, self.member)
    }
}

/// Name and member list of one registered enum type.
#[derive(Debug, Clone)]
pub struct EnumMeta {
    pub name: &'static str,
    pub members: Vec<&'static str>,
}

impl EnumMeta {
    fn of<E: RegisteredEnum>() -> Self {
        Self {
            name: E::enum_name(),
            members: E::members().iter().map(|(name, _)| *name).collect(),
        }
    }

    #[must_use]
    pub fn has_member(&self, member: &str) -> bool {
        self.members.iter().any(|m| *m == member)
    }
}

/// Registry of enum types addressable from prototype data, built the same
/// way as the component [`KindRegistry`](crate::KindRegistry).
#[derive(Debug, Default, Clone)]
pub struct EnumRegistry {
    enums: HashMap<&'static str, EnumMeta>,
}

impl EnumRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the enum type `E`.
    pub fn register<E: RegisteredEnum>(&mut self) {
        self.enums
            .entry(E::enum_name())
            .or_insert_with(EnumMeta::of::<E>);
    }

    /// Look up an enum type by name.
    #[must_use]
    pub fn try_get_enum_by_name(&self, name: &str) -> Option<&EnumMeta> {
        self.enums.get(name)
    }

    /// Parse a token and check it against the registered enums.
    ///
    /// # Errors
    ///
    /// Fails if the token is malformed, the enum type is unknown, or the
    /// member does not belong to it.
    pub fn resolve<'a>(&self, raw: &'a str) -> Result<EnumToken<'a>, ComponentError> {
        let token = EnumToken::parse(raw)?;
        let meta = self
            .try_get_enum_by_name(token.enum_name)
            .ok_or_else(|| ComponentError::EnumNotFound {
                name: token.enum_name.to_string(),
            })?;
        if !meta.has_member(token.member) {
            return Err(ComponentError::UnknownEnumMember {
                enum_name: token.enum_name.to_string(),
                member: token.member.to_string(),
            });
        }
        Ok(token)
    }

    /// Walk a JSON document and resolve every string that carries the
    /// `enum.` prefix.
    ///
    /// # Errors
    ///
    /// Returns the first token that fails [`EnumRegistry::resolve`].
    pub fn check_tokens(&self, value: &Value) -> Result<usize, ComponentError> {
        match value {
            Value::String(s) if s.starts_with(ENUM_TOKEN_PREFIX) => {
                self.resolve(s)?;
                Ok(1)
            }
            Value::Array(items) => items.iter().try_fold(0, |n, item| {
                Ok(n + self.check_tokens(item)?)
            }),
            Value::Object(map) => map.values().try_fold(0, |n, item| {
                Ok(n + self.check_tokens(item)?)
            }),
            _ => Ok(0),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.enums.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}

/// Serde helper decoding a [`RegisteredEnum`] field from its token form.
pub mod enum_token {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    use super::{EnumToken, RegisteredEnum};

    /// Use with `#[serde(deserialize_with = "enum_token::deserialize")]`.
    ///
    /// # Errors
    ///
    /// Fails if the value is not a string, lacks the `enum.` prefix, names a
    /// different enum type, or names an unknown member.
    pub fn deserialize<'de, D, E>(deserializer: D) -> Result<E, D::Error>
    where
        D: Deserializer<'de>,
        E: RegisteredEnum,
    {
        let raw = String::deserialize(deserializer)?;
        let token = EnumToken::parse(&raw).map_err(D::Error::custom)?;
        if token.enum_name != E::enum_name() {
            return Err(D::Error::custom(format!(
                "expected enum '{}', got '{}'",
                E::enum_name(),
                token.enum_name
            )));
        }
        E::from_member(token.member).ok_or_else(|| {
            D::Error::custom(format!(
                "enum '{}' has no member '{}'",
                token.enum_name, token.member
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    enum Layer {
        #[default]
        Background,
        Foreground,
    }

    impl RegisteredEnum for Layer {
        fn enum_name() -> &'static str {
            "Layer"
        }

        fn members() -> &'static [(&'static str, Self)] {
            &[("Background", Layer::Background), ("Foreground", Layer::Foreground)]
        }
    }

    #[derive(Debug, Deserialize)]
    struct Sprite {
        #[serde(deserialize_with = "enum_token::deserialize")]
        layer: Layer,
    }

    fn registry() -> EnumRegistry {
        let mut registry = EnumRegistry::new();
        registry.register::<Layer>();
        registry
    }

    #[test]
    fn test_parse_token() {
        let token = EnumToken::parse("enum.Layer.Foreground").unwrap();
        assert_eq!(token.enum_name, "Layer");
        assert_eq!(token.member, "Foreground");
        assert_eq!(token.to_string(), "enum.Layer.Foreground");
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        let err = EnumToken::parse("Layer.Foreground").unwrap_err();
        assert!(matches!(err, ComponentError::InvalidEnumToken { .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        assert!(EnumToken::parse("enum.Layer").is_err());
        assert!(EnumToken::parse("enum.Layer.A.B").is_err());
        assert!(EnumToken::parse("enum..A").is_err());
    }

    #[test]
    fn test_resolve_unknown_enum() {
        let err = registry().resolve("enum.Colour.Red").unwrap_err();
        assert!(matches!(err, ComponentError::EnumNotFound { ref name } if name == "Colour"));
    }

    #[test]
    fn test_resolve_unknown_member() {
        let err = registry().resolve("enum.Layer.Middle").unwrap_err();
        assert!(matches!(err, ComponentError::UnknownEnumMember { .. }));
    }

    #[test]
    fn test_check_tokens_walks_nested_values() {
        let doc = json!({
            "name": "plain string",
            "layers": ["enum.Layer.Background", { "inner": "enum.Layer.Foreground" }]
        });
        assert_eq!(registry().check_tokens(&doc).unwrap(), 2);

        let bad = json!({ "layers": [{ "inner": "enum.Nope.X" }] });
        assert!(registry().check_tokens(&bad).is_err());
    }

    #[test]
    fn test_field_deserialize() {
        let sprite: Sprite = serde_json::from_value(json!({ "layer": "enum.Layer.Foreground" })).unwrap();
        assert_eq!(sprite.layer, Layer::Foreground);
    }

    #[test]
    fn test_field_deserialize_requires_prefix() {
        let result: Result<Sprite, _> = serde_json::from_value(json!({ "layer": "Foreground" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_field_deserialize_rejects_other_enum() {
        let result: Result<Sprite, _> =
            serde_json::from_value(json!({ "layer": "enum.Facing.Foreground" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_member_name() {
        assert_eq!(Layer::Foreground.member_name(), Some("Foreground"));
        assert_eq!(Layer::from_member("Background"), Some(Layer::Background));
    }
}
