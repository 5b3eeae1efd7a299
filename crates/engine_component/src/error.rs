//! Component-layer error types.

use crate::component::ComponentKind;

/// Errors raised while resolving component kinds and enum tokens.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// No component kind is registered under this name.
    #[error("component kind '{name}' not found")]
    KindNotFound { name: String },

    /// A kind token that was never registered.
    #[error("unknown component kind {0}")]
    UnknownKind(ComponentKind),

    /// No enum type is registered under this name.
    #[error("enum type '{name}' not found")]
    EnumNotFound { name: String },

    /// The enum exists but has no such member.
    #[error("enum '{enum_name}' has no member '{member}'")]
    UnknownEnumMember { enum_name: String, member: String },

    /// A value that should be an `enum.<Enum>.<Member>` token is malformed.
    #[error("invalid enum token '{token}': {reason}")]
    InvalidEnumToken { token: String, reason: &'static str },

    /// The payload of a component did not match its fields.
    #[error("failed to decode component '{kind}': {source}")]
    Decode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
