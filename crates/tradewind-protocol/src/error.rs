//! Error types for the protocol layer.
//!
//! Two families matter to callers. A *stream corruption* means the text
//! itself is broken (bad markup, a closing tag that does not match the
//! open one, truncation). A *content error* means the structure parsed
//! but says something invalid: an unknown tag, a missing or malformed
//! attribute, a reference to an object the game does not know. Both
//! are fatal to the one message being decoded and to nothing else.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The encoded text is not well-formed.
    #[error("stream corruption: {0}")]
    StreamCorruption(String),

    /// No message variant is registered for this tag.
    #[error("unknown message tag <{0}>")]
    UnknownTag(String),

    /// A required attribute is absent.
    #[error("<{tag}> is missing attribute `{attribute}`")]
    MissingAttribute { tag: String, attribute: String },

    /// An attribute is present but its value cannot be used.
    #[error("<{tag}> attribute `{attribute}` has invalid value {value:?}: {reason}")]
    InvalidAttribute {
        tag: String,
        attribute: String,
        value: String,
        reason: String,
    },

    /// Children are missing, surplus, or of the wrong kind.
    #[error("<{tag}> has unexpected content: {detail}")]
    UnexpectedContent { tag: String, detail: String },

    /// A referenced game object was required to exist but does not.
    #[error("reference to unknown game object {0}")]
    UnknownObject(String),

    /// Writing the encoded form failed.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl ProtocolError {
    /// Returns `true` for structural damage to the encoded stream.
    pub fn is_stream_corruption(&self) -> bool {
        matches!(self, Self::StreamCorruption(_))
    }

    /// Returns `true` for well-formed input with invalid meaning.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTag(_)
                | Self::MissingAttribute { .. }
                | Self::InvalidAttribute { .. }
                | Self::UnexpectedContent { .. }
                | Self::UnknownObject(_)
        )
    }
}
