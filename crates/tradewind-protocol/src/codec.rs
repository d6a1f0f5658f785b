//! The [`Codec`] trait and the XML codec used on the wire.
//!
//! Decoding is a two-stage affair: bytes become an [`Element`] tree
//! (stream errors live here), then the tree becomes a [`Message`]
//! against the game context (content errors live here).

use crate::xml::{read_element, write_element};
use crate::{Element, Game, Message, ProtocolError};

/// Converts messages to and from bytes.
///
/// `Send + Sync + 'static` so a codec can live inside long-running
/// tasks and be shared between them.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a message.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] if writing fails.
    fn encode(&self, message: &Message) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a message, resolving object references in `game`.
    ///
    /// # Errors
    /// A stream corruption error for malformed input, or a content error
    /// for well-formed input that does not describe a valid message.
    fn decode(&self, data: &[u8], game: &mut Game) -> Result<Message, ProtocolError>;
}

/// Tag-delimited text with attributes, one document per message.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

impl XmlCodec {
    /// Parses bytes into an element tree without interpreting it.
    pub fn read_tree(&self, data: &[u8]) -> Result<Element, ProtocolError> {
        read_element(data)
    }

    /// Serializes an arbitrary element tree.
    pub fn write_tree(&self, element: &Element) -> Result<Vec<u8>, ProtocolError> {
        write_element(element)
    }
}

impl Codec for XmlCodec {
    fn encode(&self, message: &Message) -> Result<Vec<u8>, ProtocolError> {
        write_element(&message.to_element())
    }

    fn decode(&self, data: &[u8], game: &mut Game) -> Result<Message, ProtocolError> {
        let element = read_element(data)?;
        Message::from_element(&element, game)
    }
}
