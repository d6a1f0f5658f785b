//! Reply correlation.
//!
//! A [`WrapperMessage`] carries one optional inner message and the
//! `networkReplyId` that ties a question to its reply. The correlation
//! layer only ever looks at the id, so any message becomes awaitable by
//! wrapping it.

use crate::{Element, Game, Message, ProtocolError, ReplyId};

/// Attribute holding the reply id on every wrapper.
pub const REPLY_ID_ATTRIBUTE: &str = "networkReplyId";

/// A reply id plus at most one payload message.
///
/// An absent payload means "no content", as in a bare acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperMessage {
    reply_id: ReplyId,
    message: Option<Box<Message>>,
}

impl WrapperMessage {
    pub fn new(reply_id: ReplyId, message: Option<Message>) -> Self {
        Self {
            reply_id,
            message: message.map(Box::new),
        }
    }

    pub fn reply_id(&self) -> ReplyId {
        self.reply_id
    }

    /// The wrapped message, if any.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_deref()
    }

    pub fn into_message(self) -> Option<Message> {
        self.message.map(|message| *message)
    }

    /// Tag of the wrapped message, if any.
    pub fn sub_type(&self) -> Option<&'static str> {
        self.message().map(Message::tag)
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none()
    }

    /// Encodes under the given wrapper tag.
    pub(crate) fn to_element(&self, tag: &str) -> Element {
        let mut element = Element::new(tag).with_attribute(REPLY_ID_ATTRIBUTE, self.reply_id);
        if let Some(message) = &self.message {
            element.push_child(message.to_element());
        }
        element
    }

    /// Reads the reply id first, then at most one payload.
    ///
    /// # Errors
    /// A missing or non-integer reply id, more than one child, or any
    /// error from decoding the payload.
    pub(crate) fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        let reply_id: ReplyId = element.parse(REPLY_ID_ATTRIBUTE)?;
        let message = match element.children() {
            [] => None,
            [inner] => Some(Message::from_element(inner, game)?),
            more => {
                return Err(ProtocolError::UnexpectedContent {
                    tag: element.tag().to_string(),
                    detail: format!("wrapper holds {} messages, expected at most one", more.len()),
                });
            }
        };
        Ok(Self::new(reply_id, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{EndTurn, Multiple};
    use crate::codec::test_support::round_trip;
    use crate::xml::read_element;

    #[test]
    fn test_accessors() {
        let wrapper = WrapperMessage::new(ReplyId::new(7), Some(EndTurn.into()));
        assert_eq!(wrapper.reply_id(), ReplyId::new(7));
        assert_eq!(wrapper.sub_type(), Some("endTurn"));
        assert!(!wrapper.is_empty());
        assert_eq!(wrapper.into_message(), Some(Message::EndTurn(EndTurn)));
    }

    #[test]
    fn test_empty_wrapper_round_trip_keeps_id_only() {
        let mut game = Game::new();
        let reply = Message::reply(ReplyId::new(42), None);

        let element = reply.to_element();
        assert_eq!(element.attribute(REPLY_ID_ATTRIBUTE), Some("42"));
        assert!(element.children().is_empty());

        let back = round_trip(&reply, &mut game);
        let Message::Reply(wrapper) = back else {
            panic!("expected a reply");
        };
        assert_eq!(wrapper.reply_id(), ReplyId::new(42));
        assert!(wrapper.is_empty());
        assert_eq!(wrapper.sub_type(), None);
    }

    #[test]
    fn test_question_round_trip_with_nested_multiple() {
        let mut game = Game::new();
        let question = Message::question(
            ReplyId::new(3),
            Multiple {
                messages: vec![EndTurn.into(), EndTurn.into()],
            },
        );
        assert_eq!(round_trip(&question, &mut game), question);
    }

    #[test]
    fn test_missing_reply_id_is_content_error() {
        let element = read_element(b"<reply><endTurn/></reply>").unwrap();
        let err = Message::from_element(&element, &mut Game::new()).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingAttribute { ref attribute, .. } if attribute == REPLY_ID_ATTRIBUTE));
    }

    #[test]
    fn test_non_integer_reply_id_is_content_error() {
        let element = read_element(b"<reply networkReplyId=\"x1\"/>").unwrap();
        let err = Message::from_element(&element, &mut Game::new()).unwrap_err();
        assert!(err.is_content_error());
    }

    #[test]
    fn test_two_payloads_is_content_error() {
        let element =
            read_element(b"<question networkReplyId=\"1\"><endTurn/><endTurn/></question>").unwrap();
        let err = Message::from_element(&element, &mut Game::new()).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedContent { .. }));
    }

    #[test]
    fn test_unknown_payload_tag_is_content_error() {
        let element = read_element(b"<question networkReplyId=\"1\"><flyToMoon/></question>").unwrap();
        let err = Message::from_element(&element, &mut Game::new()).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownTag(_)));
    }
}
