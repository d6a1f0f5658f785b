//! Flat messages: a tag and attributes, never children.

use std::fmt::Display;
use std::str::FromStr;

use crate::{Attributes, Element, ProtocolError};

/// A message made only of name/value attributes.
///
/// Simple requests and notifications encode through this shape. Reading
/// one from an element that has children is a content error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMessage {
    element: Element,
}

impl AttributeMessage {
    pub fn new(tag: &str) -> Self {
        Self {
            element: Element::new(tag),
        }
    }

    /// Adds an attribute.
    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        self.element.set_attribute(key, value);
        self
    }

    /// Adds an attribute when `value` is present.
    pub fn with_optional(mut self, key: &str, value: Option<impl Display>) -> Self {
        self.element.set_optional(key, value);
        self
    }

    pub fn tag(&self) -> &str {
        self.element.tag()
    }

    pub fn attributes(&self) -> &Attributes {
        self.element.attributes()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.element.attribute(key)
    }

    pub fn required(&self, key: &str) -> Result<&str, ProtocolError> {
        self.element.required(key)
    }

    pub fn parse<T>(&self, key: &str) -> Result<T, ProtocolError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.element.parse(key)
    }

    pub fn parse_optional<T>(&self, key: &str) -> Result<Option<T>, ProtocolError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.element.parse_optional(key)
    }

    pub fn into_element(self) -> Element {
        self.element
    }

    /// Reads a flat message with the expected tag.
    pub fn from_element(element: &Element, tag: &str) -> Result<Self, ProtocolError> {
        element.expect_tag(tag)?;
        if let Some(child) = element.children().first() {
            return Err(ProtocolError::UnexpectedContent {
                tag: tag.to_string(),
                detail: format!("attribute-only message has child <{}>", child.tag()),
            });
        }
        Ok(Self {
            element: element.clone(),
        })
    }
}
