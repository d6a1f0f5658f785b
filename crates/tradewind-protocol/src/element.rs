//! The generic tree every message is written to and read from.
//!
//! An [`Element`] is a tag, an ordered set of string attributes with
//! unique keys, and ordered child elements. Values are always stored as
//! text; typed access happens at the accessor, and a value that does not
//! parse is a content error rather than a stream error.

use std::fmt::Display;
use std::str::FromStr;

use crate::ProtocolError;

/// Ordered attribute set with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Creates an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A tagged node with attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Attributes,
    children: Vec<Element>,
}

impl Element {
    /// Creates an element with no attributes and no children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, key: &str, value: impl Display) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder form of [`push_child`](Self::push_child).
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Display) {
        self.attributes.set(key, value.to_string());
    }

    /// Sets the attribute only when `value` is `Some`.
    pub fn set_optional(&mut self, key: &str, value: Option<impl Display>) {
        if let Some(value) = value {
            self.set_attribute(key, value);
        }
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Returns the raw attribute value, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    /// Returns the raw attribute value or a content error.
    pub fn required(&self, key: &str) -> Result<&str, ProtocolError> {
        self.attribute(key)
            .ok_or_else(|| ProtocolError::MissingAttribute {
                tag: self.tag.clone(),
                attribute: key.to_string(),
            })
    }

    /// Parses a required attribute as `T`.
    pub fn parse<T>(&self, key: &str) -> Result<T, ProtocolError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.required(key)?;
        self.coerce(key, raw)
    }

    /// Parses an optional attribute as `T`. Absent is `Ok(None)`;
    /// present but malformed is still an error.
    pub fn parse_optional<T>(&self, key: &str) -> Result<Option<T>, ProtocolError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.attribute(key)
            .map(|raw| self.coerce(key, raw))
            .transpose()
    }

    fn coerce<T>(&self, key: &str, raw: &str) -> Result<T, ProtocolError>
    where
        T: FromStr,
        T::Err: Display,
    {
        raw.parse().map_err(|e: T::Err| ProtocolError::InvalidAttribute {
            tag: self.tag.clone(),
            attribute: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fails with a content error unless this element has tag `tag`.
    pub fn expect_tag(&self, tag: &str) -> Result<(), ProtocolError> {
        if self.tag == tag {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedContent {
                tag: self.tag.clone(),
                detail: format!("expected <{tag}>"),
            })
        }
    }

    /// Returns the first child with the given tag, or a content error.
    pub fn child(&self, tag: &str) -> Result<&Element, ProtocolError> {
        self.children
            .iter()
            .find(|c| c.tag == tag)
            .ok_or_else(|| ProtocolError::UnexpectedContent {
                tag: self.tag.clone(),
                detail: format!("missing <{tag}> child"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_set_replaces_in_place() {
        let mut attrs = Attributes::new();
        attrs.set("a", "1");
        attrs.set("b", "2");
        attrs.set("a", "3");

        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_attributes_remove() {
        let mut attrs = Attributes::new();
        attrs.set("a", "1");
        assert_eq!(attrs.remove("a").as_deref(), Some("1"));
        assert!(attrs.remove("a").is_none());
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_parse_integer_attribute() {
        let el = Element::new("monarchAction").with_attribute("tax", 12);
        let tax: i32 = el.parse("tax").unwrap();
        assert_eq!(tax, 12);
    }

    #[test]
    fn test_parse_missing_attribute_is_content_error() {
        let el = Element::new("monarchAction");
        let err = el.parse::<i32>("tax").unwrap_err();
        assert!(matches!(err, ProtocolError::MissingAttribute { .. }));
        assert!(err.is_content_error());
    }

    #[test]
    fn test_parse_malformed_attribute_is_content_error() {
        let el = Element::new("fountainOfYouth").with_attribute("migrants", "-3");
        let err = el.parse::<u32>("migrants").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidAttribute { ref value, .. } if value == "-3"
        ));
    }

    #[test]
    fn test_parse_optional_absent_and_present() {
        let el = Element::new("firstContact").with_attribute("result", true);
        assert_eq!(el.parse_optional::<bool>("result").unwrap(), Some(true));
        assert_eq!(el.parse_optional::<bool>("tile").unwrap(), None::<bool>);

        let bad = Element::new("firstContact").with_attribute("result", "maybe");
        assert!(bad.parse_optional::<bool>("result").is_err());
    }

    #[test]
    fn test_child_lookup() {
        let el = Element::new("lootCargo")
            .with_child(Element::new("goods").with_attribute("type", "furs"))
            .with_child(Element::new("goods").with_attribute("type", "silver"));

        assert_eq!(el.children().len(), 2);
        assert_eq!(el.child("goods").unwrap().attribute("type"), Some("furs"));
        assert!(el.child("unit").is_err());
    }

    #[test]
    fn test_expect_tag() {
        let el = Element::new("reply");
        assert!(el.expect_tag("reply").is_ok());
        assert!(el.expect_tag("question").is_err());
    }
}
