//! The game context messages are decoded against.
//!
//! The real game model lives outside this crate. Here a game is a flat
//! table of opaque objects keyed by id, which is all decoding needs:
//! references to objects that must already exist are checked, and
//! objects a message introduces are created as stubs.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use crate::{Attributes, Element, ObjectId, PlayerId, ProtocolError};

/// Kind name used for player objects.
pub const PLAYER_KIND: &str = "player";

/// One object of the game graph, held as opaque attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameObject {
    id: ObjectId,
    kind: String,
    attributes: Attributes,
    stub: bool,
}

impl GameObject {
    pub fn new(id: impl Into<ObjectId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            attributes: Attributes::new(),
            stub: false,
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        self.attributes.set(key, value.to_string());
        self
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    /// `true` until the object has been filled in by an update.
    pub fn is_stub(&self) -> bool {
        self.stub
    }

    /// Encodes as `<kind id=".." ...attributes/>`.
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(&self.kind).with_attribute("id", &self.id);
        for (key, value) in self.attributes.iter() {
            element.set_attribute(key, value);
        }
        element
    }

    /// Reads a required attribute as `T`. Missing or malformed values
    /// are content errors naming this object's kind.
    pub fn parse<T>(&self, key: &str) -> Result<T, ProtocolError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self
            .attribute(key)
            .ok_or_else(|| ProtocolError::MissingAttribute {
                tag: self.kind.clone(),
                attribute: key.to_string(),
            })?;
        raw.parse().map_err(|e: T::Err| ProtocolError::InvalidAttribute {
            tag: self.kind.clone(),
            attribute: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// Objects are flat; a nested element is a content error.
    pub fn from_element(element: &Element) -> Result<Self, ProtocolError> {
        if let Some(child) = element.children().first() {
            return Err(ProtocolError::UnexpectedContent {
                tag: element.tag().to_string(),
                detail: format!("game object has child <{}>", child.tag()),
            });
        }
        let id: ObjectId = element.parse("id")?;
        let mut attributes = element.attributes().clone();
        attributes.remove("id");
        Ok(Self {
            id,
            kind: element.tag().to_string(),
            attributes,
            stub: false,
        })
    }
}

/// Object table for one game.
#[derive(Debug, Default)]
pub struct Game {
    objects: HashMap<ObjectId, GameObject>,
}

/// A game shared between the dispatch loop and the actors that read it.
pub type SharedGame = Arc<RwLock<Game>>;

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedGame {
        Arc::new(RwLock::new(self))
    }

    pub fn insert(&mut self, object: GameObject) {
        self.objects.insert(object.id.clone(), object);
    }

    /// Adds a player object.
    pub fn add_player(&mut self, id: &PlayerId) {
        self.insert(GameObject::new(id.object_id(), PLAYER_KIND));
    }

    pub fn get(&self, id: &ObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&GameObject> {
        self.get(&id.object_id())
            .filter(|object| object.kind == PLAYER_KIND)
    }

    pub fn remove(&mut self, id: &ObjectId) -> Option<GameObject> {
        self.objects.remove(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Looks up an object that must already exist.
    pub fn require(&self, id: &ObjectId) -> Result<&GameObject, ProtocolError> {
        self.get(id)
            .ok_or_else(|| ProtocolError::UnknownObject(id.to_string()))
    }

    /// Looks up a player that must already exist.
    pub fn require_player(&self, id: &PlayerId) -> Result<&GameObject, ProtocolError> {
        self.player(id)
            .ok_or_else(|| ProtocolError::UnknownObject(id.to_string()))
    }

    /// Returns the object with `id`, creating an empty stub of `kind`
    /// when it is not known yet.
    pub fn find_or_stub(&mut self, id: &ObjectId, kind: &str) -> &GameObject {
        self.objects.entry(id.clone()).or_insert_with(|| GameObject {
            id: id.clone(),
            kind: kind.to_string(),
            attributes: Attributes::new(),
            stub: true,
        })
    }

    /// Merges an updated object into the table. Attributes of the
    /// update overwrite existing ones; the object stops being a stub.
    pub fn apply(&mut self, update: &GameObject) {
        let object = self
            .objects
            .entry(update.id.clone())
            .or_insert_with(|| GameObject::new(update.id.clone(), update.kind.clone()));
        object.kind = update.kind.clone();
        for (key, value) in update.attributes.iter() {
            object.attributes.set(key, value);
        }
        object.stub = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_unknown_object_is_content_error() {
        let game = Game::new();
        let err = game.require(&"unit:9".into()).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownObject(ref id) if id == "unit:9"));
        assert!(err.is_content_error());
    }

    #[test]
    fn test_require_player_checks_kind() {
        let mut game = Game::new();
        game.insert(GameObject::new("player:1", "unit"));
        assert!(game.require_player(&"player:1".into()).is_err());

        game.add_player(&"player:1".into());
        assert!(game.require_player(&"player:1".into()).is_ok());
    }

    #[test]
    fn test_parse_reads_typed_attribute() {
        let unit = GameObject::new("unit:1", "unit").with_attribute("spaceLeft", 3);
        assert_eq!(unit.parse::<u32>("spaceLeft").unwrap(), 3);
    }

    #[test]
    fn test_parse_malformed_or_missing_is_content_error() {
        let unit = GameObject::new("unit:1", "unit").with_attribute("spaceLeft", "two");
        let err = unit.parse::<u32>("spaceLeft").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidAttribute { ref tag, ref value, .. } if tag == "unit" && value == "two"
        ));
        assert!(err.is_content_error());

        let err = unit.parse::<u32>("hitPoints").unwrap_err();
        assert!(matches!(err, ProtocolError::MissingAttribute { .. }));
    }

    #[test]
    fn test_object_from_element_rejects_children() {
        let element = Element::new("colony")
            .with_attribute("id", "colony:1")
            .with_child(Element::new("building"));
        let err = GameObject::from_element(&element).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedContent { ref tag, .. } if tag == "colony"));
    }

    #[test]
    fn test_find_or_stub_creates_once() {
        let mut game = Game::new();
        let id = ObjectId::new("colony:4");
        assert!(game.find_or_stub(&id, "colony").is_stub());
        assert_eq!(game.len(), 1);

        game.find_or_stub(&id, "colony");
        assert_eq!(game.len(), 1);
    }

    #[test]
    fn test_apply_fills_stub_and_merges() {
        let mut game = Game::new();
        let id = ObjectId::new("unit:3");
        game.find_or_stub(&id, "unit");

        game.apply(&GameObject::new("unit:3", "unit").with_attribute("spaceLeft", 2));
        game.apply(&GameObject::new("unit:3", "unit").with_attribute("owner", "player:1"));

        let unit = game.get(&id).unwrap();
        assert!(!unit.is_stub());
        assert_eq!(unit.attribute("spaceLeft"), Some("2"));
        assert_eq!(unit.attribute("owner"), Some("player:1"));
    }

    #[test]
    fn test_object_element_round_trip() {
        let object = GameObject::new("unit:3", "unit").with_attribute("spaceLeft", 2);
        let element = object.to_element();
        assert_eq!(element.tag(), "unit");
        assert_eq!(element.attribute("id"), Some("unit:3"));
        assert_eq!(GameObject::from_element(&element).unwrap(), object);
    }

    #[test]
    fn test_object_from_element_requires_id() {
        let err = GameObject::from_element(&Element::new("unit")).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingAttribute { .. }));
    }
}
