//! Concrete message kinds.
//!
//! Flat kinds encode through [`AttributeMessage`]; kinds with nested
//! payloads build their element directly. References to objects that
//! must already exist are checked against the game while decoding.

use crate::message::WireMessage;
use crate::{
    AttributeMessage, DiplomaticTrade, Element, Game, GameObject, Goods, Message, MonarchAction,
    NationSummary, NativeTrade, NativeTradeAction, ObjectId, PlayerId, ProtocolError,
};

/// An application-level complaint from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    /// Key of a localized template, if the complaint has one.
    pub message_id: Option<String>,
    /// Plain text fallback.
    pub message: String,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message_id: None,
            message: message.into(),
        }
    }

    pub fn with_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }
}

impl WireMessage for ErrorMessage {
    const TAG: &'static str = "error";

    fn to_element(&self) -> Element {
        AttributeMessage::new(Self::TAG)
            .with_optional("messageId", self.message_id.as_deref())
            .with("message", &self.message)
            .into_element()
    }

    fn from_element(element: &Element, _game: &mut Game) -> Result<Self, ProtocolError> {
        let msg = AttributeMessage::from_element(element, Self::TAG)?;
        Ok(Self {
            message_id: msg.get("messageId").map(str::to_owned),
            message: msg.required("message")?.to_string(),
        })
    }
}

/// Changed game objects pushed to a client.
///
/// Objects the client has not seen before are created as stubs while
/// decoding; the dispatch loop fills them in when it applies the update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Update {
    pub objects: Vec<GameObject>,
    /// Sound cue for the receiving client, if the change has one.
    pub sound: Option<String>,
}

impl WireMessage for Update {
    const TAG: &'static str = "update";

    fn to_element(&self) -> Element {
        let mut element = Element::new(Self::TAG);
        element.set_optional("sound", self.sound.as_deref());
        for object in &self.objects {
            element.push_child(object.to_element());
        }
        element
    }

    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        element.expect_tag(Self::TAG)?;
        let objects = element
            .children()
            .iter()
            .map(|child| {
                let object = GameObject::from_element(child)?;
                game.find_or_stub(object.id(), object.kind());
                Ok(object)
            })
            .collect::<Result<_, ProtocolError>>()?;
        Ok(Self {
            objects,
            sound: element.attribute("sound").map(str::to_owned),
        })
    }
}

/// Several messages delivered as one, handled in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multiple {
    pub messages: Vec<Message>,
}

impl Multiple {
    /// Folds a list into a single message: nothing for an empty list,
    /// the message itself for one, a `Multiple` otherwise.
    pub fn collapse(mut messages: Vec<Message>) -> Option<Message> {
        match messages.len() {
            0 => None,
            1 => messages.pop(),
            _ => Some(Multiple { messages }.into()),
        }
    }
}

impl WireMessage for Multiple {
    const TAG: &'static str = "multiple";

    fn to_element(&self) -> Element {
        let mut element = Element::new(Self::TAG);
        for message in &self.messages {
            element.push_child(message.to_element());
        }
        element
    }

    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        element.expect_tag(Self::TAG)?;
        let messages = element
            .children()
            .iter()
            .map(|child| Message::from_element(child, game))
            .collect::<Result<_, _>>()?;
        Ok(Self { messages })
    }
}

/// A player is done with its turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndTurn;

impl WireMessage for EndTurn {
    const TAG: &'static str = "endTurn";

    fn to_element(&self) -> Element {
        AttributeMessage::new(Self::TAG).into_element()
    }

    fn from_element(element: &Element, _game: &mut Game) -> Result<Self, ProtocolError> {
        AttributeMessage::from_element(element, Self::TAG)?;
        Ok(EndTurn)
    }
}

/// Take one migrant from the docks. Slot 0 lets the server pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emigrate {
    pub slot: u32,
}

impl WireMessage for Emigrate {
    const TAG: &'static str = "emigrate";

    fn to_element(&self) -> Element {
        AttributeMessage::new(Self::TAG)
            .with("slot", self.slot)
            .into_element()
    }

    fn from_element(element: &Element, _game: &mut Game) -> Result<Self, ProtocolError> {
        let msg = AttributeMessage::from_element(element, Self::TAG)?;
        Ok(Self {
            slot: msg.parse("slot")?,
        })
    }
}

/// Offer of founding fathers, answered by naming the chosen one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChooseFoundingFather {
    pub fathers: Vec<String>,
    pub chosen: Option<String>,
}

impl ChooseFoundingFather {
    const FATHER_TAG: &'static str = "foundingFather";

    pub fn offer(fathers: Vec<String>) -> Self {
        Self {
            fathers,
            chosen: None,
        }
    }

    /// Answers the offer. The choice must be one of those offered.
    pub fn choose(mut self, father: impl Into<String>) -> Self {
        self.chosen = Some(father.into());
        self
    }
}

impl WireMessage for ChooseFoundingFather {
    const TAG: &'static str = "chooseFoundingFather";

    fn to_element(&self) -> Element {
        let mut element = Element::new(Self::TAG);
        element.set_optional("chosen", self.chosen.as_deref());
        for father in &self.fathers {
            element.push_child(Element::new(Self::FATHER_TAG).with_attribute("id", father));
        }
        element
    }

    fn from_element(element: &Element, _game: &mut Game) -> Result<Self, ProtocolError> {
        element.expect_tag(Self::TAG)?;
        let fathers = element
            .children()
            .iter()
            .map(|child| {
                if child.tag() != Self::FATHER_TAG {
                    return Err(ProtocolError::UnexpectedContent {
                        tag: Self::TAG.to_string(),
                        detail: format!("expected <{}>, found <{}>", Self::FATHER_TAG, child.tag()),
                    });
                }
                child.required("id").map(str::to_owned)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let chosen = element.attribute("chosen").map(str::to_owned);
        if let Some(chosen) = &chosen {
            if !fathers.contains(chosen) {
                return Err(ProtocolError::InvalidAttribute {
                    tag: Self::TAG.to_string(),
                    attribute: "chosen".to_string(),
                    value: chosen.clone(),
                    reason: "not among the offered fathers".to_string(),
                });
            }
        }
        Ok(Self { fathers, chosen })
    }
}

/// A diplomatic agreement travelling between two parties.
///
/// `our` and `other` are in the sender's sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diplomacy {
    pub our: ObjectId,
    pub other: ObjectId,
    pub agreement: DiplomaticTrade,
}

impl WireMessage for Diplomacy {
    const TAG: &'static str = "diplomacy";

    fn to_element(&self) -> Element {
        Element::new(Self::TAG)
            .with_attribute("our", &self.our)
            .with_attribute("other", &self.other)
            .with_child(self.agreement.to_element())
    }

    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        element.expect_tag(Self::TAG)?;
        let our: ObjectId = element.parse("our")?;
        let other: ObjectId = element.parse("other")?;
        game.require(&our)?;
        game.require(&other)?;
        let agreement = DiplomaticTrade::from_element(element.child(DiplomaticTrade::TAG)?)?;
        Ok(Self {
            our,
            other,
            agreement,
        })
    }
}

/// Two players meet for the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstContact {
    pub player: PlayerId,
    pub other: PlayerId,
    pub tile: Option<ObjectId>,
    /// Whether the contacted party agreed to peace.
    pub result: Option<bool>,
}

impl WireMessage for FirstContact {
    const TAG: &'static str = "firstContact";

    fn to_element(&self) -> Element {
        AttributeMessage::new(Self::TAG)
            .with("player", &self.player)
            .with("other", &self.other)
            .with_optional("tile", self.tile.as_ref())
            .with_optional("result", self.result)
            .into_element()
    }

    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        let msg = AttributeMessage::from_element(element, Self::TAG)?;
        let player: PlayerId = msg.parse("player")?;
        let other: PlayerId = msg.parse("other")?;
        game.require_player(&player)?;
        game.require_player(&other)?;
        // The contact tile may lie outside what the receiver has seen.
        let tile: Option<ObjectId> = msg.parse_optional("tile")?;
        if let Some(tile) = &tile {
            game.find_or_stub(tile, "tile");
        }
        Ok(Self {
            player,
            other,
            tile,
            result: msg.parse_optional("result")?,
        })
    }
}

/// A batch of free migrants is waiting in Europe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FountainOfYouth {
    pub migrants: u32,
}

impl WireMessage for FountainOfYouth {
    const TAG: &'static str = "fountainOfYouth";

    fn to_element(&self) -> Element {
        AttributeMessage::new(Self::TAG)
            .with("migrants", self.migrants)
            .into_element()
    }

    fn from_element(element: &Element, _game: &mut Game) -> Result<Self, ProtocolError> {
        let msg = AttributeMessage::from_element(element, Self::TAG)?;
        Ok(Self {
            migrants: msg.parse("migrants")?,
        })
    }
}

/// A native unit demands tribute from a colony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndianDemand {
    pub unit: ObjectId,
    pub colony: ObjectId,
    /// Demanded goods type; `None` means gold.
    pub goods_type: Option<String>,
    pub amount: u32,
    pub result: Option<bool>,
}

impl WireMessage for IndianDemand {
    const TAG: &'static str = "indianDemand";

    fn to_element(&self) -> Element {
        AttributeMessage::new(Self::TAG)
            .with("unit", &self.unit)
            .with("colony", &self.colony)
            .with_optional("type", self.goods_type.as_deref())
            .with("amount", self.amount)
            .with_optional("result", self.result)
            .into_element()
    }

    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        let msg = AttributeMessage::from_element(element, Self::TAG)?;
        let unit: ObjectId = msg.parse("unit")?;
        let colony: ObjectId = msg.parse("colony")?;
        game.require(&unit)?;
        game.require(&colony)?;
        Ok(Self {
            unit,
            colony,
            goods_type: msg.get("type").map(str::to_owned),
            amount: msg.parse("amount")?,
            result: msg.parse_optional("result")?,
        })
    }
}

/// Cargo left behind by a defeated ship, offered to the winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootCargo {
    pub winner: ObjectId,
    /// The defeated unit. It may no longer exist.
    pub defender: String,
    pub goods: Vec<Goods>,
}

impl WireMessage for LootCargo {
    const TAG: &'static str = "lootCargo";

    fn to_element(&self) -> Element {
        let mut element = Element::new(Self::TAG)
            .with_attribute("winner", &self.winner)
            .with_attribute("defender", &self.defender);
        for goods in &self.goods {
            element.push_child(goods.to_element());
        }
        element
    }

    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        element.expect_tag(Self::TAG)?;
        let winner: ObjectId = element.parse("winner")?;
        game.require(&winner)?;
        let goods = element
            .children()
            .iter()
            .map(Goods::from_element)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            winner,
            defender: element.required("defender")?.to_string(),
            goods,
        })
    }
}

/// The crown acts; some actions need an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonarchActionMessage {
    pub action: MonarchAction,
    pub tax: Option<u32>,
    pub result: Option<bool>,
}

impl WireMessage for MonarchActionMessage {
    const TAG: &'static str = "monarchAction";

    fn to_element(&self) -> Element {
        AttributeMessage::new(Self::TAG)
            .with("action", self.action)
            .with_optional("tax", self.tax)
            .with_optional("result", self.result)
            .into_element()
    }

    fn from_element(element: &Element, _game: &mut Game) -> Result<Self, ProtocolError> {
        let msg = AttributeMessage::from_element(element, Self::TAG)?;
        Ok(Self {
            action: msg.parse("action")?,
            tax: msg.parse_optional("tax")?,
            result: msg.parse_optional("result")?,
        })
    }
}

/// What the receiver now knows about another player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NationSummaryMessage {
    pub player: PlayerId,
    pub summary: NationSummary,
}

impl WireMessage for NationSummaryMessage {
    const TAG: &'static str = "nationSummary";

    fn to_element(&self) -> Element {
        let s = &self.summary;
        AttributeMessage::new(Self::TAG)
            .with("player", &self.player)
            .with_optional("stance", s.stance.as_deref())
            .with_optional("gold", s.gold)
            .with_optional("numberOfSettlements", s.number_of_settlements)
            .with_optional("numberOfUnits", s.number_of_units)
            .with_optional("militaryStrength", s.military_strength)
            .with_optional("navalStrength", s.naval_strength)
            .into_element()
    }

    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        let msg = AttributeMessage::from_element(element, Self::TAG)?;
        let player: PlayerId = msg.parse("player")?;
        game.require_player(&player)?;
        Ok(Self {
            player,
            summary: NationSummary {
                stance: msg.get("stance").map(str::to_owned),
                gold: msg.parse_optional("gold")?,
                number_of_settlements: msg.parse_optional("numberOfSettlements")?,
                number_of_units: msg.parse_optional("numberOfUnits")?,
                military_strength: msg.parse_optional("militaryStrength")?,
                naval_strength: msg.parse_optional("navalStrength")?,
            },
        })
    }
}

/// One step of a trade session at a native settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTradeMessage {
    pub action: NativeTradeAction,
    pub trade: NativeTrade,
}

impl WireMessage for NativeTradeMessage {
    const TAG: &'static str = "nativeTrade";

    fn to_element(&self) -> Element {
        let t = &self.trade;
        let mut element = Element::new(Self::TAG)
            .with_attribute("action", self.action)
            .with_attribute("unit", &t.unit)
            .with_attribute("settlement", &t.settlement)
            .with_attribute("buy", t.buy)
            .with_attribute("sell", t.sell)
            .with_attribute("gift", t.gift);
        element.set_optional("price", t.price);
        if let Some(item) = &t.item {
            element.push_child(item.to_element());
        }
        element
    }

    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        element.expect_tag(Self::TAG)?;
        let unit: ObjectId = element.parse("unit")?;
        let settlement: ObjectId = element.parse("settlement")?;
        game.require(&unit)?;
        game.require(&settlement)?;

        let item = match element.children() {
            [] => None,
            [goods] => Some(Goods::from_element(goods)?),
            _ => {
                return Err(ProtocolError::UnexpectedContent {
                    tag: Self::TAG.to_string(),
                    detail: "more than one trade item".to_string(),
                });
            }
        };

        Ok(Self {
            action: element.parse("action")?,
            trade: NativeTrade {
                unit,
                settlement,
                buy: element.parse("buy")?,
                sell: element.parse("sell")?,
                gift: element.parse("gift")?,
                item,
                price: element.parse_optional("price")?,
            },
        })
    }
}

/// A unit has landed in a new region and the player names it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLandName {
    pub unit: ObjectId,
    pub name: String,
}

impl WireMessage for NewLandName {
    const TAG: &'static str = "newLandName";

    fn to_element(&self) -> Element {
        AttributeMessage::new(Self::TAG)
            .with("unit", &self.unit)
            .with("newLandName", &self.name)
            .into_element()
    }

    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        let msg = AttributeMessage::from_element(element, Self::TAG)?;
        let unit: ObjectId = msg.parse("unit")?;
        game.require(&unit)?;
        Ok(Self {
            unit,
            name: msg.required("newLandName")?.to_string(),
        })
    }
}
