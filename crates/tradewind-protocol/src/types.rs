//! Identifiers and the small typed vocabulary messages carry.
//!
//! Game rules are opaque to the protocol. Only the values a decision
//! policy has to reason about get a real type here; everything else
//! travels as [`Element`]s.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Element, ProtocolError};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }
    };
}

id_type! {
    /// Identifier of any object in the game context.
    ObjectId
}

id_type! {
    /// Identifier of a player. Players are game objects too; see
    /// [`PlayerId::object_id`].
    PlayerId
}

impl PlayerId {
    pub fn object_id(&self) -> ObjectId {
        ObjectId(self.0.clone())
    }
}

/// Correlates a wrapped request with its reply.
///
/// Unique among the issuing side's *outstanding* requests only; an id
/// may be handed out again once its request has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyId(u32);

impl ReplyId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ReplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReplyId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A symbol that is not part of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {value:?}")]
pub struct UnknownSymbol {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! symbol_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownSymbol;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownSymbol {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

symbol_enum! {
    /// State of a diplomatic agreement.
    TradeStatus {
        Propose => "PROPOSE_TRADE",
        Accept => "ACCEPT_TRADE",
        Reject => "REJECT_TRADE",
    }
}

symbol_enum! {
    /// Something the crown does to a colonial player.
    MonarchAction {
        RaiseTaxAct => "RAISE_TAX_ACT",
        RaiseTaxWar => "RAISE_TAX_WAR",
        ForceTax => "FORCE_TAX",
        LowerTaxWar => "LOWER_TAX_WAR",
        LowerTaxOther => "LOWER_TAX_OTHER",
        WaiveTax => "WAIVE_TAX",
        AddToRef => "ADD_TO_REF",
        DeclarePeace => "DECLARE_PEACE",
        DeclareWar => "DECLARE_WAR",
        SupportSea => "SUPPORT_SEA",
        SupportLand => "SUPPORT_LAND",
        MonarchMercenaries => "MONARCH_MERCENARIES",
        HessianMercenaries => "HESSIAN_MERCENARIES",
        Displeasure => "DISPLEASURE",
    }
}

impl MonarchAction {
    /// Tax raises the player may accept or refuse.
    pub fn is_tax_raise(self) -> bool {
        matches!(self, Self::RaiseTaxAct | Self::RaiseTaxWar)
    }

    /// Mercenary offers the player may accept or refuse.
    pub fn is_mercenary_offer(self) -> bool {
        matches!(self, Self::MonarchMercenaries | Self::HessianMercenaries)
    }
}

symbol_enum! {
    /// Step of a trade session between a unit and a native settlement.
    NativeTradeAction {
        Open => "OPEN",
        Close => "CLOSE",
        Buy => "BUY",
        Sell => "SELL",
        Gift => "GIFT",
        AckOpen => "ACK_OPEN",
        AckBuy => "ACK_BUY",
        AckSell => "ACK_SELL",
        AckGift => "ACK_GIFT",
        NakGoods => "NAK_GOODS",
        NakHaggle => "NAK_HAGGLE",
        NakHostile => "NAK_HOSTILE",
        NakNosale => "NAK_NOSALE",
        NakInvalid => "NAK_INVALID",
    }
}

/// A quantity of one goods type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goods {
    pub goods_type: String,
    pub amount: u32,
}

impl Goods {
    pub const TAG: &'static str = "goods";

    /// Cargo slots occupied: one per started hundred, never less than one.
    pub fn space_taken(&self) -> u32 {
        self.amount.div_ceil(100).max(1)
    }

    pub fn to_element(&self) -> Element {
        Element::new(Self::TAG)
            .with_attribute("type", &self.goods_type)
            .with_attribute("amount", self.amount)
    }

    pub fn from_element(element: &Element) -> Result<Self, ProtocolError> {
        element.expect_tag(Self::TAG)?;
        Ok(Self {
            goods_type: element.required("type")?.to_string(),
            amount: element.parse("amount")?,
        })
    }
}

/// A diplomatic agreement under negotiation.
///
/// Trade items are opaque game data and stay as elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiplomaticTrade {
    pub status: TradeStatus,
    pub sender: PlayerId,
    pub recipient: PlayerId,
    pub items: Vec<Element>,
}

impl DiplomaticTrade {
    pub const TAG: &'static str = "diplomaticTrade";

    pub fn to_element(&self) -> Element {
        let mut element = Element::new(Self::TAG)
            .with_attribute("status", self.status)
            .with_attribute("sender", &self.sender)
            .with_attribute("recipient", &self.recipient);
        for item in &self.items {
            element.push_child(item.clone());
        }
        element
    }

    pub fn from_element(element: &Element) -> Result<Self, ProtocolError> {
        element.expect_tag(Self::TAG)?;
        Ok(Self {
            status: element.parse("status")?,
            sender: element.parse("sender")?,
            recipient: element.parse("recipient")?,
            items: element.children().to_vec(),
        })
    }

    /// Returns `true` when every item is a peace treaty.
    pub fn is_peace_treaty(&self) -> bool {
        !self.items.is_empty()
            && self.items.iter().all(|item| {
                item.tag() == "stanceTradeItem" && item.attribute("stance") == Some("PEACE")
            })
    }
}

/// The state of a trade session with a native settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTrade {
    pub unit: ObjectId,
    pub settlement: ObjectId,
    pub buy: bool,
    pub sell: bool,
    pub gift: bool,
    pub item: Option<Goods>,
    pub price: Option<i32>,
}

impl NativeTrade {
    pub fn new(unit: ObjectId, settlement: ObjectId) -> Self {
        Self {
            unit,
            settlement,
            buy: true,
            sell: true,
            gift: true,
            item: None,
            price: None,
        }
    }

    /// Returns `true` once no further action is possible.
    pub fn is_exhausted(&self) -> bool {
        !self.buy && !self.sell && !self.gift
    }
}

/// What one player knows about another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationSummary {
    pub stance: Option<String>,
    pub gold: Option<i32>,
    pub number_of_settlements: Option<u32>,
    pub number_of_units: Option<u32>,
    pub military_strength: Option<u32>,
    pub naval_strength: Option<u32>,
}
