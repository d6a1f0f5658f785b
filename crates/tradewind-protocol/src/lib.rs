//! # tradewind-protocol
//!
//! Message definitions and the wire codec.
//!
//! A [`Message`] is a closed set of variants, one per tag. Each encodes
//! to an [`Element`] tree, which the [`XmlCodec`] writes as text.
//! Requests that expect an answer travel inside a [`WrapperMessage`]
//! (`question` / `reply`) whose `networkReplyId` lets the sender match
//! the answer to the request.
//!
//! ## Key types
//!
//! - [`Message`] and [`WireMessage`]: the variants and their encoding
//! - [`AttributeMessage`]: the flat, attribute-only message shape
//! - [`WrapperMessage`]: reply correlation
//! - [`Game`]: the context references are resolved against
//! - [`ChangeSet`], [`ServerHandler`], [`ClientHandler`]: receiving-side dispatch

mod attribute;
pub mod catalogue;
mod change;
mod codec;
mod element;
mod error;
mod game;
mod handler;
mod message;
mod types;
mod wrapper;
pub mod xml;

pub use attribute::AttributeMessage;
pub use catalogue::{
    ChooseFoundingFather, Diplomacy, Emigrate, EndTurn, ErrorMessage, FirstContact,
    FountainOfYouth, IndianDemand, LootCargo, MonarchActionMessage, Multiple,
    NationSummaryMessage, NativeTradeMessage, NewLandName, Update,
};
pub use change::{ChangeSet, Recipient};
pub use codec::{Codec, XmlCodec};
pub use element::{Attributes, Element};
pub use error::ProtocolError;
pub use game::{Game, GameObject, PLAYER_KIND, SharedGame};
pub use handler::{ClientHandler, ServerHandler, SourcedMessage};
pub use message::{Message, QUESTION_TAG, REPLY_TAG, WireMessage, is_known_tag};
pub use types::{
    DiplomaticTrade, Goods, MonarchAction, NationSummary, NativeTrade, NativeTradeAction,
    ObjectId, PlayerId, ReplyId, TradeStatus, UnknownSymbol,
};
pub use wrapper::{REPLY_ID_ATTRIBUTE, WrapperMessage};
