//! Receiving-side dispatch over [`Message`].
//!
//! Both sides dispatch by `match` on the variant. The server side works
//! on a [`SourcedMessage`], a message bound to the player it came from,
//! and produces a [`ChangeSet`]. The client side hands each payload to
//! a [`ClientHandler`] method. Wrappers delegate to their payload on
//! both sides; an empty wrapper does nothing.

use std::sync::Arc;

use tracing::debug;

use crate::catalogue::{
    ChooseFoundingFather, Diplomacy, Emigrate, EndTurn, ErrorMessage, FirstContact,
    FountainOfYouth, IndianDemand, LootCargo, MonarchActionMessage, NationSummaryMessage,
    NativeTradeMessage, NewLandName, Update,
};
use crate::{ChangeSet, Message, PlayerId};

/// A message together with the player that sent it.
///
/// The source is attached once, when the message is about to be
/// handled, and is carried into a wrapper's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedMessage {
    source: PlayerId,
    message: Message,
}

impl Message {
    /// Binds the message to the player it came from.
    pub fn with_source(self, source: PlayerId) -> SourcedMessage {
        SourcedMessage {
            source,
            message: self,
        }
    }

    /// Hands the message to the matching [`ClientHandler`] method.
    ///
    /// Returns `false` when nothing was handled: an empty wrapper, or a
    /// kind that only a server receives.
    pub fn client_handler<H: ClientHandler + ?Sized>(self, handler: &H) -> bool {
        match self {
            Message::Question(wrapper) | Message::Reply(wrapper) => wrapper
                .into_message()
                .is_some_and(|inner| inner.client_handler(handler)),
            Message::Multiple(multiple) => multiple
                .messages
                .into_iter()
                .fold(false, |handled, m| m.client_handler(handler) | handled),
            Message::Error(m) => {
                handler.error(m);
                true
            }
            Message::Update(m) => {
                handler.update(m);
                true
            }
            Message::ChooseFoundingFather(m) => {
                handler.choose_founding_father(m);
                true
            }
            Message::Diplomacy(m) => {
                handler.diplomacy(m);
                true
            }
            Message::FirstContact(m) => {
                handler.first_contact(m);
                true
            }
            Message::FountainOfYouth(m) => {
                handler.fountain_of_youth(m);
                true
            }
            Message::IndianDemand(m) => {
                handler.indian_demand(m);
                true
            }
            Message::LootCargo(m) => {
                handler.loot_cargo(m);
                true
            }
            Message::MonarchAction(m) => {
                handler.monarch_action(m);
                true
            }
            Message::NationSummary(m) => {
                handler.nation_summary(m);
                true
            }
            Message::NativeTrade(m) => {
                handler.native_trade(m);
                true
            }
            Message::NewLandName(m) => {
                handler.new_land_name(m);
                true
            }
            message @ (Message::EndTurn(_) | Message::Emigrate(_)) => {
                debug!(tag = message.tag(), "ignoring server-bound message on client");
                false
            }
        }
    }
}

impl SourcedMessage {
    pub fn source(&self) -> &PlayerId {
        &self.source
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn into_parts(self) -> (PlayerId, Message) {
        (self.source, self.message)
    }

    /// Handles the message on the server.
    ///
    /// Returns `None` for an empty wrapper. Kinds a client never sends
    /// are answered with a complaint to the source.
    pub fn server_handler<H: ServerHandler + ?Sized>(self, handler: &mut H) -> Option<ChangeSet> {
        let SourcedMessage { source, message } = self;
        let changes = match message {
            Message::Question(wrapper) | Message::Reply(wrapper) => {
                return wrapper
                    .into_message()
                    .and_then(|inner| inner.with_source(source).server_handler(handler));
            }
            Message::Multiple(multiple) => {
                let mut changes = ChangeSet::new();
                for inner in multiple.messages {
                    if let Some(more) = inner.with_source(source.clone()).server_handler(handler) {
                        changes.extend(more);
                    }
                }
                changes
            }
            Message::EndTurn(m) => handler.end_turn(&source, m),
            Message::Emigrate(m) => handler.emigrate(&source, m),
            Message::ChooseFoundingFather(m) => handler.choose_founding_father(&source, m),
            Message::Diplomacy(m) => handler.diplomacy(&source, m),
            Message::FirstContact(m) => handler.first_contact(&source, m),
            Message::IndianDemand(m) => handler.indian_demand(&source, m),
            Message::LootCargo(m) => handler.loot_cargo(&source, m),
            Message::MonarchAction(m) => handler.monarch_action(&source, m),
            Message::NativeTrade(m) => handler.native_trade(&source, m),
            Message::NewLandName(m) => handler.new_land_name(&source, m),
            message @ (Message::Error(_)
            | Message::Update(_)
            | Message::FountainOfYouth(_)
            | Message::NationSummary(_)) => {
                debug!(%source, tag = message.tag(), "client sent a server-only message");
                ChangeSet::complaint(&source, format!("<{}> is not a request", message.tag()))
            }
        };
        Some(changes)
    }
}

/// Server-side handling of client requests.
///
/// Each method receives the requesting player and returns the changes
/// to distribute. Unhandled kinds produce no changes.
#[allow(unused_variables)]
pub trait ServerHandler {
    fn end_turn(&mut self, source: &PlayerId, message: EndTurn) -> ChangeSet {
        ChangeSet::new()
    }

    fn emigrate(&mut self, source: &PlayerId, message: Emigrate) -> ChangeSet {
        ChangeSet::new()
    }

    fn choose_founding_father(
        &mut self,
        source: &PlayerId,
        message: ChooseFoundingFather,
    ) -> ChangeSet {
        ChangeSet::new()
    }

    fn diplomacy(&mut self, source: &PlayerId, message: Diplomacy) -> ChangeSet {
        ChangeSet::new()
    }

    fn first_contact(&mut self, source: &PlayerId, message: FirstContact) -> ChangeSet {
        ChangeSet::new()
    }

    fn indian_demand(&mut self, source: &PlayerId, message: IndianDemand) -> ChangeSet {
        ChangeSet::new()
    }

    fn loot_cargo(&mut self, source: &PlayerId, message: LootCargo) -> ChangeSet {
        ChangeSet::new()
    }

    fn monarch_action(&mut self, source: &PlayerId, message: MonarchActionMessage) -> ChangeSet {
        ChangeSet::new()
    }

    fn native_trade(&mut self, source: &PlayerId, message: NativeTradeMessage) -> ChangeSet {
        ChangeSet::new()
    }

    fn new_land_name(&mut self, source: &PlayerId, message: NewLandName) -> ChangeSet {
        ChangeSet::new()
    }
}

/// Client-side reaction to server pushes. Every method defaults to
/// doing nothing.
#[allow(unused_variables)]
pub trait ClientHandler: Send + Sync {
    fn error(&self, message: ErrorMessage) {}

    fn update(&self, message: Update) {}

    fn choose_founding_father(&self, message: ChooseFoundingFather) {}

    fn diplomacy(&self, message: Diplomacy) {}

    fn first_contact(&self, message: FirstContact) {}

    fn fountain_of_youth(&self, message: FountainOfYouth) {}

    fn indian_demand(&self, message: IndianDemand) {}

    fn loot_cargo(&self, message: LootCargo) {}

    fn monarch_action(&self, message: MonarchActionMessage) {}

    fn nation_summary(&self, message: NationSummaryMessage) {}

    fn native_trade(&self, message: NativeTradeMessage) {}

    fn new_land_name(&self, message: NewLandName) {}
}

macro_rules! forward_client_handler {
    ($($method:ident($ty:ty)),+ $(,)?) => {
        impl<T: ClientHandler + ?Sized> ClientHandler for Arc<T> {
            $(
                fn $method(&self, message: $ty) {
                    (**self).$method(message)
                }
            )+
        }
    };
}

forward_client_handler! {
    error(ErrorMessage),
    update(Update),
    choose_founding_father(ChooseFoundingFather),
    diplomacy(Diplomacy),
    first_contact(FirstContact),
    fountain_of_youth(FountainOfYouth),
    indian_demand(IndianDemand),
    loot_cargo(LootCargo),
    monarch_action(MonarchActionMessage),
    nation_summary(NationSummaryMessage),
    native_trade(NativeTradeMessage),
    new_land_name(NewLandName),
}
