//! The [`Message`] sum type and the tag registry that decodes it.
//!
//! Every concrete message is a struct implementing [`WireMessage`], and
//! every struct is one variant of [`Message`]. A tag fully determines
//! the variant: decoding looks the root tag up in a static table and
//! hands the element to that variant's decoder. An unknown tag is a
//! content error.
//!
//! Adding a message kind means adding the struct, its variant, and one
//! row in `DECODERS`.

use tracing::trace;

use crate::catalogue::{
    ChooseFoundingFather, Diplomacy, Emigrate, EndTurn, ErrorMessage, FirstContact,
    FountainOfYouth, IndianDemand, LootCargo, MonarchActionMessage, Multiple,
    NationSummaryMessage, NativeTradeMessage, NewLandName, Update,
};
use crate::{Element, Game, ProtocolError, ReplyId, WrapperMessage};

/// A message kind with a fixed tag and an element encoding.
pub trait WireMessage: Sized + Into<Message> {
    /// The tag that identifies this kind on the wire.
    const TAG: &'static str;

    /// Encodes the message as an element tagged [`TAG`](Self::TAG).
    fn to_element(&self) -> Element;

    /// Decodes the message, resolving references against `game`.
    ///
    /// # Errors
    /// Content errors for missing or malformed attributes, unexpected
    /// children, and references to objects that must exist but do not.
    fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError>;
}

/// Every message the protocol can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A request that expects a reply with the same id.
    Question(WrapperMessage),
    /// The answer to a question.
    Reply(WrapperMessage),
    Error(ErrorMessage),
    Update(Update),
    Multiple(Multiple),
    EndTurn(EndTurn),
    Emigrate(Emigrate),
    ChooseFoundingFather(ChooseFoundingFather),
    Diplomacy(Diplomacy),
    FirstContact(FirstContact),
    FountainOfYouth(FountainOfYouth),
    IndianDemand(IndianDemand),
    LootCargo(LootCargo),
    MonarchAction(MonarchActionMessage),
    NationSummary(NationSummaryMessage),
    NativeTrade(NativeTradeMessage),
    NewLandName(NewLandName),
}

pub const QUESTION_TAG: &str = "question";
pub const REPLY_TAG: &str = "reply";

macro_rules! message_variants {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Message {
                fn from(message: $ty) -> Self {
                    Message::$variant(message)
                }
            }
        )+

        impl Message {
            /// The wire tag of this message.
            pub fn tag(&self) -> &'static str {
                match self {
                    Message::Question(_) => QUESTION_TAG,
                    Message::Reply(_) => REPLY_TAG,
                    $(Message::$variant(_) => <$ty as WireMessage>::TAG,)+
                }
            }

            /// Encodes the message as an element tree.
            pub fn to_element(&self) -> Element {
                match self {
                    Message::Question(wrapper) => wrapper.to_element(QUESTION_TAG),
                    Message::Reply(wrapper) => wrapper.to_element(REPLY_TAG),
                    $(Message::$variant(message) => message.to_element(),)+
                }
            }
        }
    };
}

message_variants! {
    Error(ErrorMessage),
    Update(Update),
    Multiple(Multiple),
    EndTurn(EndTurn),
    Emigrate(Emigrate),
    ChooseFoundingFather(ChooseFoundingFather),
    Diplomacy(Diplomacy),
    FirstContact(FirstContact),
    FountainOfYouth(FountainOfYouth),
    IndianDemand(IndianDemand),
    LootCargo(LootCargo),
    MonarchAction(MonarchActionMessage),
    NationSummary(NationSummaryMessage),
    NativeTrade(NativeTradeMessage),
    NewLandName(NewLandName),
}

type Decoder = fn(&Element, &mut Game) -> Result<Message, ProtocolError>;

fn decode_as<M: WireMessage>(element: &Element, game: &mut Game) -> Result<Message, ProtocolError> {
    M::from_element(element, game).map(Into::into)
}

fn decode_question(element: &Element, game: &mut Game) -> Result<Message, ProtocolError> {
    WrapperMessage::from_element(element, game).map(Message::Question)
}

fn decode_reply(element: &Element, game: &mut Game) -> Result<Message, ProtocolError> {
    WrapperMessage::from_element(element, game).map(Message::Reply)
}

static DECODERS: &[(&str, Decoder)] = &[
    (QUESTION_TAG, decode_question),
    (REPLY_TAG, decode_reply),
    (ErrorMessage::TAG, decode_as::<ErrorMessage>),
    (Update::TAG, decode_as::<Update>),
    (Multiple::TAG, decode_as::<Multiple>),
    (EndTurn::TAG, decode_as::<EndTurn>),
    (Emigrate::TAG, decode_as::<Emigrate>),
    (ChooseFoundingFather::TAG, decode_as::<ChooseFoundingFather>),
    (Diplomacy::TAG, decode_as::<Diplomacy>),
    (FirstContact::TAG, decode_as::<FirstContact>),
    (FountainOfYouth::TAG, decode_as::<FountainOfYouth>),
    (IndianDemand::TAG, decode_as::<IndianDemand>),
    (LootCargo::TAG, decode_as::<LootCargo>),
    (MonarchActionMessage::TAG, decode_as::<MonarchActionMessage>),
    (NationSummaryMessage::TAG, decode_as::<NationSummaryMessage>),
    (NativeTradeMessage::TAG, decode_as::<NativeTradeMessage>),
    (NewLandName::TAG, decode_as::<NewLandName>),
];

/// Returns `true` if a decoder is registered for `tag`.
pub fn is_known_tag(tag: &str) -> bool {
    DECODERS.iter().any(|(known, _)| *known == tag)
}

impl Message {
    /// Decodes an element tree into the variant registered for its tag.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownTag`] when no variant owns the tag, or
    /// whatever the variant's decoder reports.
    pub fn from_element(element: &Element, game: &mut Game) -> Result<Self, ProtocolError> {
        let (_, decode) = DECODERS
            .iter()
            .find(|(tag, _)| *tag == element.tag())
            .ok_or_else(|| ProtocolError::UnknownTag(element.tag().to_string()))?;
        trace!(tag = element.tag(), "decoding message");
        decode(element, game)
    }

    /// Wraps `message` as a question awaiting reply `id`.
    pub fn question(id: ReplyId, message: impl Into<Message>) -> Self {
        Message::Question(WrapperMessage::new(id, Some(message.into())))
    }

    /// Builds a reply to question `id`, empty when `message` is `None`.
    pub fn reply(id: ReplyId, message: Option<Message>) -> Self {
        Message::Reply(WrapperMessage::new(id, message))
    }

    /// The sound cue attached to this message, looking inside a
    /// `multiple` for the first one present.
    pub fn sound(&self) -> Option<&str> {
        match self {
            Message::Update(update) => update.sound.as_deref(),
            Message::Multiple(multiple) => multiple.messages.iter().find_map(|m| m.sound()),
            _ => None,
        }
    }

    /// Returns `true` for the two wrapper variants.
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Message::Question(_) | Message::Reply(_))
    }
}
