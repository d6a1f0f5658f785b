//! Saved state of an autonomous player.
//!
//! In a save document a player appears as
//! `<aiPlayer id="player:1" randomState="…"/>`. The random state is
//! optional; without it the generator is re-derived from the seed.

use serde::{Deserialize, Serialize};
use tradewind_protocol::{Element, PlayerId, ProtocolError};

use crate::AiRng;

/// What is saved for one autonomous player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiPlayerState {
    pub player_id: PlayerId,
    /// Generator state as produced by [`AiRng`]'s `Display`.
    pub random_state: Option<String>,
}

impl AiPlayerState {
    pub const TAG: &'static str = "aiPlayer";
    const ID: &'static str = "id";
    const RANDOM_STATE: &'static str = "randomState";

    pub fn to_element(&self) -> Element {
        let mut element = Element::new(Self::TAG).with_attribute(Self::ID, &self.player_id);
        element.set_optional(Self::RANDOM_STATE, self.random_state.as_deref());
        element
    }

    /// Reads the element form. A malformed random state is rejected here
    /// rather than at restore time.
    pub fn from_element(element: &Element) -> Result<Self, ProtocolError> {
        element.expect_tag(Self::TAG)?;
        element.parse_optional::<AiRng>(Self::RANDOM_STATE)?;
        Ok(Self {
            player_id: element.parse(Self::ID)?,
            random_state: element.attribute(Self::RANDOM_STATE).map(str::to_owned),
        })
    }

    /// The saved generator, if there is one.
    ///
    /// # Errors
    /// A content error when the saved state does not parse.
    pub fn rng(&self) -> Result<Option<AiRng>, ProtocolError> {
        self.random_state
            .as_deref()
            .map(|raw| {
                raw.parse().map_err(|e: crate::rng::RandomStateError| {
                    ProtocolError::InvalidAttribute {
                        tag: Self::TAG.to_string(),
                        attribute: Self::RANDOM_STATE.to_string(),
                        value: raw.to_string(),
                        reason: e.to_string(),
                    }
                })
            })
            .transpose()
    }
}
