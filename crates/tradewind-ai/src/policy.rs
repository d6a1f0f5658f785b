//! The decision seam.
//!
//! An [`AiPolicy`] answers every question an autonomous player is
//! asked. It sees a read-only snapshot of the game and the player's own
//! generator through a [`DecisionContext`]; it never mutates the game
//! and never talks to the server. Its answers become messages the
//! player sends.
//!
//! Only [`start_working`](AiPolicy::start_working) and
//! [`handle_trade`](AiPolicy::handle_trade) must be provided. Every
//! other decision defaults to declining.

use rand::Rng;
use tradewind_protocol::{
    DiplomaticTrade, Game, GameObject, IndianDemand, Message, NativeTrade, NativeTradeAction,
    PlayerId, TradeStatus,
};

use crate::AiRng;

/// What a policy may look at while deciding.
pub struct DecisionContext<'a> {
    pub player: &'a PlayerId,
    pub game: &'a Game,
    pub rng: &'a mut AiRng,
}

impl DecisionContext<'_> {
    /// The deciding player's own game object.
    pub fn player_object(&self) -> Option<&GameObject> {
        self.game.player(self.player)
    }

    /// Reads an integer attribute of the deciding player.
    pub fn player_number(&self, key: &str) -> Option<i64> {
        self.player_object()?.attribute(key)?.parse().ok()
    }

    /// `true` with probability `p`, clamped to `[0, 1]`. A non-finite
    /// `p` never succeeds.
    pub fn chance(&mut self, p: f64) -> bool {
        let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        self.rng.random_bool(p)
    }
}

/// A strategy for an autonomous player.
#[allow(unused_variables)]
pub trait AiPolicy: Send + Sync + 'static {
    /// Requests to issue at the start of this player's turn, in order.
    fn start_working(&self, ctx: &mut DecisionContext<'_>) -> Vec<Message>;

    /// Answer to a native demand. `None` sends no answer at all.
    fn indian_demand(&self, ctx: &mut DecisionContext<'_>, demand: &IndianDemand) -> Option<bool> {
        Some(false)
    }

    /// Response to a proposed diplomatic agreement.
    fn accept_diplomatic_trade(
        &self,
        ctx: &mut DecisionContext<'_>,
        agreement: &DiplomaticTrade,
    ) -> TradeStatus {
        TradeStatus::Reject
    }

    /// Next step of a native trade session.
    fn handle_trade(
        &self,
        ctx: &mut DecisionContext<'_>,
        action: NativeTradeAction,
        trade: &NativeTrade,
    ) -> NativeTradeAction;

    /// Whether to accept a tax raise to `tax` percent.
    fn accept_tax(&self, ctx: &mut DecisionContext<'_>, tax: u32) -> bool {
        false
    }

    fn accept_mercenaries(&self, ctx: &mut DecisionContext<'_>) -> bool {
        false
    }

    /// Pick one of the offered founding fathers. `None` sends nothing.
    fn select_founding_father(
        &self,
        ctx: &mut DecisionContext<'_>,
        fathers: &[String],
    ) -> Option<String> {
        None
    }
}
