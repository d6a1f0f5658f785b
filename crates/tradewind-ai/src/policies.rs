//! Concrete strategies.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use tradewind_api::UserInterface;
use tradewind_protocol::{
    DiplomaticTrade, Emigrate, EndTurn, IndianDemand, Message, NativeTrade, NativeTradeAction,
    TradeStatus,
};
use tracing::debug;

use crate::{AiPolicy, DecisionContext, EuropeanPolicyConfig};

/// Declines everything and ends its turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservativePolicy;

impl AiPolicy for ConservativePolicy {
    fn start_working(&self, _ctx: &mut DecisionContext<'_>) -> Vec<Message> {
        vec![EndTurn.into()]
    }

    fn handle_trade(
        &self,
        _ctx: &mut DecisionContext<'_>,
        _action: NativeTradeAction,
        _trade: &NativeTrade,
    ) -> NativeTradeAction {
        NativeTradeAction::Close
    }
}

/// The standard colonial player.
#[derive(Debug, Clone, Default)]
pub struct EuropeanPolicy {
    config: EuropeanPolicyConfig,
}

impl EuropeanPolicy {
    pub fn new(config: EuropeanPolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EuropeanPolicyConfig {
        &self.config
    }
}

impl AiPolicy for EuropeanPolicy {
    /// Recruits when enough immigration points have accumulated, then
    /// ends the turn.
    fn start_working(&self, ctx: &mut DecisionContext<'_>) -> Vec<Message> {
        let mut requests = Vec::new();
        let immigration = ctx.player_number("immigration").unwrap_or(0);
        let required = ctx.player_number("immigrationRequired").unwrap_or(i64::MAX);
        if immigration >= required {
            requests.push(Emigrate { slot: 0 }.into());
        }
        requests.push(EndTurn.into());
        requests
    }

    fn indian_demand(&self, _ctx: &mut DecisionContext<'_>, demand: &IndianDemand) -> Option<bool> {
        Some(demand.amount <= self.config.demand_tolerance)
    }

    fn accept_diplomatic_trade(
        &self,
        _ctx: &mut DecisionContext<'_>,
        agreement: &DiplomaticTrade,
    ) -> TradeStatus {
        if agreement.is_peace_treaty() {
            TradeStatus::Accept
        } else {
            TradeStatus::Reject
        }
    }

    /// Sells once if the settlement allows it, otherwise closes.
    fn handle_trade(
        &self,
        _ctx: &mut DecisionContext<'_>,
        action: NativeTradeAction,
        trade: &NativeTrade,
    ) -> NativeTradeAction {
        match action {
            NativeTradeAction::Open | NativeTradeAction::AckOpen if trade.sell => {
                NativeTradeAction::Sell
            }
            _ => NativeTradeAction::Close,
        }
    }

    fn accept_tax(&self, _ctx: &mut DecisionContext<'_>, tax: u32) -> bool {
        tax <= self.config.tax_ceiling
    }

    fn accept_mercenaries(&self, ctx: &mut DecisionContext<'_>) -> bool {
        ctx.chance(self.config.mercenary_chance)
    }

    fn select_founding_father(
        &self,
        ctx: &mut DecisionContext<'_>,
        fathers: &[String],
    ) -> Option<String> {
        fathers.choose(&mut *ctx.rng).cloned()
    }
}

const ACCEPT: &str = "accept";
const REJECT: &str = "reject";

/// Routes every decision to a person through the UI.
pub struct HumanStandIn<U: UserInterface> {
    ui: Arc<U>,
}

impl<U: UserInterface> HumanStandIn<U> {
    pub fn new(ui: Arc<U>) -> Self {
        Self { ui }
    }

    fn yes_no(&self, prompt: &str) -> Option<bool> {
        let options = [ACCEPT.to_string(), REJECT.to_string()];
        let choice = self.ui.prompt_choice(prompt, &options)?;
        Some(choice == ACCEPT)
    }
}

impl<U: UserInterface> AiPolicy for HumanStandIn<U> {
    fn start_working(&self, _ctx: &mut DecisionContext<'_>) -> Vec<Message> {
        vec![EndTurn.into()]
    }

    fn indian_demand(&self, _ctx: &mut DecisionContext<'_>, demand: &IndianDemand) -> Option<bool> {
        let what = demand.goods_type.as_deref().unwrap_or("gold");
        self.yes_no(&format!(
            "Natives at {} demand {} {what}",
            demand.colony, demand.amount
        ))
    }

    fn accept_diplomatic_trade(
        &self,
        _ctx: &mut DecisionContext<'_>,
        agreement: &DiplomaticTrade,
    ) -> TradeStatus {
        match self.yes_no(&format!("{} proposes an agreement", agreement.sender)) {
            Some(true) => TradeStatus::Accept,
            _ => TradeStatus::Reject,
        }
    }

    fn handle_trade(
        &self,
        _ctx: &mut DecisionContext<'_>,
        action: NativeTradeAction,
        trade: &NativeTrade,
    ) -> NativeTradeAction {
        let offered = [
            (trade.buy, NativeTradeAction::Buy),
            (trade.sell, NativeTradeAction::Sell),
            (trade.gift, NativeTradeAction::Gift),
            (true, NativeTradeAction::Close),
        ];
        let options: Vec<String> = offered
            .iter()
            .filter(|(allowed, _)| *allowed)
            .map(|(_, a)| a.to_string())
            .collect();
        let prompt = format!("Trade at {} ({action})", trade.settlement);
        match self.ui.prompt_choice(&prompt, &options) {
            Some(choice) => choice.parse().unwrap_or_else(|e| {
                debug!(error = %e, "unusable trade choice, closing");
                NativeTradeAction::Close
            }),
            None => NativeTradeAction::Close,
        }
    }

    fn accept_tax(&self, _ctx: &mut DecisionContext<'_>, tax: u32) -> bool {
        self.yes_no(&format!("The crown raises taxes to {tax}%"))
            .unwrap_or(false)
    }

    fn accept_mercenaries(&self, _ctx: &mut DecisionContext<'_>) -> bool {
        self.yes_no("Mercenaries offer their service")
            .unwrap_or(false)
    }

    fn select_founding_father(
        &self,
        _ctx: &mut DecisionContext<'_>,
        fathers: &[String],
    ) -> Option<String> {
        self.ui
            .prompt_choice("Choose a founding father", fathers)
            .filter(|choice| fathers.contains(choice))
    }
}
