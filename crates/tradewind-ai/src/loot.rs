//! Choosing what to take from a defeated ship.

use std::cmp::Reverse;
use std::collections::HashMap;

use tradewind_protocol::{GameObject, Goods};

/// Attribute prefix for per-type unit sale prices on a player object.
const SALE_PRICE_PREFIX: &str = "salePrice.";

/// Sale prices as seen by one player.
#[derive(Debug, Clone, Default)]
pub struct Market {
    prices: HashMap<String, i64>,
}

impl Market {
    /// Reads `salePrice.<goods type>` attributes from a player object.
    /// Unparseable prices are skipped.
    pub fn from_player(player: &GameObject) -> Self {
        let prices = player
            .attributes()
            .iter()
            .filter_map(|(key, value)| {
                let goods_type = key.strip_prefix(SALE_PRICE_PREFIX)?;
                Some((goods_type.to_string(), value.parse().ok()?))
            })
            .collect();
        Self { prices }
    }

    pub fn with_price(mut self, goods_type: &str, unit_price: i64) -> Self {
        self.prices.insert(goods_type.to_string(), unit_price);
        self
    }

    /// What the goods would fetch. Unknown types are worth nothing.
    pub fn sale_price(&self, goods: &Goods) -> i64 {
        self.prices.get(&goods.goods_type).copied().unwrap_or(0) * i64::from(goods.amount)
    }
}

/// Greedy fill by descending sale price.
///
/// Items are considered most valuable first; equal prices keep their
/// offered order. An item too big for the remaining space is skipped
/// and the fill continues with the next one.
pub fn select_loot(goods: &[Goods], market: &Market, space: u32) -> Vec<Goods> {
    let mut candidates: Vec<&Goods> = goods.iter().collect();
    candidates.sort_by_key(|g| Reverse(market.sale_price(g)));

    let mut remaining = space;
    let mut loot = Vec::new();
    for item in candidates {
        if remaining == 0 {
            break;
        }
        let size = item.space_taken();
        if size > remaining {
            continue;
        }
        remaining -= size;
        loot.push(item.clone());
    }
    loot
}
