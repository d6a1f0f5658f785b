//! Settings for autonomous players.

use serde::{Deserialize, Serialize};

/// Game-wide AI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Every player's generator is derived from this and the player id.
    pub master_seed: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            master_seed: rand::random(),
        }
    }
}

impl AiConfig {
    pub fn with_seed(master_seed: u64) -> Self {
        Self { master_seed }
    }
}

/// Tuning for [`EuropeanPolicy`](crate::EuropeanPolicy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EuropeanPolicyConfig {
    /// Highest tax rate, in percent, the player will accept.
    pub tax_ceiling: u32,
    /// Largest native demand the player gives in to.
    pub demand_tolerance: u32,
    /// Probability of accepting a mercenary offer.
    pub mercenary_chance: f64,
}

impl Default for EuropeanPolicyConfig {
    fn default() -> Self {
        Self {
            tax_ceiling: 50,
            demand_tolerance: 100,
            mercenary_chance: 0.5,
        }
    }
}
