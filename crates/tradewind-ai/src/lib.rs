//! # tradewind-ai
//!
//! Computer-controlled players.
//!
//! An [`AiPlayer`] receives server pushes as a
//! [`ClientHandler`](tradewind_protocol::ClientHandler), asks its
//! [`AiPolicy`] what to do, and sends the answer on a spawned task so
//! the dispatch loop is never blocked on a round trip.
//!
//! ## Key types
//!
//! - [`AiPlayer`]: the per-player controller
//! - [`AiPolicy`] / [`DecisionContext`]: the decision seam
//! - [`ConservativePolicy`], [`EuropeanPolicy`], [`HumanStandIn`]: strategies
//! - [`AiRng`] / [`AiPlayerState`]: deterministic, persistable randomness

mod config;
mod error;
pub mod loot;
mod persist;
mod player;
mod policies;
mod policy;
pub mod rng;

pub use config::{AiConfig, EuropeanPolicyConfig};
pub use error::AiError;
pub use persist::AiPlayerState;
pub use player::{AiPlayer, Invocation};
pub use policies::{ConservativePolicy, EuropeanPolicy, HumanStandIn};
pub use policy::{AiPolicy, DecisionContext};
pub use rng::{AiRng, RandomStateError, seed_for};
