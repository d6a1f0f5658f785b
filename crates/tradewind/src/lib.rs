//! # Tradewind
//!
//! Request/reply coordination for turn-based multiplayer games.
//!
//! Clients talk to the server through a [`ServerApi`](tradewind_api::ServerApi),
//! which makes every request look like a call that returns the server's
//! answer. Computer-controlled players are [`AiPlayer`](tradewind_ai::AiPlayer)s
//! using the same API. The server side is a [`GameServer`], which runs
//! each request through the game rules and routes the resulting changes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tradewind::prelude::*;
//!
//! struct Rules;
//! impl ServerHandler for Rules {}
//!
//! # async fn demo() -> Result<(), TradewindError> {
//! let mut game = Game::new();
//! game.add_player(&PlayerId::new("player:1"));
//! let server: Arc<GameServer<Rules, LocalConnection>> =
//!     Arc::new(GameServer::new(Rules, game.shared(), ServerConfig::default()));
//!
//! let (client, server_end) = LocalConnection::pair();
//! let serving = server.spawn_serve(PlayerId::new("player:1"), Arc::new(server_end));
//! # drop((client, serving));
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
pub mod logging;
mod server;

pub use error::TradewindError;
pub use server::{GameServer, ServerConfig};

pub mod prelude {
    pub use crate::{GameServer, ServerConfig, TradewindError};
    pub use tradewind_ai::{
        AiConfig, AiPlayer, AiPlayerState, AiPolicy, ConservativePolicy, DecisionContext,
        EuropeanPolicy, EuropeanPolicyConfig, HumanStandIn,
    };
    pub use tradewind_api::{
        AiHooks, DebugMode, ServerApi, ServerApiConfig, ServerApiHooks, UserHooks, UserInterface,
    };
    pub use tradewind_protocol::{
        ChangeSet, ClientHandler, Codec, Game, GameObject, Message, PlayerId, Recipient,
        ServerHandler, XmlCodec,
    };
    pub use tradewind_transport::{Connection, LocalConnection};
}
