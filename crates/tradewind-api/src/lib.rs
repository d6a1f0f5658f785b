//! # tradewind-api
//!
//! The client side of the conversation with the server.
//!
//! - [`ServerApi`]: request/reply over a [`Connection`](tradewind_transport::Connection),
//!   with a dispatch loop for everything the server pushes
//! - [`ReplyTable`] / [`PendingReply`]: reply correlation by id
//! - [`ServerApiHooks`]: what differs between a human ([`UserHooks`])
//!   and an autonomous ([`AiHooks`]) client

mod api;
mod config;
mod error;
mod hooks;
mod replies;

pub use api::{ServerApi, empty_game};
pub use config::{DebugMode, ServerApiConfig};
pub use error::ApiError;
pub use hooks::{AiHooks, ServerApiHooks, UserHooks, UserInterface};
pub use replies::{PendingReply, ReplyTable};
