//! Error types for autonomous players.

use tradewind_api::ApiError;
use tradewind_protocol::ProtocolError;

/// Errors from an autonomous player.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// Talking to the server failed.
    #[error("server api error: {0}")]
    Api(#[from] ApiError),

    /// Saved state or game data was invalid.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A decision panicked. Caught at the task boundary.
    #[error("decision task `{task}` panicked: {message}")]
    TaskPanicked { task: &'static str, message: String },
}
