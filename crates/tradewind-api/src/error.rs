//! Error types for the server API.

use std::time::Duration;

use tradewind_protocol::{ErrorMessage, ProtocolError, ReplyId};
use tradewind_transport::TransportError;

/// Errors reported to a caller of the server API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The connection failed underneath us.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No reply arrived in time. The pending slot has been released.
    #[error("no reply to request {reply_id} within {timeout:?}")]
    TimedOut { reply_id: ReplyId, timeout: Duration },

    /// The pending slot was discarded before a reply arrived, usually
    /// because the API was shut down.
    #[error("request {0} abandoned before a reply arrived")]
    Abandoned(ReplyId),

    /// The server rejected the request on business grounds.
    #[error("server complaint: {}", .0.message)]
    Complaint(ErrorMessage),
}

impl ApiError {
    /// `true` when the request failed because the link to the server
    /// did, as opposed to the server saying no.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::TimedOut { .. } | Self::Abandoned(_)
        )
    }
}
