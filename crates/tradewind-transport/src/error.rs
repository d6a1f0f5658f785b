use crate::ConnectionId;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection is closed, locally or by the peer.
    #[error("{id} closed: {reason}")]
    Closed {
        id: ConnectionId,
        reason: &'static str,
    },

    /// Binding or accepting a socket failed.
    #[error("listener failed: {0}")]
    Listen(#[from] std::io::Error),

    /// The WebSocket handshake or a frame exchange failed.
    #[error("websocket failed: {0}")]
    WebSocket(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    pub(crate) fn closed(id: ConnectionId, reason: &'static str) -> Self {
        Self::Closed { id, reason }
    }

    /// Returns `true` if the error means the connection is gone for good.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}
