//! Unified error type for Tradewind.

use tradewind_ai::AiError;
use tradewind_api::ApiError;
use tradewind_protocol::{PlayerId, ProtocolError};
use tradewind_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` conversions let `?` lift sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum TradewindError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Ai(#[from] AiError),

    /// The player has no attached connection.
    #[error("player {0} is not connected")]
    NotConnected(PlayerId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: TradewindError = TransportError::Listen(std::io::Error::other("gone")).into();
        assert!(matches!(err, TradewindError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: TradewindError = ProtocolError::UnknownTag("bogus".into()).into();
        assert!(matches!(err, TradewindError::Protocol(ref e) if e.is_content_error()));
    }

    #[test]
    fn test_from_api_error() {
        let err: TradewindError = ApiError::Abandoned(tradewind_protocol::ReplyId::new(3)).into();
        assert!(matches!(err, TradewindError::Api(_)));
    }

    #[test]
    fn test_from_ai_error() {
        let err: TradewindError = AiError::TaskPanicked {
            task: "lootCargo",
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, TradewindError::Ai(_)));
        assert!(err.to_string().contains("lootCargo"));
    }

    #[test]
    fn test_not_connected_names_player() {
        let err = TradewindError::NotConnected(PlayerId::new("player:9"));
        assert_eq!(err.to_string(), "player player:9 is not connected");
    }
}
