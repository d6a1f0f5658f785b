//! Per-connection loop: receive frames and hand them to the server.

use std::sync::Arc;

use tradewind_protocol::{PlayerId, ServerHandler};
use tradewind_transport::{Connection, ConnectionId};

use crate::{GameServer, TradewindError};

/// Detaches the player when the loop exits, including by panic.
struct AttachmentGuard<'a, R, C>
where
    R: ServerHandler + Send + 'static,
    C: Connection,
{
    server: &'a GameServer<R, C>,
    player: PlayerId,
    conn_id: ConnectionId,
}

impl<R, C> Drop for AttachmentGuard<'_, R, C>
where
    R: ServerHandler + Send + 'static,
    C: Connection,
{
    fn drop(&mut self) {
        self.server.detach_connection(&self.player, self.conn_id);
    }
}

/// Handles frames from an attached connection until it closes.
///
/// Undecodable frames are logged and skipped; the client may keep
/// talking. A failure to send on this connection ends the loop.
pub(crate) async fn handle_connection<R, C>(
    server: &GameServer<R, C>,
    player: PlayerId,
    conn: Arc<C>,
) -> Result<(), TradewindError>
where
    R: ServerHandler + Send + 'static,
    C: Connection,
{
    let conn_id = conn.id();
    let _guard = AttachmentGuard {
        server,
        player: player.clone(),
        conn_id,
    };
    tracing::debug!(%player, %conn_id, "serving connection");

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player, error = %e, "recv error");
                break;
            }
        };

        match server.handle(&player, &data).await {
            Ok(()) => {}
            Err(TradewindError::Protocol(e)) => {
                tracing::warn!(%player, error = %e, "rejected frame from client");
            }
            Err(e) => {
                tracing::debug!(%player, error = %e, "connection failed");
                return Err(e);
            }
        }
    }

    Ok(())
}
