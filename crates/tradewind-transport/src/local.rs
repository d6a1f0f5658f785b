//! In-memory connection pair for actors that share the server's process.
//!
//! Autonomous players never touch the network: the server holds one end
//! of a [`LocalConnection::pair`] and the player holds the other. Each
//! direction is an unbounded Tokio channel of encoded frames, so the
//! same codec and reply-correlation code paths run as for remote clients.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::{Connection, ConnectionId, TransportError};

/// One end of an in-memory connection pair.
pub struct LocalConnection {
    id: ConnectionId,
    /// `None` once this end has been closed.
    outbound: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl LocalConnection {
    /// Creates two connected ends. Whatever one end sends, the other
    /// receives, in order.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let a = Self {
            id: ConnectionId::next(),
            outbound: Mutex::new(Some(a_tx)),
            inbound: tokio::sync::Mutex::new(b_rx),
        };
        let b = Self {
            id: ConnectionId::next(),
            outbound: Mutex::new(Some(b_tx)),
            inbound: tokio::sync::Mutex::new(a_rx),
        };
        tracing::trace!(a = %a.id, b = %b.id, "local connection pair created");
        (a, b)
    }

    fn sender(&self) -> Option<mpsc::UnboundedSender<Vec<u8>>> {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Connection for LocalConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let sender = self.sender().ok_or_else(|| {
            TransportError::closed(self.id, "closed locally")
        })?;
        sender.send(data.to_vec()).map_err(|_| {
            TransportError::closed(self.id, "peer dropped")
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.inbound.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Dropping our sender ends the peer's `recv` stream. Closing our
        // receiver makes the peer's `send` fail; a `recv` in progress
        // holds the receiver and sees the end of stream once the peer
        // closes its side.
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Ok(mut inbound) = self.inbound.try_lock() {
            inbound.close();
        }
        tracing::debug!(id = %self.id, "local connection closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.sender().is_some_and(|tx| !tx.is_closed())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
