//! Connection abstraction layer for Tradewind.
//!
//! Provides the [`Connection`] trait every actor talks through, plus two
//! implementations:
//!
//! - [`LocalConnection`]: an in-memory pair used when an autonomous
//!   player lives in the same process as the server.
//! - `WebSocketConnection`: a remote client over WebSocket
//!   (feature `websocket`, on by default).
//!
//! Frames are opaque byte buffers. This layer knows nothing about
//! messages, reply identifiers, or players.

mod error;
mod local;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use local::LocalConnection;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Names one connection for its whole life.
///
/// A player that reconnects gets a new id, which is how the server tells
/// a stale connection from the current one. Ids are drawn from one
/// process-wide sequence for local and WebSocket connections alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

/// Shown as `conn-<n>` in logs and errors.
impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single bidirectional connection that carries encoded messages.
///
/// All methods take `&self`: one task may sit in [`recv`](Self::recv)
/// while others call [`send`](Self::send) on the same connection.
/// The returned futures are `Send` so callers can drive them from
/// spawned tasks.
pub trait Connection: Send + Sync + 'static {
    /// Sends one encoded message to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the peer's next frame. `Ok(None)` means the peer
    /// closed its side and nothing more will arrive.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection. Closing twice is not an error.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns `true` while messages can still be sent.
    fn is_open(&self) -> bool;

    fn id(&self) -> ConnectionId;
}
