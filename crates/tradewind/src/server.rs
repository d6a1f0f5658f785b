//! Server-side dispatch.
//!
//! A [`GameServer`] owns the authoritative game, the rules (a
//! [`ServerHandler`]), and one connection per attached player. Each
//! request runs through the rules; the resulting [`ChangeSet`] is split
//! by recipient. What the requester should see travels back as the
//! reply payload, and everyone else gets their share as a push.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tradewind_api::{ApiError, ReplyTable};
use tradewind_protocol::{
    ChangeSet, Codec, Message, Multiple, PlayerId, ProtocolError, ServerHandler, SharedGame,
    XmlCodec,
};
use tradewind_transport::Connection;
use tracing::{debug, info, trace, warn};

use crate::TradewindError;
use crate::handler::handle_connection;

/// Server-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// How long [`GameServer::ask`] waits for a client's answer.
    #[serde(with = "secs")]
    pub reply_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(60),
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// The authoritative side of a game.
pub struct GameServer<R, C>
where
    R: ServerHandler + Send + 'static,
    C: Connection,
{
    rules: Mutex<R>,
    game: SharedGame,
    connections: RwLock<HashMap<PlayerId, Arc<C>>>,
    replies: ReplyTable,
    codec: XmlCodec,
    config: ServerConfig,
}

impl<R, C> GameServer<R, C>
where
    R: ServerHandler + Send + 'static,
    C: Connection,
{
    pub fn new(rules: R, game: SharedGame, config: ServerConfig) -> Self {
        Self {
            rules: Mutex::new(rules),
            game,
            connections: RwLock::new(HashMap::new()),
            replies: ReplyTable::new(),
            codec: XmlCodec,
            config,
        }
    }

    pub fn game(&self) -> &SharedGame {
        &self.game
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs `f` with exclusive access to the rules.
    pub fn with_rules<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut self.rules.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Server-initiated questions still waiting for an answer.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    /// Players with an attached connection, in no particular order.
    pub fn connected_players(&self) -> Vec<PlayerId> {
        self.read_connections().keys().cloned().collect()
    }

    pub fn is_connected(&self, player: &PlayerId) -> bool {
        self.read_connections().contains_key(player)
    }

    fn read_connections(&self) -> std::sync::RwLockReadGuard<'_, HashMap<PlayerId, Arc<C>>> {
        self.connections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_connections(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<PlayerId, Arc<C>>> {
        self.connections.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn connection(&self, player: &PlayerId) -> Result<Arc<C>, TradewindError> {
        self.read_connections()
            .get(player)
            .cloned()
            .ok_or_else(|| TradewindError::NotConnected(player.clone()))
    }

    /// Attaches `connection` for `player`, replacing any earlier one.
    ///
    /// # Errors
    /// [`TradewindError::Protocol`] if the player is not in the game.
    pub fn attach(&self, player: PlayerId, connection: Arc<C>) -> Result<(), TradewindError> {
        self.game
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .require_player(&player)?;
        let conn_id = connection.id();
        if let Some(previous) = self.write_connections().insert(player.clone(), connection) {
            info!(%player, old = %previous.id(), new = %conn_id, "player reattached");
        } else {
            info!(%player, %conn_id, "player attached");
        }
        Ok(())
    }

    /// Detaches `player` if it is still using the connection `conn_id`.
    pub(crate) fn detach_connection(&self, player: &PlayerId, conn_id: tradewind_transport::ConnectionId) {
        let mut connections = self.write_connections();
        if connections.get(player).is_some_and(|c| c.id() == conn_id) {
            connections.remove(player);
            info!(%player, %conn_id, "player detached");
        }
    }

    fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError> {
        let mut game = self.game.write().unwrap_or_else(PoisonError::into_inner);
        self.codec.decode(data, &mut game)
    }

    async fn transmit(&self, connection: &C, message: &Message) -> Result<(), TradewindError> {
        let bytes = self.codec.encode(message)?;
        connection.send(&bytes).await?;
        Ok(())
    }

    /// Handles one frame received from `source`.
    ///
    /// Replies resolve a pending [`ask`](Self::ask). A question is
    /// answered with the requester's share of the changes, under the
    /// same reply id. Anything else is handled like a question whose
    /// answer is pushed instead.
    ///
    /// # Errors
    /// A protocol error for undecodable input, or a transport error if
    /// the requester's connection failed.
    pub async fn handle(&self, source: &PlayerId, data: &[u8]) -> Result<(), TradewindError> {
        match self.decode(data)? {
            Message::Reply(wrapper) => {
                let reply_id = wrapper.reply_id();
                trace!(%source, %reply_id, "client answered");
                self.replies.resolve(reply_id, wrapper.into_message());
            }
            Message::Question(wrapper) => {
                let reply_id = wrapper.reply_id();
                trace!(%source, %reply_id, sub_type = ?wrapper.sub_type(), "request received");
                let changes = self.apply(source, Message::Question(wrapper));
                let own = Multiple::collapse(changes.messages_for(source));
                let connection = self.connection(source)?;
                self.transmit(&connection, &Message::reply(reply_id, own)).await?;
                self.distribute(&changes, source).await;
            }
            message => {
                trace!(%source, tag = message.tag(), "notification received");
                let changes = self.apply(source, message);
                if let Some(own) = Multiple::collapse(changes.messages_for(source)) {
                    let connection = self.connection(source)?;
                    self.transmit(&connection, &own).await?;
                }
                self.distribute(&changes, source).await;
            }
        }
        Ok(())
    }

    fn apply(&self, source: &PlayerId, message: Message) -> ChangeSet {
        let sourced = message.with_source(source.clone());
        self.with_rules(|rules| sourced.server_handler(rules))
            .unwrap_or_default()
    }

    /// Pushes each other player's share of `changes`. A failed delivery
    /// is logged and does not stop the rest.
    async fn distribute(&self, changes: &ChangeSet, requester: &PlayerId) {
        if changes.is_empty() {
            return;
        }
        let others: Vec<_> = self
            .read_connections()
            .iter()
            .filter(|(player, _)| *player != requester)
            .map(|(player, conn)| (player.clone(), Arc::clone(conn)))
            .collect();
        for (player, connection) in others {
            let Some(share) = Multiple::collapse(changes.messages_for(&player)) else {
                continue;
            };
            if let Err(e) = self.transmit(&connection, &share).await {
                warn!(%player, error = %e, "failed to deliver changes");
            }
        }
    }

    /// Pushes a message to one player.
    ///
    /// # Errors
    /// [`TradewindError::NotConnected`], or the transport failure.
    pub async fn notify(
        &self,
        player: &PlayerId,
        message: impl Into<Message>,
    ) -> Result<(), TradewindError> {
        let connection = self.connection(player)?;
        self.transmit(&connection, &message.into()).await
    }

    /// Pushes a message to every attached player, returning how many
    /// received it.
    pub async fn broadcast(&self, message: impl Into<Message>) -> usize {
        let message = message.into();
        let all: Vec<_> = self
            .read_connections()
            .iter()
            .map(|(player, conn)| (player.clone(), Arc::clone(conn)))
            .collect();
        let mut delivered = 0;
        for (player, connection) in all {
            match self.transmit(&connection, &message).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(%player, error = %e, "broadcast delivery failed"),
            }
        }
        delivered
    }

    /// Asks `player` a question and waits for the answer.
    ///
    /// The player's connection must be served (see
    /// [`serve`](Self::serve)) for the answer to arrive.
    ///
    /// # Errors
    /// [`TradewindError::NotConnected`], a transport failure, or
    /// [`ApiError::TimedOut`] once the configured timeout passes.
    pub async fn ask(
        &self,
        player: &PlayerId,
        question: impl Into<Message>,
    ) -> Result<Option<Message>, TradewindError> {
        let connection = self.connection(player)?;
        let mut pending = self.replies.register();
        let reply_id = pending.id();
        let question = question.into();
        debug!(%player, %reply_id, tag = question.tag(), "asking client");
        self.transmit(&connection, &Message::question(reply_id, question))
            .await?;
        match timeout(self.config.reply_timeout, pending.recv()).await {
            Ok(answer) => Ok(answer?),
            Err(_) => Err(ApiError::TimedOut {
                reply_id,
                timeout: self.config.reply_timeout,
            }
            .into()),
        }
    }

    /// Attaches `connection` and handles its frames until it closes.
    ///
    /// # Errors
    /// See [`attach`](Self::attach); a transport failure while answering
    /// also ends the loop.
    pub async fn serve(&self, player: PlayerId, connection: Arc<C>) -> Result<(), TradewindError> {
        self.attach(player.clone(), Arc::clone(&connection))?;
        handle_connection(self, player, connection).await
    }

    /// Runs [`serve`](Self::serve) on its own task.
    pub fn spawn_serve(
        self: &Arc<Self>,
        player: PlayerId,
        connection: Arc<C>,
    ) -> JoinHandle<Result<(), TradewindError>> {
        let me = Arc::clone(self);
        tokio::spawn(async move { me.serve(player, connection).await })
    }

    /// Abandons outstanding questions and closes every connection.
    pub async fn shutdown(&self) {
        let abandoned = self.replies.clear();
        let all: Vec<_> = self.write_connections().drain().collect();
        info!(players = all.len(), abandoned, "server shutting down");
        for (player, connection) in all {
            if let Err(e) = connection.close().await {
                debug!(%player, error = %e, "close failed");
            }
        }
    }
}
