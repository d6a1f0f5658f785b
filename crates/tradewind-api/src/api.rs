//! The client-side façade for talking to the server.
//!
//! [`ServerApi::send`] looks synchronous to its caller: it wraps the
//! request in a `question`, transmits it, and waits for the `reply`
//! with the same id. The other half is [`ServerApi::run`], the dispatch
//! loop that reads everything the server sends, resolves replies, and
//! hands pushes to a [`ClientHandler`].
//!
//! Many `send`s may be in flight at once from different tasks; the
//! dispatch loop must be running for any of them to complete.

use std::sync::{Arc, PoisonError};

use tokio::time::timeout;
use tradewind_protocol::{
    ClientHandler, Codec, Game, Message, ProtocolError, ReplyId, SharedGame, XmlCodec,
};
use tradewind_transport::Connection;
use tracing::{debug, info, trace, warn};

use crate::{ApiError, ReplyTable, ServerApiConfig, ServerApiHooks};

/// A connection to the server plus reply bookkeeping.
pub struct ServerApi<C: Connection, H: ServerApiHooks> {
    connection: Arc<C>,
    hooks: H,
    codec: XmlCodec,
    game: SharedGame,
    replies: ReplyTable,
    config: ServerApiConfig,
}

impl<C: Connection, H: ServerApiHooks> ServerApi<C, H> {
    pub fn new(connection: Arc<C>, hooks: H, game: SharedGame, config: ServerApiConfig) -> Self {
        Self {
            connection,
            hooks,
            codec: XmlCodec,
            game,
            replies: ReplyTable::new(),
            config,
        }
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.connection
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn game(&self) -> &SharedGame {
        &self.game
    }

    pub fn config(&self) -> &ServerApiConfig {
        &self.config
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError> {
        let mut game = self.game.write().unwrap_or_else(PoisonError::into_inner);
        self.codec.decode(data, &mut game)
    }

    async fn transmit(&self, message: &Message) -> Result<(), ApiError> {
        let bytes = self.codec.encode(message)?;
        self.connection.send(&bytes).await?;
        Ok(())
    }

    /// Sends a request and waits for its reply.
    ///
    /// Returns the reply payload, or `None` for an empty reply. A
    /// complaint from the server goes to the hooks first and then comes
    /// back as [`ApiError::Complaint`].
    ///
    /// # Errors
    /// Transport failure, timeout, or abandonment at shutdown, each
    /// distinct from a complaint. The pending slot is released in every
    /// case.
    pub async fn send(&self, request: impl Into<Message>) -> Result<Option<Message>, ApiError> {
        let request = request.into();
        let mut pending = self.replies.register();
        let reply_id = pending.id();
        trace!(%reply_id, tag = request.tag(), "sending request");

        self.transmit(&Message::question(reply_id, request)).await?;

        let reply = match timeout(self.config.reply_timeout, pending.recv()).await {
            Ok(reply) => reply?,
            Err(_) => {
                return Err(ApiError::TimedOut {
                    reply_id,
                    timeout: self.config.reply_timeout,
                });
            }
        };

        match reply {
            Some(Message::Error(complaint)) => {
                self.hooks.do_raise_error_message(&complaint);
                Err(ApiError::Complaint(complaint))
            }
            Some(message) => {
                self.hooks.do_client_processing_for(&message);
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    /// Sends a message that expects no reply.
    pub async fn notify(&self, message: impl Into<Message>) -> Result<(), ApiError> {
        self.transmit(&message.into()).await
    }

    /// Answers a question the server asked.
    pub async fn reply(&self, reply_id: ReplyId, message: Option<Message>) -> Result<(), ApiError> {
        self.transmit(&Message::reply(reply_id, message)).await
    }

    /// Handles one incoming encoded message.
    ///
    /// # Errors
    /// A protocol error leaves everything else untouched; the caller may
    /// keep going. A transport error means answering a question failed.
    pub async fn dispatch<D>(&self, data: &[u8], handler: &D) -> Result<(), ApiError>
    where
        D: ClientHandler + ?Sized,
    {
        match self.decode(data)? {
            Message::Reply(wrapper) => {
                let reply_id = wrapper.reply_id();
                trace!(%reply_id, sub_type = wrapper.sub_type().unwrap_or("-"), "reply received");
                self.replies.resolve(reply_id, wrapper.into_message());
            }
            Message::Question(wrapper) => {
                let reply_id = wrapper.reply_id();
                if let Some(inner) = wrapper.into_message() {
                    self.handle_push(inner, handler);
                }
                self.reply(reply_id, None).await?;
            }
            message => self.handle_push(message, handler),
        }
        Ok(())
    }

    fn handle_push<D>(&self, message: Message, handler: &D)
    where
        D: ClientHandler + ?Sized,
    {
        match message {
            Message::Error(complaint) => {
                self.hooks.do_raise_error_message(&complaint);
                handler.error(complaint);
            }
            Message::Update(update) => {
                {
                    let mut game = self.game.write().unwrap_or_else(PoisonError::into_inner);
                    for object in &update.objects {
                        game.apply(object);
                    }
                }
                handler.update(update);
            }
            Message::Multiple(multiple) => {
                for message in multiple.messages {
                    self.handle_push(message, handler);
                }
            }
            message => {
                let tag = message.tag();
                if !message.client_handler(handler) {
                    debug!(tag, "push not handled");
                }
            }
        }
    }

    /// Reads and dispatches until the connection closes.
    ///
    /// Undecodable messages are logged and skipped. Whenever the loop
    /// ends, every still-pending request is abandoned.
    ///
    /// # Errors
    /// Transport failures end the loop and are returned.
    pub async fn run<D>(&self, handler: &D) -> Result<(), ApiError>
    where
        D: ClientHandler + ?Sized,
    {
        let result = loop {
            let data = match self.connection.recv().await {
                Ok(Some(data)) => data,
                Ok(None) => {
                    info!(connection = %self.connection.id(), "connection closed");
                    break Ok(());
                }
                Err(e) => break Err(ApiError::from(e)),
            };

            match self.dispatch(&data, handler).await {
                Ok(()) => {}
                Err(ApiError::Protocol(e)) => {
                    warn!(
                        error = %e,
                        stream_corruption = e.is_stream_corruption(),
                        "dropping undecodable message"
                    );
                }
                Err(e) => break Err(e),
            }
        };

        let abandoned = self.replies.clear();
        if abandoned > 0 {
            info!(abandoned, "discarded pending replies");
        }
        result
    }

    /// Abandons every pending request and closes the connection.
    pub async fn shutdown(&self) -> Result<(), ApiError> {
        let abandoned = self.replies.clear();
        debug!(abandoned, "server api shutting down");
        self.connection.close().await?;
        Ok(())
    }
}

/// Convenience for tests and tools: a fresh, empty shared game.
pub fn empty_game() -> SharedGame {
    Game::new().shared()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tradewind_protocol::{EndTurn, GameObject, Update};
    use tradewind_transport::LocalConnection;

    use super::*;
    use crate::AiHooks;

    struct Ignore;
    impl ClientHandler for Ignore {}

    fn api(connection: LocalConnection) -> ServerApi<LocalConnection, AiHooks> {
        ServerApi::new(
            Arc::new(connection),
            AiHooks::new("player:1".into()),
            empty_game(),
            ServerApiConfig {
                reply_timeout: Duration::from_secs(5),
            },
        )
    }

    #[tokio::test]
    async fn test_dispatch_update_applies_to_game() {
        let (ours, _theirs) = LocalConnection::pair();
        let api = api(ours);
        let update = Update {
            objects: vec![GameObject::new("unit:2", "unit").with_attribute("spaceLeft", 1)],
            sound: None,
        };
        let bytes = XmlCodec.encode(&update.into()).unwrap();

        api.dispatch(&bytes, &Ignore).await.unwrap();

        let game = api.game().read().unwrap();
        let unit = game.get(&"unit:2".into()).unwrap();
        assert!(!unit.is_stub());
        assert_eq!(unit.attribute("spaceLeft"), Some("1"));
    }

    #[tokio::test]
    async fn test_dispatch_question_is_acknowledged_with_same_id() {
        let (ours, theirs) = LocalConnection::pair();
        let api = api(ours);
        let bytes = XmlCodec
            .encode(&Message::question(ReplyId::new(31), EndTurn))
            .unwrap();

        api.dispatch(&bytes, &Ignore).await.unwrap();

        let ack = theirs.recv().await.unwrap().unwrap();
        let ack = XmlCodec.decode(&ack, &mut Game::new()).unwrap();
        let Message::Reply(wrapper) = ack else {
            panic!("expected a reply");
        };
        assert_eq!(wrapper.reply_id(), ReplyId::new(31));
        assert!(wrapper.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_garbage_is_protocol_error() {
        let (ours, _theirs) = LocalConnection::pair();
        let api = api(ours);
        let err = api.dispatch(b"<update", &Ignore).await.unwrap_err();
        assert!(matches!(err, ApiError::Protocol(ref e) if e.is_stream_corruption()));
    }

    #[tokio::test]
    async fn test_stray_reply_is_ignored() {
        let (ours, _theirs) = LocalConnection::pair();
        let api = api(ours);
        let bytes = XmlCodec
            .encode(&Message::reply(ReplyId::new(500), None))
            .unwrap();
        api.dispatch(&bytes, &Ignore).await.unwrap();
        assert_eq!(api.pending_replies(), 0);
    }
}
