//! End-to-end behavior of `ServerApi` against a scripted server end.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tradewind_api::{
    AiHooks, ApiError, DebugMode, ServerApi, ServerApiConfig, ServerApiHooks, UserHooks,
    UserInterface, empty_game,
};
use tradewind_protocol::{
    ClientHandler, Codec, Emigrate, EndTurn, ErrorMessage, FountainOfYouth, Game, Message,
    ReplyId, Update, XmlCodec,
};
use tradewind_transport::{Connection, LocalConnection};

struct Ignore;
impl ClientHandler for Ignore {}

#[derive(Default)]
struct CountingHandler {
    fountains: Mutex<Vec<u32>>,
}

impl ClientHandler for CountingHandler {
    fn fountain_of_youth(&self, message: FountainOfYouth) {
        self.fountains.lock().unwrap().push(message.migrants);
    }
}

/// The scripted far end of the connection.
struct FakeServer {
    connection: LocalConnection,
}

impl FakeServer {
    async fn next_question(&self) -> (ReplyId, Message) {
        let bytes = self.connection.recv().await.unwrap().unwrap();
        match XmlCodec.decode(&bytes, &mut Game::new()).unwrap() {
            Message::Question(wrapper) => {
                let id = wrapper.reply_id();
                (id, wrapper.into_message().unwrap())
            }
            other => panic!("expected a question, got <{}>", other.tag()),
        }
    }

    async fn send(&self, message: Message) {
        let bytes = XmlCodec.encode(&message).unwrap();
        self.connection.send(&bytes).await.unwrap();
    }

    async fn answer(&self, id: ReplyId, message: Option<Message>) {
        self.send(Message::reply(id, message)).await;
    }
}

fn setup<H: ServerApiHooks>(
    hooks: H,
    reply_timeout: Duration,
) -> (Arc<ServerApi<LocalConnection, H>>, FakeServer) {
    let (client, server) = LocalConnection::pair();
    let api = ServerApi::new(
        Arc::new(client),
        hooks,
        empty_game(),
        ServerApiConfig { reply_timeout },
    );
    (Arc::new(api), FakeServer { connection: server })
}

fn ai_hooks() -> AiHooks {
    AiHooks::new("player:1".into())
}

#[tokio::test]
async fn test_send_concurrent_replies_out_of_order_matched_by_id() {
    let (api, server) = setup(ai_hooks(), Duration::from_secs(10));
    let runner = {
        let api = api.clone();
        tokio::spawn(async move { api.run(&Ignore).await })
    };

    let mut requests = Vec::new();
    for slot in 0..8u32 {
        let api = api.clone();
        requests.push(tokio::spawn(async move {
            (slot, api.send(Emigrate { slot }).await)
        }));
    }

    let mut questions = Vec::new();
    for _ in 0..8 {
        questions.push(server.next_question().await);
    }
    for index in [5, 2, 7, 0, 3, 6, 1, 4] {
        let (id, request) = questions[index].clone();
        server.answer(id, Some(request)).await;
    }

    for request in requests {
        let (slot, reply) = request.await.unwrap();
        assert_eq!(reply.unwrap(), Some(Emigrate { slot }.into()));
    }
    assert_eq!(api.pending_replies(), 0);

    server.connection.close().await.unwrap();
    runner.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_send_timeout_releases_slot() {
    let (api, server) = setup(ai_hooks(), Duration::from_millis(200));
    let runner = {
        let api = api.clone();
        tokio::spawn(async move { api.run(&Ignore).await })
    };

    let err = api.send(EndTurn).await.unwrap_err();
    assert!(matches!(err, ApiError::TimedOut { .. }));
    assert!(err.is_transport_failure());
    assert_eq!(api.pending_replies(), 0);

    // The late reply is dropped without disturbing anything.
    let (id, _) = server.next_question().await;
    server.answer(id, None).await;
    tokio::task::yield_now().await;
    assert_eq!(api.pending_replies(), 0);

    server.connection.close().await.unwrap();
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_send_on_closed_connection_is_transport_error() {
    let (api, server) = setup(ai_hooks(), Duration::from_secs(1));
    server.connection.close().await.unwrap();

    let err = api.send(EndTurn).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(api.pending_replies(), 0);
}

#[tokio::test]
async fn test_shutdown_abandons_waiters() {
    let (api, server) = setup(ai_hooks(), Duration::from_secs(10));
    let waiter = {
        let api = api.clone();
        tokio::spawn(async move { api.send(EndTurn).await })
    };
    let (id, _) = server.next_question().await;

    api.shutdown().await.unwrap();
    let err = waiter.await.unwrap().unwrap_err();
    assert!(matches!(err, ApiError::Abandoned(abandoned) if abandoned == id));
    assert_eq!(api.pending_replies(), 0);
}

#[derive(Default)]
struct RecordingUi {
    errors: Mutex<Vec<String>>,
    sounds: Mutex<Vec<String>>,
}

impl UserInterface for RecordingUi {
    fn show_error_message(&self, _message_id: Option<&str>, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn play_sound(&self, sound: &str) {
        self.sounds.lock().unwrap().push(sound.to_string());
    }

    fn prompt_choice(&self, _prompt: &str, _options: &[String]) -> Option<String> {
        None
    }
}

#[tokio::test]
async fn test_complaint_reaches_hook_and_caller() {
    let ui = Arc::new(RecordingUi::default());
    let hooks = UserHooks::new(ui.clone(), DebugMode { comms: true });
    let (api, server) = setup(hooks, Duration::from_secs(10));
    let runner = {
        let api = api.clone();
        tokio::spawn(async move { api.run(&Ignore).await })
    };

    let request = {
        let api = api.clone();
        tokio::spawn(async move { api.send(Emigrate { slot: 3 }).await })
    };
    let (id, _) = server.next_question().await;
    server
        .answer(id, Some(ErrorMessage::new("No migrants in that slot").into()))
        .await;

    let err = request.await.unwrap().unwrap_err();
    assert!(matches!(err, ApiError::Complaint(ref c) if c.message == "No migrants in that slot"));
    assert!(!err.is_transport_failure());
    assert_eq!(*ui.errors.lock().unwrap(), vec!["No migrants in that slot".to_string()]);

    server.connection.close().await.unwrap();
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_reply_sound_is_played() {
    let ui = Arc::new(RecordingUi::default());
    let hooks = UserHooks::new(ui.clone(), DebugMode::default());
    let (api, server) = setup(hooks, Duration::from_secs(10));
    let runner = {
        let api = api.clone();
        tokio::spawn(async move { api.run(&Ignore).await })
    };

    let request = {
        let api = api.clone();
        tokio::spawn(async move { api.send(EndTurn).await })
    };
    let (id, _) = server.next_question().await;
    let update = Update {
        sound: Some("sound.event.endTurn".into()),
        ..Update::default()
    };
    server.answer(id, Some(update.into())).await;

    assert!(request.await.unwrap().unwrap().is_some());
    assert_eq!(*ui.sounds.lock().unwrap(), vec!["sound.event.endTurn".to_string()]);

    server.connection.close().await.unwrap();
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_run_survives_garbage_and_keeps_dispatching() {
    let (api, server) = setup(ai_hooks(), Duration::from_secs(10));
    let handler = Arc::new(CountingHandler::default());
    let runner = {
        let api = api.clone();
        let handler = handler.clone();
        tokio::spawn(async move { api.run(&handler).await })
    };

    server.connection.send(b"<fountainOfYouth migrants=\"2\">").await.unwrap();
    server.connection.send(b"<flyToMoon/>").await.unwrap();
    server.send(FountainOfYouth { migrants: 4 }.into()).await;

    // A server-initiated question is handled, then acknowledged.
    server
        .send(Message::question(ReplyId::new(90), FountainOfYouth { migrants: 1 }))
        .await;
    let ack = server.connection.recv().await.unwrap().unwrap();
    let ack = XmlCodec.decode(&ack, &mut Game::new()).unwrap();
    assert!(matches!(ack, Message::Reply(ref w) if w.reply_id() == ReplyId::new(90) && w.is_empty()));

    assert_eq!(*handler.fountains.lock().unwrap(), vec![4, 1]);

    server.connection.close().await.unwrap();
    runner.await.unwrap().unwrap();
}
