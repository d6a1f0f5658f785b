//! End-to-end: a `GameServer` with autonomous players and raw clients
//! over in-memory connections.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tradewind::prelude::*;
use tradewind_ai::Invocation;
use tradewind_api::ApiError;
use tradewind_protocol::{
    ChooseFoundingFather, Emigrate, EndTurn, NewLandName, ReplyId, Update,
};

#[derive(Default)]
struct Rules {
    ended: Vec<PlayerId>,
    fathers: Vec<(PlayerId, String)>,
    names: Vec<String>,
}

impl ServerHandler for Rules {
    fn end_turn(&mut self, source: &PlayerId, _message: EndTurn) -> ChangeSet {
        self.ended.push(source.clone());
        let done = GameObject::new(source.object_id(), "player").with_attribute("turnDone", true);
        ChangeSet::new().with(
            Recipient::AllExcept(source.clone()),
            Update {
                objects: vec![done],
                sound: None,
            },
        )
    }

    fn emigrate(&mut self, source: &PlayerId, _message: Emigrate) -> ChangeSet {
        ChangeSet::complaint(source, "no migrants waiting")
    }

    fn choose_founding_father(
        &mut self,
        source: &PlayerId,
        message: ChooseFoundingFather,
    ) -> ChangeSet {
        if let Some(chosen) = message.chosen {
            self.fathers.push((source.clone(), chosen));
        }
        ChangeSet::new()
    }

    fn new_land_name(&mut self, _source: &PlayerId, message: NewLandName) -> ChangeSet {
        self.names.push(message.name);
        ChangeSet::new()
    }
}

type Server = GameServer<Rules, LocalConnection>;
type Serving = JoinHandle<Result<(), TradewindError>>;

fn world() -> Game {
    let mut game = Game::new();
    game.insert(
        GameObject::new("player:1", "player")
            .with_attribute("immigration", 50)
            .with_attribute("immigrationRequired", 40),
    );
    game.add_player(&"player:2".into());
    game.insert(GameObject::new("unit:1", "unit"));
    game
}

fn server(config: ServerConfig) -> Arc<Server> {
    Arc::new(GameServer::new(Rules::default(), world().shared(), config))
}

async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}

async fn join_ai(
    server: &Arc<Server>,
    player: &str,
) -> (Arc<AiPlayer<LocalConnection, EuropeanPolicy>>, Invocation, Serving) {
    let (client, server_end) = LocalConnection::pair();
    let ai = AiPlayer::new(
        player.into(),
        Arc::new(client),
        world().shared(),
        EuropeanPolicy::default(),
        &AiConfig::with_seed(11),
        ServerApiConfig::default(),
    )
    .unwrap();
    let ai = Arc::new(ai);
    let dispatch = ai.spawn_dispatch();
    let serving = server.spawn_serve(player.into(), Arc::new(server_end));
    let player = PlayerId::new(player);
    eventually(|| server.is_connected(&player)).await;
    (ai, dispatch, serving)
}

async fn join_raw(server: &Arc<Server>, player: &str) -> (LocalConnection, Serving) {
    let (client, server_end) = LocalConnection::pair();
    let serving = server.spawn_serve(player.into(), Arc::new(server_end));
    let player = PlayerId::new(player);
    eventually(|| server.is_connected(&player)).await;
    (client, serving)
}

async fn next_message(conn: &LocalConnection) -> Message {
    let bytes = conn.recv().await.unwrap().unwrap();
    XmlCodec.decode(&bytes, &mut world()).unwrap()
}

#[tokio::test]
async fn test_turn_changes_reach_other_players() {
    let server = server(ServerConfig::default());
    let (one, _d1, _s1) = join_ai(&server, "player:1").await;
    let (two, _d2, _s2) = join_ai(&server, "player:2").await;

    // Emigrate draws a complaint, which does not stop the turn.
    one.start_working().await.unwrap();
    assert_eq!(server.with_rules(|r| r.ended.clone()), vec![PlayerId::new("player:1")]);

    eventually(|| {
        two.api()
            .game()
            .read()
            .unwrap()
            .get(&"player:1".into())
            .and_then(|p| p.attribute("turnDone"))
            == Some("true")
    })
    .await;
    let own = one.api().game().read().unwrap();
    assert_eq!(own.get(&"player:1".into()).unwrap().attribute("turnDone"), None);
}

#[tokio::test]
async fn test_server_question_is_acknowledged_then_answered() {
    let server = server(ServerConfig::default());
    let (_ai, _dispatch, _serving) = join_ai(&server, "player:1").await;
    let offered: Vec<String> = ["adams", "bolivar", "cortes"].map(String::from).to_vec();

    let ack = server
        .ask(&"player:1".into(), ChooseFoundingFather::offer(offered.clone()))
        .await
        .unwrap();
    assert_eq!(ack, None);

    eventually(|| server.with_rules(|r| !r.fathers.is_empty())).await;
    let (who, chosen) = server.with_rules(|r| r.fathers[0].clone());
    assert_eq!(who, PlayerId::new("player:1"));
    assert!(offered.contains(&chosen));
    assert_eq!(server.pending_replies(), 0);
}

#[tokio::test]
async fn test_pushed_land_name_is_accepted() {
    let server = server(ServerConfig::default());
    let (_ai, _dispatch, _serving) = join_ai(&server, "player:1").await;

    server
        .notify(
            &"player:1".into(),
            NewLandName {
                unit: "unit:1".into(),
                name: "Nova Terra".into(),
            },
        )
        .await
        .unwrap();

    eventually(|| server.with_rules(|r| r.names == ["Nova Terra"])).await;
}

#[tokio::test]
async fn test_ask_times_out_and_releases_slot() {
    let server = server(ServerConfig {
        reply_timeout: Duration::from_millis(50),
    });
    let (client, _serving) = join_raw(&server, "player:2").await;

    let err = server
        .ask(&"player:2".into(), ChooseFoundingFather::offer(vec!["adams".into()]))
        .await
        .unwrap_err();
    assert!(matches!(err, TradewindError::Api(ApiError::TimedOut { .. })));
    assert_eq!(server.pending_replies(), 0);

    // The question did go out; an answer after the deadline is dropped.
    let Message::Question(question) = next_message(&client).await else {
        panic!("expected a question");
    };
    let late = XmlCodec
        .encode(&Message::reply(question.reply_id(), None))
        .unwrap();
    client.send(&late).await.unwrap();
    assert_eq!(server.pending_replies(), 0);
}

#[tokio::test]
async fn test_bad_frame_does_not_end_connection() {
    let server = server(ServerConfig::default());
    let (client, _serving) = join_raw(&server, "player:2").await;

    client.send(b"<endTurn").await.unwrap();
    client.send(b"<bogus/>").await.unwrap();
    let request = XmlCodec
        .encode(&Message::question(ReplyId::new(9), EndTurn))
        .unwrap();
    client.send(&request).await.unwrap();

    let Message::Reply(reply) = next_message(&client).await else {
        panic!("expected a reply");
    };
    assert_eq!(reply.reply_id(), ReplyId::new(9));
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_complaint_travels_in_the_reply() {
    let server = server(ServerConfig::default());
    let (client, _serving) = join_raw(&server, "player:1").await;

    let request = XmlCodec
        .encode(&Message::question(ReplyId::new(1), Emigrate { slot: 0 }))
        .unwrap();
    client.send(&request).await.unwrap();

    let Message::Reply(reply) = next_message(&client).await else {
        panic!("expected a reply");
    };
    let Some(Message::Error(complaint)) = reply.message() else {
        panic!("expected a complaint");
    };
    assert_eq!(complaint.message, "no migrants waiting");
}

#[tokio::test]
async fn test_closed_connection_detaches_player() {
    let server = server(ServerConfig::default());
    let (client, serving) = join_raw(&server, "player:2").await;

    client.close().await.unwrap();
    serving.await.unwrap().unwrap();
    assert!(!server.is_connected(&"player:2".into()));
}

#[tokio::test]
async fn test_shutdown_ends_every_player_loop() {
    let server = server(ServerConfig::default());
    let (_one, d1, _s1) = join_ai(&server, "player:1").await;
    let (_two, d2, _s2) = join_ai(&server, "player:2").await;

    server.shutdown().await;
    assert!(server.connected_players().is_empty());
    d1.await.unwrap().unwrap();
    d2.await.unwrap().unwrap();
}
