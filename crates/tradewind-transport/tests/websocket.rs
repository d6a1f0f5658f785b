//! Integration tests for the WebSocket connection.
//!
//! These spin up a real listener on a random port and a
//! `tokio-tungstenite` client, then check frames flow both ways.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;
    use tradewind_transport::{Connection, WebSocketConnection, WebSocketTransport};

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on port 0, connects one client, and returns both ends.
    async fn connected_pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let server = server_handle.await.expect("task should complete");
        (server, client)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (server_conn, mut client_ws) = connected_pair().await;
        assert!(server_conn.id().into_inner() > 0);
        assert!(server_conn.is_open());

        // Server sends text; the client sees a text frame.
        server_conn
            .send(b"<endTurn/>")
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.into_data().as_ref(), b"<endTurn/>");

        // Client sends; the server receives the raw bytes.
        client_ws
            .send(Message::Text(String::from("<emigrate slot=\"0\"/>").into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"<emigrate slot=\"0\"/>");

        server_conn.close().await.expect("close should succeed");
        assert!(!server_conn.is_open());
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_pending() {
        // A task parked in recv must not block a send on the same connection.
        let (server_conn, mut client_ws) = connected_pair().await;
        let server_conn = std::sync::Arc::new(server_conn);

        let receiver = {
            let conn = std::sync::Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::task::yield_now().await;

        server_conn.send(b"<endTurn/>").await.unwrap();
        let echoed = client_ws.next().await.unwrap().unwrap();
        client_ws.send(echoed).await.unwrap();

        let received = receiver.await.unwrap().unwrap().unwrap();
        assert_eq!(received, b"<endTurn/>");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
        assert!(!server_conn.is_open());
    }

    #[tokio::test]
    async fn test_websocket_send_after_close_fails() {
        let (server_conn, _client_ws) = connected_pair().await;
        server_conn.close().await.unwrap();
        // Second close is a no-op.
        server_conn.close().await.unwrap();

        let result = server_conn.send(b"<endTurn/>").await;
        assert!(result.unwrap_err().is_closed());
    }
}
