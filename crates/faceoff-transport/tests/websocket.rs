//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and dial it with
//! the crate's own client, so both halves of the transport are exercised.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use faceoff_transport::{
        connect, Connection, ServerConnection, Transport, WebSocketTransport,
    };

    /// Binds on a random port, dials it, and returns both ends.
    async fn pair() -> (ServerConnection, faceoff_transport::ClientConnection) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address");

        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = connect(&format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let server = server.await.expect("accept task should complete");
        (server, client)
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (server, client) = pair().await;
        assert_ne!(server.id(), client.id());

        server.send(b"{\"hello\":\"viewer\"}").await.unwrap();
        let got = client.recv().await.unwrap().expect("frame");
        assert_eq!(got, b"{\"hello\":\"viewer\"}");

        client.send(b"{\"hello\":\"relay\"}").await.unwrap();
        let got = server.recv().await.unwrap().expect("frame");
        assert_eq!(got, b"{\"hello\":\"relay\"}");
    }

    #[tokio::test]
    async fn test_binary_frames_survive() {
        let (server, client) = pair().await;

        client.send(&[0xff, 0x00, 0x10]).await.unwrap();
        let got = server.recv().await.unwrap().expect("frame");
        assert_eq!(got, vec![0xff, 0x00, 0x10]);
    }

    #[tokio::test]
    async fn test_send_is_not_blocked_by_pending_recv() {
        let (server, client) = pair().await;
        let client = std::sync::Arc::new(client);

        // Park a reader on the client; the write half must stay usable.
        let reader = {
            let client = std::sync::Arc::clone(&client);
            tokio::spawn(async move { client.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), client.send(b"ping"))
            .await
            .expect("send should not wait for the reader")
            .unwrap();
        assert_eq!(server.recv().await.unwrap().unwrap(), b"ping");

        server.send(b"pong").await.unwrap();
        let echoed = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(echoed, b"pong");
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_peer_closes() {
        let (server, client) = pair().await;

        client.close().await.expect("close should succeed");

        let result = server.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on clean close");
    }

    #[tokio::test]
    async fn test_connect_to_nothing_fails() {
        // Grab a free port, then release it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = connect(&format!("ws://{addr}")).await.err().expect("error");
        assert!(err.to_string().contains("connect to"));
    }
}
