//! End-to-end: a host and a viewer talking through a real relay.

use std::time::Duration;

use faceoff::engine::store::keys;
use faceoff::engine::{AbilityCatalog, CatalogError};
use faceoff::prelude::*;
use faceoff::protocol::{PlayerOk, SnapshotRequest};
use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;

type RelaySide = WebSocketStream<TcpStream>;

// =========================================================================
// Helpers
// =========================================================================

async fn start_relay(builder: RelayServerBuilder) -> String {
    let server = builder.bind("127.0.0.1:0").build().await.expect("relay should build");
    let addr = server.local_addr().expect("should have local addr");

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    format!("ws://{addr}")
}

fn store() -> MemoryStore {
    MemoryStore::new()
        .with(keys::PLAYER1, "Ana")
        .with(keys::PLAYER2, "Ben")
        .with(keys::ROUND_COUNT, "3")
}

/// Keeps asking for a snapshot until the host answers, which proves both
/// ends are in the room.
async fn sync(viewer: &RelayClient, events: &mut UnboundedReceiver<ChannelEvent>) -> MatchSnapshot {
    for _ in 0..50 {
        viewer.publish(ChannelEvent::RequestResultSnapshot(SnapshotRequest::default()));
        if let Ok(Some(snapshot)) = timeout(Duration::from_millis(100), next_snapshot(events)).await {
            return snapshot;
        }
    }
    panic!("host never answered");
}

async fn next_snapshot(events: &mut UnboundedReceiver<ChannelEvent>) -> Option<MatchSnapshot> {
    while let Some(event) = events.recv().await {
        if let ChannelEvent::ResultSnapshot(result) = event {
            return Some(result.snapshot);
        }
    }
    None
}

async fn snapshot_where(
    events: &mut UnboundedReceiver<ChannelEvent>,
    pred: impl Fn(&MatchSnapshot) -> bool,
) -> MatchSnapshot {
    timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = next_snapshot(events).await.expect("viewer stream ended");
            if pred(&snapshot) {
                return snapshot;
            }
        }
    })
    .await
    .expect("expected snapshot never arrived")
}

/// Accepts one websocket, standing in for a relay that can be killed.
async fn accept(listener: &TcpListener) -> RelaySide {
    let (stream, _) = listener.accept().await.expect("accept");
    tokio_tungstenite::accept_async(stream).await.expect("handshake")
}

async fn next_event(ws: &mut RelaySide, name: &str) -> Value {
    timeout(Duration::from_secs(2), async {
        loop {
            let msg = ws.next().await.expect("host hung up").expect("recv");
            if !(msg.is_text() || msg.is_binary()) {
                continue;
            }
            let value: Value = serde_json::from_slice(&msg.into_data()).expect("decode");
            if value["event"] == name {
                return value;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{name} never arrived"))
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_viewer_follows_the_host() {
    let url = start_relay(RelayServer::builder()).await;
    let id = MatchId::new("g-7");

    let (viewer, mut events) = RelayClient::connect(&url, id.clone()).await.unwrap();
    assert!(viewer.join(Role::Viewer).is_sent());

    let host = connect_host(&url, HostConfig::new(id), store(), LogPresenter)
        .await
        .unwrap();

    let first = sync(&viewer, &mut events).await;
    assert_eq!(first.round, 0);
    assert_eq!(first.player1, "Ana");
    assert_eq!(first.player2, "Ben");

    host.adjust_score("Ana", 40).await.unwrap();
    let snap = snapshot_where(&mut events, |s| s.scores.get("Ana") == Some(&40)).await;
    assert_eq!(snap.scores["Ben"], 0);

    host.confirm_round().await.unwrap();
    let snap = snapshot_where(&mut events, |s| s.round == 1).await;
    assert_eq!(snap.scores["Ana"], 40);

    let mut view = ViewerState::new(MatchId::new("g-7"));
    assert!(view.apply(snap.clone()));
    assert!(!view.apply(snap));
    assert_eq!(view.score(Side::Right), Some(40));
    assert_eq!(view.player(Side::Left), Some("Ben"));
}

#[tokio::test]
async fn test_player_ok_reaches_the_host() {
    let url = start_relay(RelayServer::builder()).await;
    let id = MatchId::new("g-8");

    let (viewer, mut events) = RelayClient::connect(&url, id.clone()).await.unwrap();
    viewer.join(Role::Viewer);
    let host = connect_host(&url, HostConfig::new(id.clone()), store(), LogPresenter)
        .await
        .unwrap();
    sync(&viewer, &mut events).await;

    viewer.publish(ChannelEvent::PlayerOk(PlayerOk {
        match_id: Some(id),
        player_name: Some("Ben".into()),
        side: Side::Left,
        active: true,
    }));

    let snap = snapshot_where(&mut events, |s| s.ok.left.active).await;
    assert!(!snap.ok.right.active);
    assert!(host.snapshot().await.unwrap().ok.left.active);
}

#[tokio::test]
async fn test_added_ability_lands_in_relay_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.jsonl");
    let url = start_relay(RelayServer::builder().catalog_path(&path)).await;
    let id = MatchId::new("g-9");

    let (notify_tx, mut notices) = mpsc::unbounded_channel();
    let host = connect_host(&url, HostConfig::new(id), store(), notify_tx)
        .await
        .unwrap();

    host.add_ability("Ana", "Fireball").await.unwrap();

    let mut lines = Vec::new();
    for _ in 0..100 {
        lines = std::fs::read_to_string(&path)
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .collect();
        if !lines.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["text"], "Fireball");

    while let Ok(notice) = notices.try_recv() {
        assert!(!matches!(notice, Notice::CatalogWriteFailed { .. }));
    }
}

#[tokio::test]
async fn test_catalog_without_relay_log_is_rejected() {
    let url = start_relay(RelayServer::builder()).await;
    let (client, _events) = RelayClient::connect(&url, MatchId::new("g-1")).await.unwrap();

    let err = client.append("Mirror".into()).await.unwrap_err();

    assert!(matches!(err, CatalogError::Rejected(_)));
}

#[tokio::test]
async fn test_connect_to_nothing_fails() {
    let err = RelayClient::connect("ws://127.0.0.1:1", MatchId::new("g-1"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, FaceoffError::Transport(_)));
}

#[tokio::test]
async fn test_host_takes_stored_game_id_as_room() {
    let url = start_relay(RelayServer::builder()).await;
    let id = MatchId::new("g-11");

    let (viewer, mut events) = RelayClient::connect(&url, id).await.unwrap();
    viewer.join(Role::Viewer);
    let _host = connect_host(
        &url,
        HostConfig::default(),
        store().with(keys::GAME_ID, "g-11"),
        LogPresenter,
    )
    .await
    .unwrap();

    let first = sync(&viewer, &mut events).await;
    assert_eq!(first.player1, "Ana");
}

#[tokio::test]
async fn test_host_rejoins_after_relay_restart() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let config = HostConfig::new(MatchId::new("g-10"))
        .with_rejoin(RejoinSchedule::new(vec![Duration::ZERO]));
    let client_config = ClientConfig::default().with_reconnect_delay(Duration::from_millis(20));

    let (host, mut first) = tokio::join!(
        connect_host_with(&url, config, client_config, store(), LogPresenter),
        accept(&listener),
    );
    let host = host.unwrap();
    let join = next_event(&mut first, "join").await;
    assert_eq!(join["data"]["matchId"], "g-10");

    first.close(None).await.unwrap();
    drop(first);

    let mut second = timeout(Duration::from_secs(2), accept(&listener))
        .await
        .expect("host never re-dialed");
    let join = next_event(&mut second, "join").await;
    assert_eq!(join["data"]["matchId"], "g-10");

    host.adjust_score("Ana", 5).await.unwrap();
    loop {
        let snap = next_event(&mut second, "resultSnapshot").await;
        if snap["data"]["snapshot"]["scores"]["Ana"] == 5 {
            break;
        }
    }
}
