use super::*;
use axum::Router;
use axum::extract::ws::{Message as ServerMessage, WebSocketUpgrade};
use axum::routing::get;
use std::net::SocketAddr;
use tokio::time::{Duration, sleep};

/// Relay stand-in that greets each connection with a malformed payload and
/// then records everything the peer sends.
async fn spawn_faulty_relay(seen_tx: mpsc::UnboundedSender<String>) -> SocketAddr {
    let app = Router::new().route(
        "/ws",
        get(move |ws: WebSocketUpgrade| {
            let seen_tx = seen_tx.clone();
            async move {
                ws.on_upgrade(move |mut socket| async move {
                    let _ = socket.send(ServerMessage::Text("not a command".into())).await;
                    while let Some(Ok(msg)) = socket.recv().await {
                        if let ServerMessage::Text(text) = msg {
                            let _ = seen_tx.send(text.to_string());
                        }
                    }
                })
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("faulty relay failed");
    });
    addr
}

#[tokio::test]
async fn malformed_inbound_stops_both_halves() {
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let addr = spawn_faulty_relay(seen_tx).await;
    let peer = Peer::connect(&format!("ws://{addr}/ws")).await.expect("connect");

    for _ in 0..200 {
        if !peer.is_connected() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(!peer.is_connected(), "decode failure should mark the peer lost");

    // Gestures still fold locally but no longer reach the wire.
    peer.with_replica(|r| {
        r.pointer_down(0, 0);
        r.pointer_moved(5, 5);
        r.pointer_up();
    });
    sleep(Duration::from_millis(100)).await;

    assert_eq!(peer.current_drawable().len(), 1);
    assert!(seen_rx.try_recv().is_err(), "lost peer must not keep publishing");
}

#[tokio::test]
async fn connect_failure_is_fatal_transport_error() {
    let err = Peer::connect("ws://127.0.0.1:1/ws")
        .await
        .err()
        .expect("connect to a closed port must fail");
    assert!(matches!(err, PeerError::Transport(_)));
}
