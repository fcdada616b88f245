use super::*;
use std::time::Duration;

use axum::Router;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::routing::any;
use tokio::time::timeout;

use crate::store::StoreUpdate;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

fn fast_config(ws_url: &str) -> Config {
    let mut config = Config::new("http://unused", ws_url);
    config.reconnect_backoff = Duration::from_millis(10);
    config.auth_redirect_delay = Duration::from_millis(10);
    config
}

struct Harness {
    store_rx: mpsc::Receiver<StoreUpdate>,
    command_tx: mpsc::Sender<Command>,
    redirect_rx: mpsc::Receiver<Redirect>,
    handle: JoinHandle<()>,
}

fn start(config: Config) -> Harness {
    let (store_tx, store_rx) = mpsc::channel(64);
    let (command_tx, command_rx) = mpsc::channel(8);
    let (redirect_tx, redirect_rx) = mpsc::channel(4);
    let handle = spawn_channel(config, "tok".into(), store_tx, command_rx, redirect_tx);
    Harness { store_rx, command_tx, redirect_rx, handle }
}

async fn recv_update(rx: &mut mpsc::Receiver<StoreUpdate>) -> StoreUpdate {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("store update timed out")
        .expect("store channel closed unexpectedly")
}

/// Drain remaining updates until the supervisor task ends.
async fn drain_updates(mut rx: mpsc::Receiver<StoreUpdate>) -> Vec<StoreUpdate> {
    let mut updates = Vec::new();
    while let Ok(Some(update)) = timeout(Duration::from_secs(2), rx.recv()).await {
        updates.push(update);
    }
    updates
}

fn event_server() -> Router {
    Router::new().route(
        "/ws",
        any(|ws: WebSocketUpgrade| async move {
            ws.on_upgrade(|mut socket: WebSocket| async move {
                let event =
                    r#"{"event":"slot-updated","data":{"slotTime":"10:00","userId":7,"username":"ada"}}"#;
                let _ = socket.send(WsMessage::Text(event.into())).await;
                while socket.recv().await.is_some() {}
            })
        }),
    )
}

// =============================================================
// Handshake and event relay
// =============================================================

#[tokio::test]
async fn handshake_connects_and_relays_events_in_order() {
    let ws_url = serve(event_server()).await;
    let mut harness = start(fast_config(&ws_url));

    assert_eq!(
        recv_update(&mut harness.store_rx).await,
        StoreUpdate::Connection(ConnectionState::Connecting)
    );
    assert_eq!(
        recv_update(&mut harness.store_rx).await,
        StoreUpdate::Connection(ConnectionState::Connected)
    );
    assert_eq!(
        recv_update(&mut harness.store_rx).await,
        StoreUpdate::Event(ServerEvent::SlotUpdated {
            slot_time: "10:00".parse().unwrap(),
            user_id: 7,
            username: "ada".into(),
        })
    );
}

#[tokio::test]
async fn malformed_push_events_are_dropped_not_fatal() {
    let app = Router::new().route(
        "/ws",
        any(|ws: WebSocketUpgrade| async move {
            ws.on_upgrade(|mut socket: WebSocket| async move {
                let _ = socket.send(WsMessage::Text("{not json".into())).await;
                let _ = socket
                    .send(WsMessage::Text(
                        r#"{"event":"slot-cleared","data":{"slotTime":"10:00"}}"#.into(),
                    ))
                    .await;
                while socket.recv().await.is_some() {}
            })
        }),
    );
    let ws_url = serve(app).await;
    let mut harness = start(fast_config(&ws_url));

    recv_update(&mut harness.store_rx).await; // connecting
    recv_update(&mut harness.store_rx).await; // connected
    // The garbage frame is skipped; the next good event still arrives.
    assert_eq!(
        recv_update(&mut harness.store_rx).await,
        StoreUpdate::Event(ServerEvent::SlotCleared { slot_time: "10:00".parse().unwrap() })
    );
}

// =============================================================
// Outbound commands
// =============================================================

#[tokio::test]
async fn commands_are_sent_over_the_socket() {
    // Echo server: a valid book-slot command is answered with an echo event.
    let app = Router::new().route(
        "/ws",
        any(|ws: WebSocketUpgrade| async move {
            ws.on_upgrade(|mut socket: WebSocket| async move {
                while let Some(Ok(message)) = socket.recv().await {
                    let WsMessage::Text(text) = message else { continue };
                    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                    assert_eq!(value["event"], "book-slot");
                    assert_eq!(value["data"]["slotTime"], "10:00");
                    assert_eq!(value["data"]["slotPeriod"], "AM");
                    let echo =
                        r#"{"event":"slot-updated","data":{"slotTime":"10:00","userId":7,"username":"ada"}}"#;
                    let _ = socket.send(WsMessage::Text(echo.into())).await;
                }
            })
        }),
    );
    let ws_url = serve(app).await;
    let mut harness = start(fast_config(&ws_url));

    recv_update(&mut harness.store_rx).await; // connecting
    recv_update(&mut harness.store_rx).await; // connected

    harness
        .command_tx
        .send(Command::BookSlot {
            slot_time: "10:00".parse().unwrap(),
            slot_period: crate::slot::Period::Am,
        })
        .await
        .unwrap();

    assert_eq!(
        recv_update(&mut harness.store_rx).await,
        StoreUpdate::Event(ServerEvent::SlotUpdated {
            slot_time: "10:00".parse().unwrap(),
            user_id: 7,
            username: "ada".into(),
        })
    );
}

// =============================================================
// Failure paths
// =============================================================

#[tokio::test]
async fn auth_rejected_handshake_redirects_instead_of_retrying() {
    let app = Router::new().route("/ws", any(|| async { StatusCode::UNAUTHORIZED }));
    let ws_url = serve(app).await;
    let mut harness = start(fast_config(&ws_url));

    let redirect = timeout(Duration::from_secs(2), harness.redirect_rx.recv())
        .await
        .expect("redirect timed out")
        .expect("redirect channel closed");
    assert_eq!(redirect, Redirect::Login);

    timeout(Duration::from_secs(2), harness.handle)
        .await
        .expect("supervisor should stop")
        .expect("supervisor panicked");

    let updates = drain_updates(harness.store_rx).await;
    let connecting = updates
        .iter()
        .filter(|u| **u == StoreUpdate::Connection(ConnectionState::Connecting))
        .count();
    // One attempt only: retrying a rejected credential is pointless.
    assert_eq!(connecting, 1);
    assert_eq!(updates.last(), Some(&StoreUpdate::Connection(ConnectionState::Error)));
}

#[tokio::test]
async fn five_failed_handshakes_settle_in_terminal_error() {
    // Bind and drop to get a refusing port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let harness = start(fast_config(&format!("ws://{addr}/ws")));

    timeout(Duration::from_secs(5), harness.handle)
        .await
        .expect("supervisor should give up")
        .expect("supervisor panicked");

    let updates = drain_updates(harness.store_rx).await;
    let connecting = updates
        .iter()
        .filter(|u| **u == StoreUpdate::Connection(ConnectionState::Connecting))
        .count();
    // Exactly five attempts, no sixth.
    assert_eq!(connecting, 5);
    assert!(!updates.contains(&StoreUpdate::Connection(ConnectionState::Connected)));
    assert_eq!(updates.last(), Some(&StoreUpdate::Connection(ConnectionState::Error)));
}

#[tokio::test]
async fn dropping_the_command_sender_tears_the_channel_down() {
    let ws_url = serve(event_server()).await;
    let mut harness = start(fast_config(&ws_url));

    recv_update(&mut harness.store_rx).await; // connecting
    recv_update(&mut harness.store_rx).await; // connected

    drop(harness.command_tx);

    timeout(Duration::from_secs(2), harness.handle)
        .await
        .expect("supervisor should stop on teardown")
        .expect("supervisor panicked");

    // The session ends disconnected and no reconnect attempt follows.
    let updates = drain_updates(harness.store_rx).await;
    assert!(updates.contains(&StoreUpdate::Connection(ConnectionState::Disconnected)));
    assert!(!updates.contains(&StoreUpdate::Connection(ConnectionState::Connecting)));
}
