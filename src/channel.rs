//! Connection supervisor — push channel lifecycle and event relay.
//!
//! ARCHITECTURE
//! ============
//! One task owns the WebSocket for its whole life: connect with a bearer
//! handshake, relay inbound events to the store and outbound commands to the
//! socket, and reconnect with a fixed backoff when the connection drops.
//!
//! STATE MACHINE
//! =============
//! `connecting → connected` on a successful handshake, `disconnected` on
//! close, back to `connecting` on retry. Each failed handshake publishes
//! `error`; after five consecutive failures the supervisor gives up and
//! `error` is terminal. A handshake rejected for authentication skips the
//! retry loop entirely — retrying the same bad credential is pointless — and
//! instead schedules a delayed redirect to login.
//!
//! TEARDOWN
//! ========
//! Dropping the command sender (or aborting the task) closes the socket and
//! cancels the backoff timer with it; nothing fires after teardown.

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{info, warn};

use crate::config::Config;
use crate::identity::Redirect;
use crate::store::StoreUpdate;
use crate::wire::{Command, ServerEvent};

// =============================================================================
// CONNECTION STATE
// =============================================================================

/// Push-channel status as observed by the rest of the engine. Owned and
/// mutated exclusively by the supervisor task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Error,
}

#[derive(Debug, thiserror::Error)]
enum HandshakeError {
    #[error("token contains characters not permitted in a header")]
    InvalidToken,
    #[error(transparent)]
    Transport(#[from] tungstenite::Error),
}

/// Why a connected session ended.
enum SessionEnd {
    /// The socket closed or errored; the supervisor should reconnect.
    Dropped,
    /// The command sender was dropped (engine teardown); stop for good.
    Shutdown,
}

// =============================================================================
// SUPERVISOR
// =============================================================================

/// Spawn the connection supervisor. Returns a handle for shutdown.
///
/// Must be called within a tokio runtime.
#[must_use]
pub fn spawn_channel(
    config: Config,
    token: String,
    store_tx: mpsc::Sender<StoreUpdate>,
    command_rx: mpsc::Receiver<Command>,
    redirects: mpsc::Sender<Redirect>,
) -> JoinHandle<()> {
    tokio::spawn(run_supervisor(config, token, store_tx, command_rx, redirects))
}

async fn run_supervisor(
    config: Config,
    token: String,
    store_tx: mpsc::Sender<StoreUpdate>,
    mut command_rx: mpsc::Receiver<Command>,
    redirects: mpsc::Sender<Redirect>,
) {
    let mut failures: u32 = 0;

    loop {
        if publish(&store_tx, ConnectionState::Connecting).await.is_err() {
            return;
        }

        match connect(&config.ws_url, &token).await {
            Ok(socket) => {
                failures = 0;
                info!(url = %config.ws_url, "push channel connected");
                if publish(&store_tx, ConnectionState::Connected).await.is_err() {
                    return;
                }

                let end = run_session(socket, &store_tx, &mut command_rx).await;
                let _ = publish(&store_tx, ConnectionState::Disconnected).await;
                match end {
                    SessionEnd::Shutdown => return,
                    SessionEnd::Dropped => {
                        warn!("push channel dropped; reconnecting");
                    }
                }
            }
            Err(e) if is_auth_rejection(&e) => {
                warn!(error = %e, "push channel handshake rejected for authentication");
                let _ = publish(&store_tx, ConnectionState::Error).await;
                // Give the user a moment to read the error indicator before
                // the host navigates away.
                tokio::time::sleep(config.auth_redirect_delay).await;
                let _ = redirects.send(Redirect::Login).await;
                return;
            }
            Err(e) => {
                failures += 1;
                warn!(
                    error = %e,
                    attempt = failures,
                    max = config.max_reconnect_attempts,
                    "push channel handshake failed"
                );
                if publish(&store_tx, ConnectionState::Error).await.is_err() {
                    return;
                }
                if failures >= config.max_reconnect_attempts {
                    warn!("reconnect budget exhausted; push channel is down until restart");
                    return;
                }
            }
        }

        tokio::time::sleep(config.reconnect_backoff).await;
    }
}

// =============================================================================
// HANDSHAKE
// =============================================================================

/// Open the socket with the bearer token in the upgrade request. The channel
/// authenticates once here, never per message.
async fn connect(
    ws_url: &str,
    token: &str,
) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>, HandshakeError> {
    let mut request = ws_url.into_client_request().map_err(HandshakeError::Transport)?;
    let bearer = format!("Bearer {token}")
        .parse()
        .map_err(|_| HandshakeError::InvalidToken)?;
    request
        .headers_mut()
        .insert(tokio_tungstenite::tungstenite::http::header::AUTHORIZATION, bearer);

    let (socket, _response) = connect_async(request).await?;
    Ok(socket)
}

fn is_auth_rejection(error: &HandshakeError) -> bool {
    match error {
        HandshakeError::Transport(tungstenite::Error::Http(response)) => {
            response.status() == StatusCode::UNAUTHORIZED || response.status() == StatusCode::FORBIDDEN
        }
        _ => false,
    }
}

// =============================================================================
// CONNECTED SESSION
// =============================================================================

/// Relay loop for one live connection: inbound events go to the store in
/// arrival order, outbound commands go to the socket. Duration of a
/// connection, nothing more.
async fn run_session(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    store_tx: &mpsc::Sender<StoreUpdate>,
    command_rx: &mut mpsc::Receiver<Command>,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => {
                                if store_tx.send(StoreUpdate::Event(event)).await.is_err() {
                                    return SessionEnd::Shutdown;
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "ignoring unrecognized push event");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Dropped,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "push channel receive error");
                        return SessionEnd::Dropped;
                    }
                }
            }
            outbound = command_rx.recv() => {
                match outbound {
                    Some(command) => {
                        let Ok(json) = serde_json::to_string(&command) else {
                            continue;
                        };
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            return SessionEnd::Dropped;
                        }
                    }
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return SessionEnd::Shutdown;
                    }
                }
            }
        }
    }
}

async fn publish(
    store_tx: &mpsc::Sender<StoreUpdate>,
    state: ConnectionState,
) -> Result<(), mpsc::error::SendError<StoreUpdate>> {
    store_tx.send(StoreUpdate::Connection(state)).await
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
