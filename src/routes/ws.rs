//! WebSocket handler — the per-connection relay loop.
//!
//! DESIGN
//! ======
//! On upgrade, the connection registers an outbound channel and enters a
//! `select!` loop:
//! - Incoming peer payloads → decode + broadcast to every other peer
//! - Commands broadcast by other peers → forward down this socket
//!
//! The relay is pure: it never inspects a command beyond decoding and holds
//! no drawing state. Ordering is per-originator — commands arriving on one
//! connection are broadcast in arrival order, with no guarantee across
//! connections.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register with the registry (connection becomes active)
//! 2. Each inbound command → broadcast excluding the sender
//! 3. Stream closure, read/write failure, decode failure, or removal from
//!    the registry (dead or lagging channel) → closed: unregister and drop
//!    the socket. Failures never escape the connection.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::command::Command;
use crate::registry::ConnectionId;
use crate::state::AppState;

/// Outbound queue depth per connection. A peer that falls this far behind
/// is dropped by the registry.
const OUTBOUND_BUFFER: usize = 256;

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

async fn run_ws(mut socket: WebSocket, state: AppState) {
    // Per-connection channel for receiving broadcast commands from peers.
    let (tx, mut rx) = mpsc::channel::<Command>(OUTBOUND_BUFFER);
    let conn_id = state.registry.register(tx).await;
    info!(%conn_id, "relay: peer connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let command = match Command::decode(&text) {
                            Ok(command) => command,
                            Err(e) => {
                                // Faulty peer: tear down this connection only.
                                warn!(%conn_id, error = %e, "relay: malformed command");
                                break;
                            }
                        };
                        state.registry.broadcast(&command, Some(conn_id)).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            command = rx.recv() => {
                // None means the registry dropped this connection (dead or
                // lagging channel); close the socket rather than leave the
                // peer half-alive with no inbound delivery.
                let Some(command) = command else { break };
                if send_command(&mut socket, conn_id, &command).await.is_err() {
                    break;
                }
            }
        }
    }

    state.registry.unregister(conn_id).await;
    info!(%conn_id, "relay: peer disconnected");
}

async fn send_command(
    socket: &mut WebSocket,
    conn_id: ConnectionId,
    command: &Command,
) -> Result<(), ()> {
    let json = match command.encode() {
        Ok(j) => j,
        Err(e) => {
            warn!(%conn_id, error = %e, "relay: failed to serialize command");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
