//! Peer connector — transport glue between a replica and the relay.
//!
//! DESIGN
//! ======
//! `Peer::connect` opens the websocket and spawns two tasks:
//! - reader: decodes each inbound payload and applies it to the replica
//! - writer: drains the replica's outbound queue onto the socket
//!
//! The replica lives behind one mutex shared by the reader task, the GUI's
//! gesture calls, and rendering reads, so all three serialize on the same
//! scope. Either task ending marks the peer disconnected, and the reader
//! ending also stops the writer so a lost session cannot keep publishing.
//! There is no automatic reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::command::Command;
use crate::replica::{Action, Replica};

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Connect, read, or write failure on the relay connection. During
    /// `connect` this is fatal; mid-session it leaves the peer in a
    /// lost-connection state.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}

/// One peer's live session: its replica plus the relay connection.
pub struct Peer {
    replica: Arc<Mutex<Replica>>,
    connected: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Peer {
    /// Connect to the relay and start the session.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::Transport` if the initial connect fails.
    pub async fn connect(url: &str) -> Result<Self, PeerError> {
        let (ws, _) = connect_async(url).await?;
        let (mut sink, mut stream) = ws.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Command>();
        let replica = Arc::new(Mutex::new(Replica::new(outbound_tx)));
        let connected = Arc::new(AtomicBool::new(true));
        info!(url, "peer: connected to relay");

        let writer = {
            let connected = Arc::clone(&connected);
            tokio::spawn(async move {
                while let Some(command) = outbound_rx.recv().await {
                    let json = match command.encode() {
                        Ok(j) => j,
                        Err(e) => {
                            warn!(error = %e, "peer: failed to serialize command");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                connected.store(false, Ordering::SeqCst);
            })
        };

        let writer_abort = writer.abort_handle();
        let reader = {
            let replica = Arc::clone(&replica);
            let connected = Arc::clone(&connected);
            tokio::spawn(async move {
                while let Some(msg) = stream.next().await {
                    match msg {
                        Ok(Message::Text(text)) => match Command::decode(&text) {
                            Ok(command) => lock(&replica).apply_remote(command),
                            Err(e) => {
                                // A relay speaking garbage is as gone as a
                                // dead socket.
                                warn!(error = %e, "peer: malformed command from relay");
                                break;
                            }
                        },
                        Ok(Message::Close(_)) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                // A lost session must stop publishing too, not just
                // receiving. Abort before flipping the flag so observers of
                // `is_connected` never see a still-sending writer.
                writer_abort.abort();
                connected.store(false, Ordering::SeqCst);
                info!("peer: connection lost");
            })
        };

        Ok(Self { replica, connected, reader, writer })
    }

    /// Run `f` with exclusive access to the replica. Gesture input and
    /// rendering reads both go through here.
    pub fn with_replica<R>(&self, f: impl FnOnce(&mut Replica) -> R) -> R {
        f(&mut lock(&self.replica))
    }

    /// Snapshot of the canvas for painting.
    #[must_use]
    pub fn current_drawable(&self) -> Vec<Action> {
        lock(&self.replica).current_drawable()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Drop the connection. The replica state is discarded with the peer.
    pub fn close(self) {
        self.reader.abort();
        self.writer.abort();
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Lock the replica, recovering the guard if a panicking writer poisoned it.
fn lock(replica: &Mutex<Replica>) -> MutexGuard<'_, Replica> {
    replica.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "peer_test.rs"]
mod tests;
