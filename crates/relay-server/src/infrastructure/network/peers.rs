//! The peer delivery table.
//!
//! Each connected peer gets a bounded send queue drained by its writer
//! task. The table implements [`PeerSink`], so the application layer can
//! reach peers without knowing about sockets or queues.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use relay_core::ConnectionId;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::application::transport::{PeerSink, SendError};

/// Outbound messages a slow peer may have in flight before further sends
/// to it are dropped.
pub const SEND_QUEUE_DEPTH: usize = 64;

struct PeerHandle {
    addr: SocketAddr,
    queue: mpsc::Sender<Vec<u8>>,
}

/// Registry of connected peers and their send queues.
pub struct PeerTable {
    peers: RwLock<HashMap<ConnectionId, PeerHandle>>,
    // Serializes broadcast passes so two broadcasts cannot interleave
    // their per-peer enqueues.
    broadcast_gate: Mutex<()>,
    next_id: AtomicU64,
}

impl PeerTable {
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            broadcast_gate: Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Hands out a connection id unique for the lifetime of the process.
    pub fn allocate_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Adds a peer and returns the receiving end of its send queue for
    /// the writer task to drain.
    pub async fn register(&self, conn: ConnectionId, addr: SocketAddr) -> mpsc::Receiver<Vec<u8>> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_DEPTH);
        self.peers
            .write()
            .await
            .insert(conn, PeerHandle { addr, queue: tx });
        rx
    }

    /// Removes a peer. Dropping its queue sender ends the writer task.
    pub async fn deregister(&self, conn: ConnectionId) -> bool {
        self.peers.write().await.remove(&conn).is_some()
    }

    pub async fn connected_count(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Drops every peer, closing all writer tasks.
    pub async fn clear(&self) {
        self.peers.write().await.clear();
    }
}

impl Default for PeerTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerSink for PeerTable {
    async fn send(&self, conn: ConnectionId, payload: Vec<u8>) -> Result<(), SendError> {
        let peers = self.peers.read().await;
        let handle = peers.get(&conn).ok_or(SendError::PeerGone(conn))?;
        handle.queue.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull(conn),
            TrySendError::Closed(_) => SendError::PeerGone(conn),
        })
    }

    async fn broadcast(&self, payload: Vec<u8>, exclude: Option<ConnectionId>) {
        let _pass = self.broadcast_gate.lock().await;
        let peers = self.peers.read().await;
        for (conn, handle) in peers.iter() {
            if Some(*conn) == exclude {
                continue;
            }
            if let Err(e) = handle.queue.try_send(payload.clone()) {
                // A full or closed queue drops the notification for that
                // peer only; the pass continues.
                warn!("broadcast to {conn} failed: {e}");
            }
        }
    }

    async fn peer_addr(&self, conn: ConnectionId) -> Option<SocketAddr> {
        self.peers.read().await.get(&conn).map(|h| h.addr)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
