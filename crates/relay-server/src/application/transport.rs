//! The seam between the application layer and the transport adapter.
//!
//! The adapter feeds the application a stream of [`TransportEvent`]s and
//! exposes outbound delivery through the [`PeerSink`] trait, so the
//! dispatcher and sweeper never touch sockets directly.

use std::net::SocketAddr;

use async_trait::async_trait;
use relay_core::ConnectionId;
use thiserror::Error;

// ── Inbound events ────────────────────────────────────────────────────────────

/// A transport-level event delivered to the application event loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// A peer completed its connection handshake.
    Connected {
        conn: ConnectionId,
        addr: SocketAddr,
    },
    /// A peer's connection ended, cleanly or otherwise. The peer has
    /// already been removed from the delivery table when this arrives.
    Disconnected { conn: ConnectionId },
    /// One complete message payload arrived from a peer.
    Received {
        conn: ConnectionId,
        payload: Vec<u8>,
    },
}

// ── Outbound delivery ─────────────────────────────────────────────────────────

/// Failure to hand a payload to a peer's send queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("peer {0} is not connected")]
    PeerGone(ConnectionId),
    #[error("send queue for peer {0} is full")]
    QueueFull(ConnectionId),
}

/// Outbound message delivery to connected peers.
///
/// `send` targets one peer; `broadcast` fans a payload out to every
/// connected peer, optionally excluding the peer that triggered it.
/// Implementations must keep each broadcast pass atomic with respect to
/// other broadcasts so interleaved notifications cannot reorder.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PeerSink: Send + Sync {
    /// Queues `payload` for delivery to a single peer.
    async fn send(&self, conn: ConnectionId, payload: Vec<u8>) -> Result<(), SendError>;

    /// Queues `payload` for every connected peer except `exclude`.
    async fn broadcast(&self, payload: Vec<u8>, exclude: Option<ConnectionId>);

    /// The remote address the peer connected from, if it is still present.
    async fn peer_addr(&self, conn: ConnectionId) -> Option<SocketAddr>;
}
