//! TCP listener and per-connection tasks.
//!
//! Each accepted connection gets a reader task (frames in, events out)
//! and a writer task (queued payloads out, length-prefixed). The reader
//! removes the peer from the delivery table before emitting the
//! disconnect event, so broadcasts triggered by the disconnect never
//! target the departed peer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use relay_core::protocol::framing::{encode_frame, payload_len, HEADER_LEN};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::transport::TransportEvent;
use crate::infrastructure::network::peers::PeerTable;
use relay_core::ConnectionId;

/// Upper bound on one accept wait before re-checking shutdown.
const ACCEPT_WAIT: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to bind listener on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Binds the relay's listening socket.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, NetworkError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| NetworkError::BindFailed { addr, source })
}

/// Accepts connections until shutdown, refusing new peers beyond
/// `max_connections`.
pub async fn run_accept_loop(
    listener: TcpListener,
    max_connections: usize,
    peers: Arc<PeerTable>,
    events: mpsc::Sender<TransportEvent>,
    shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        match timeout(ACCEPT_WAIT, listener.accept()).await {
            Ok(Ok((stream, addr))) => {
                if peers.connected_count().await >= max_connections {
                    warn!("refusing connection from {addr}: peer limit {max_connections} reached");
                    drop(stream);
                    continue;
                }
                let conn = peers.allocate_id();
                let queue_rx = peers.register(conn, addr).await;
                let (read_half, write_half) = stream.into_split();
                tokio::spawn(run_connection_writer(conn, write_half, queue_rx));
                // Connected must be in the queue before the reader can
                // produce the peer's first Received event.
                if events.send(TransportEvent::Connected { conn, addr }).await.is_err() {
                    break;
                }
                tokio::spawn(run_connection_reader(
                    conn,
                    read_half,
                    Arc::clone(&peers),
                    events.clone(),
                    shutdown.clone(),
                ));
            }
            Ok(Err(e)) => error!("accept failed: {e}"),
            Err(_) => {} // no connection within the window, re-check shutdown
        }
    }
    info!("accept loop stopped");
}

/// Reads length-prefixed frames and forwards the payloads as events.
/// Any framing violation or read error ends the connection.
async fn run_connection_reader(
    conn: ConnectionId,
    mut read_half: OwnedReadHalf,
    peers: Arc<PeerTable>,
    events: mpsc::Sender<TransportEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let mut header = [0u8; HEADER_LEN];
        tokio::select! {
            result = read_half.read_exact(&mut header) => {
                match result {
                    Ok(_) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                        debug!("{conn}: connection closed");
                        break;
                    }
                    Err(e) => {
                        warn!("{conn}: read failed: {e}");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => break,
        }
        let len = match payload_len(header) {
            Ok(len) => len,
            Err(e) => {
                warn!("{conn}: invalid frame header: {e}");
                break;
            }
        };
        let mut payload = vec![0u8; len];
        if let Err(e) = read_half.read_exact(&mut payload).await {
            warn!("{conn}: read failed mid-frame: {e}");
            break;
        }
        if events
            .send(TransportEvent::Received { conn, payload })
            .await
            .is_err()
        {
            break;
        }
    }
    // Out of the delivery table first, then the disconnect event, so the
    // purge broadcast cannot target this peer.
    peers.deregister(conn).await;
    let _ = events.send(TransportEvent::Disconnected { conn }).await;
}

/// Drains the peer's send queue onto the socket, one frame per payload.
/// Ends when the queue closes or a write fails.
async fn run_connection_writer(
    conn: ConnectionId,
    mut write_half: OwnedWriteHalf,
    mut queue: mpsc::Receiver<Vec<u8>>,
) {
    while let Some(payload) = queue.recv().await {
        let frame = encode_frame(&payload);
        if let Err(e) = write_half.write_all(&frame).await {
            warn!("{conn}: write failed: {e}");
            break;
        }
    }
    debug!("{conn}: writer stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
