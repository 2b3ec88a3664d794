//! Request dispatch: one decoded command in, one reply out, plus any
//! broadcast notifications the command triggers.

use std::sync::Arc;
use std::time::Instant;

use relay_core::{decode_command, Command, ConnectionId, DecodeError};
use relay_core::{Notification, Response, ServerRegistry};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::transport::{PeerSink, TransportEvent};

/// Handles transport events against the shared registry.
///
/// The registry lock is held only for the registry operation itself; all
/// replies and broadcasts go out after the lock is released.
pub struct Dispatcher {
    registry: Arc<Mutex<ServerRegistry>>,
    peers: Arc<dyn PeerSink>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Mutex<ServerRegistry>>, peers: Arc<dyn PeerSink>) -> Self {
        Self { registry, peers }
    }

    /// Entry point for the event loop.
    pub async fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Connected { conn, addr } => {
                info!("peer connected: {addr} as {conn}");
            }
            TransportEvent::Received { conn, payload } => {
                self.handle_message(conn, &payload).await;
            }
            TransportEvent::Disconnected { conn } => {
                self.handle_disconnect(conn).await;
            }
        }
    }

    /// Decodes one message and dispatches it. Malformed payloads are
    /// dropped without a reply; recognizable-but-invalid requests get an
    /// error reply echoing their keyword.
    pub async fn handle_message(&self, conn: ConnectionId, payload: &[u8]) {
        match decode_command(payload) {
            Ok(command) => self.dispatch(conn, command).await,
            Err(DecodeError::Malformed(reason)) => {
                warn!("{conn}: dropping malformed message: {reason}");
            }
            Err(DecodeError::Invalid { command, message }) => {
                warn!("{conn}: invalid {command} request: {message}");
                self.reply(conn, Response::CommandError { command, message })
                    .await;
            }
            Err(DecodeError::Unknown { command }) => {
                warn!("{conn}: unknown command {command:?}");
                self.reply(
                    conn,
                    Response::CommandError {
                        command,
                        message: "Unknown command".to_string(),
                    },
                )
                .await;
            }
        }
    }

    async fn dispatch(&self, conn: ConnectionId, command: Command) {
        match command {
            Command::Add {
                addr,
                port,
                system,
                name,
            } => {
                let id = {
                    let mut registry = self.registry.lock().await;
                    registry.register(addr, port, system, name, conn)
                };
                info!("{conn}: registered server {id}");
                self.reply(conn, Response::AddOk(id.to_string())).await;
            }
            Command::List => {
                let snapshot = {
                    let registry = self.registry.lock().await;
                    registry.snapshot()
                };
                debug!("{conn}: listing {} servers", snapshot.len());
                self.reply(conn, Response::List(snapshot)).await;
            }
            Command::Ping { server_id } => {
                let touched = {
                    let mut registry = self.registry.lock().await;
                    registry.touch(&server_id, Instant::now())
                };
                if touched {
                    debug!("{conn}: heartbeat for {server_id}");
                    self.reply(conn, Response::PingOk(server_id)).await;
                } else {
                    warn!("{conn}: heartbeat for unknown server {server_id}");
                    self.reply(conn, Response::PingUnknown(server_id)).await;
                }
            }
            Command::Remove { server_id } => {
                let removed = {
                    let mut registry = self.registry.lock().await;
                    registry.remove(&server_id)
                };
                // Removal is silent: no deadvertise goes out for it.
                match removed {
                    Some(record) => {
                        info!("{conn}: removed server {} hosting {}", record.id, record.system);
                        self.reply(conn, Response::RemoveOk(server_id)).await;
                    }
                    None => {
                        warn!("{conn}: remove for unknown server {server_id}");
                        self.reply(conn, Response::RemoveUnknown(server_id)).await;
                    }
                }
            }
            Command::Advertise { system } => {
                let Some(addr) = self.peers.peer_addr(conn).await else {
                    warn!("{conn}: advertise from unknown peer, dropping");
                    return;
                };
                let id = {
                    let mut registry = self.registry.lock().await;
                    registry.register(
                        addr.ip().to_string(),
                        addr.port(),
                        system.clone(),
                        "Unknown".to_string(),
                        conn,
                    )
                };
                info!("{conn}: advertised {system} from {addr} as {id}");
                // Ack the advertiser before other peers hear about it.
                self.reply(conn, Response::AdvertiseOk(id.to_string())).await;
                self.peers
                    .broadcast(Notification::Advertise { system }.encode(), Some(conn))
                    .await;
            }
            Command::Deadvertise { system } => {
                let removed = {
                    let mut registry = self.registry.lock().await;
                    registry.remove_owned_system(&system, conn)
                };
                match removed {
                    Some(record) => {
                        info!("{conn}: deadvertised {system} ({})", record.id);
                        self.reply(conn, Response::DeadvertiseOk(record.id.to_string()))
                            .await;
                        self.peers
                            .broadcast(Notification::Deadvertise { system }.encode(), Some(conn))
                            .await;
                    }
                    None => {
                        warn!("{conn}: deadvertise for {system} not hosted by this peer");
                        self.reply(conn, Response::DeadvertiseUnknown).await;
                    }
                }
            }
            Command::FindPeer { system } => {
                let found = {
                    let registry = self.registry.lock().await;
                    registry.find_system(&system).cloned()
                };
                match found {
                    Some(record) => {
                        debug!("{conn}: find_peer matched {} for {system}", record.id);
                        self.reply(conn, Response::FindPeerMatch(record)).await;
                    }
                    None => {
                        debug!("{conn}: find_peer miss for {system}");
                        self.reply(conn, Response::FindPeerMiss).await;
                    }
                }
            }
        }
    }

    /// Purges every server the departed peer registered and deadvertises
    /// each one to the remaining peers.
    pub async fn handle_disconnect(&self, conn: ConnectionId) {
        let purged = {
            let mut registry = self.registry.lock().await;
            registry.remove_owned_by(conn)
        };
        info!("peer disconnected: {conn}, purging {} servers", purged.len());
        for record in purged {
            info!("purged server {} hosting {}", record.id, record.system);
            self.peers
                .broadcast(
                    Notification::Deadvertise {
                        system: record.system,
                    }
                    .encode(),
                    None,
                )
                .await;
        }
    }

    async fn reply(&self, conn: ConnectionId, response: Response) {
        if let Err(e) = self.peers.send(conn, response.encode()).await {
            warn!("failed to send reply to {conn}: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
