//! # relay-core
//!
//! Shared library for the game server relay containing the wire protocol
//! codec and the in-memory server registry.
//!
//! This crate is used by the relay daemon and by any tooling that speaks the
//! relay protocol. It has zero dependencies on sockets, timers, or the async
//! runtime – everything here is pure and synchronously testable.
//!
//! # Protocol overview
//!
//! The relay is a rendezvous point for multiplayer game servers. A game
//! server registers itself (`add`) or is auto-advertised (`advertise`) with
//! an address, port, and the identifier of the game system it hosts. Clients
//! query the relay (`list`, `find_peer`) to discover servers, and servers
//! send periodic heartbeats (`ping`) to stay listed. Stale entries are
//! evicted and their removal is announced to every connected peer.
//!
//! This crate defines:
//!
//! - **`protocol`** – How bytes travel over the wire. Messages are
//!   line-oriented UTF-8 text carried inside length-prefixed frames; the
//!   codec parses them into typed [`Command`]s and serializes typed
//!   [`Response`]s and [`Notification`]s back to text.
//!
//! - **`domain`** – Pure business state. The [`ServerRegistry`] owns the
//!   mapping from generated identifiers to server records and enforces the
//!   ownership and expiry rules.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `relay_core::ServerRegistry` instead of the full module path.
pub use domain::registry::{ConnectionId, ServerId, ServerRecord, ServerRegistry};
pub use protocol::command::{decode_command, Command, DecodeError};
pub use protocol::response::{Notification, Response};
