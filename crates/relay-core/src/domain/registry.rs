//! The server registry: records, ownership, and expiry.
//!
//! The registry is the relay's only state. Every registered game server is a
//! [`ServerRecord`] keyed by a [`ServerId`] that the registry itself
//! generates – identifiers are never client-supplied, and a fresh v4 UUID
//! per registration makes them unique for the registry's lifetime.
//!
//! # Ownership
//!
//! Each record remembers the [`ConnectionId`] of the transport connection
//! that created it. Ownership is used for exactly two things: the
//! `deadvertise` lookup (system + owner must both match) and the disconnect
//! purge (all records owned by a closing connection are removed). It is
//! deliberately **not** checked by `remove` or `ping` – any peer may remove
//! or refresh any record it can name. That permissiveness is part of the
//! protocol as deployed and is preserved here.
//!
//! # Iteration order
//!
//! Records live in a `BTreeMap` so that snapshots and first-match lookups
//! are deterministic for a fixed registry state. The wire protocol leaves
//! `list` ordering unspecified, but a stable order keeps `find_peer`
//! reproducible and the tests honest.
//!
//! # Concurrency
//!
//! The registry itself is single-threaded by design; the daemon wraps it in
//! one mutex shared by the dispatcher and the expiry sweeper. All methods
//! take `&self`/`&mut self` so the guard covers reads and writes alike.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use uuid::Uuid;

/// Identifier of a registered server, generated by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerId(Uuid);

impl ServerId {
    /// Generates a fresh identifier.
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier from its wire form. Returns `None` for strings
    /// that were never produced by [`ServerId::to_string`] – callers treat
    /// those the same as an unknown server.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a transport connection, allocated by the transport adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One registered game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRecord {
    /// Registry-generated identifier; echoed to clients in replies.
    pub id: ServerId,
    /// Host address the server is reachable at.
    pub addr: String,
    /// Port the server is reachable at.
    pub port: u16,
    /// Identifier of the game system (zone/map) the server hosts.
    pub system: String,
    /// Display name; `"Unknown"` when registered via `advertise`.
    pub name: String,
    /// Time of the last registration or `ping`.
    pub last_heartbeat: Instant,
    /// Connection that created the record.
    pub owner: ConnectionId,
}

impl ServerRecord {
    /// Heartbeat age relative to `now`. Saturates to zero if the heartbeat
    /// is somehow in the future.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_heartbeat)
    }
}

/// In-memory registry of all registered servers.
///
/// Purely volatile: the registry is rebuilt from live registrations after a
/// restart, which is intended – a relay that just started has no live
/// servers to report.
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: BTreeMap<ServerId, ServerRecord>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record and returns its generated identifier.
    pub fn register(
        &mut self,
        addr: String,
        port: u16,
        system: String,
        name: String,
        owner: ConnectionId,
    ) -> ServerId {
        let id = ServerId::generate();
        self.servers.insert(
            id,
            ServerRecord {
                id,
                addr,
                port,
                system,
                name,
                last_heartbeat: Instant::now(),
                owner,
            },
        );
        id
    }

    /// Refreshes the heartbeat of the record named by `id`.
    ///
    /// Returns `false` when no such record exists (including identifiers
    /// that do not parse – the wire protocol treats both as unknown).
    pub fn touch(&mut self, id: &str, now: Instant) -> bool {
        let Some(id) = ServerId::parse(id) else {
            return false;
        };
        match self.servers.get_mut(&id) {
            Some(record) => {
                record.last_heartbeat = now;
                true
            }
            None => false,
        }
    }

    /// Removes the record named by `id`, regardless of who owns it.
    pub fn remove(&mut self, id: &str) -> Option<ServerRecord> {
        let id = ServerId::parse(id)?;
        self.servers.remove(&id)
    }

    /// Returns a stable snapshot of every record, in key order.
    pub fn snapshot(&self) -> Vec<ServerRecord> {
        self.servers.values().cloned().collect()
    }

    /// Finds the first record hosting `system`, comparing case-insensitively
    /// on the full system string.
    pub fn find_system(&self, system: &str) -> Option<&ServerRecord> {
        let wanted = system.to_lowercase();
        self.servers
            .values()
            .find(|record| record.system.to_lowercase() == wanted)
    }

    /// Removes the first record that hosts exactly `system` **and** is owned
    /// by `owner`. This is the `deadvertise` lookup; unlike [`remove`] the
    /// match here is case-sensitive and ownership-checked.
    ///
    /// [`remove`]: ServerRegistry::remove
    pub fn remove_owned_system(
        &mut self,
        system: &str,
        owner: ConnectionId,
    ) -> Option<ServerRecord> {
        let id = self
            .servers
            .values()
            .find(|record| record.system == system && record.owner == owner)
            .map(|record| record.id)?;
        self.servers.remove(&id)
    }

    /// Removes every record owned by `owner` and returns them.
    ///
    /// Called when a connection closes, so that no record ever outlives the
    /// connection that created it.
    pub fn remove_owned_by(&mut self, owner: ConnectionId) -> Vec<ServerRecord> {
        let ids: Vec<ServerId> = self
            .servers
            .values()
            .filter(|record| record.owner == owner)
            .map(|record| record.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.servers.remove(&id))
            .collect()
    }

    /// Removes every record whose heartbeat age at `now` exceeds `timeout`
    /// and returns the evicted records.
    pub fn evict_stale(&mut self, timeout: Duration, now: Instant) -> Vec<ServerRecord> {
        let ids: Vec<ServerId> = self
            .servers
            .values()
            .filter(|record| record.age(now) > timeout)
            .map(|record| record.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.servers.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
