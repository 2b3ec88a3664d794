//! Serialization of replies and broadcast notifications.
//!
//! Replies echo the request keyword in their first token, followed by
//! either data and `ok` or `error <message>`:
//!
//! ```text
//! add 7c9e6679-7425-40de-944b-e07fc1f90ae7 ok
//! ping 7c9e6679-7425-40de-944b-e07fc1f90ae7 error Unknown server
//! list <id> <addr> <port> <system> <name>      (one line per record)
//! ```
//!
//! Notifications are the two-line `advertise`/`deadvertise` messages pushed
//! to peers that did not ask for them.

use crate::domain::registry::ServerRecord;

/// A reply to a single request, addressed to the sender only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `add <id> ok`
    AddOk(String),
    /// The full registry snapshot; encodes as `list empty` when no servers
    /// are registered, otherwise one `list ...` line per record.
    List(Vec<ServerRecord>),
    /// `ping <id> ok`
    PingOk(String),
    /// `ping <id> error Unknown server`
    PingUnknown(String),
    /// `remove <id> ok`
    RemoveOk(String),
    /// `remove <id> error Unknown server`
    RemoveUnknown(String),
    /// `advertise <id> ok`
    AdvertiseOk(String),
    /// `deadvertise <id> ok`
    DeadvertiseOk(String),
    /// `deadvertise error Unknown system`
    DeadvertiseUnknown,
    /// `find_peer <id> <addr> <port> <system> <name>`
    FindPeerMatch(ServerRecord),
    /// `find_peer error System not hosted`
    FindPeerMiss,
    /// `<command> error <message>` – validation failures and unknown
    /// commands.
    CommandError { command: String, message: String },
}

impl Response {
    /// Serializes the reply to its wire form.
    pub fn encode(&self) -> Vec<u8> {
        self.to_wire_string().into_bytes()
    }

    fn to_wire_string(&self) -> String {
        match self {
            Response::AddOk(id) => format!("add {id} ok"),
            Response::List(records) if records.is_empty() => "list empty".to_string(),
            Response::List(records) => records
                .iter()
                .map(|r| format!("list {} {} {} {} {}", r.id, r.addr, r.port, r.system, r.name))
                .collect::<Vec<_>>()
                .join("\n"),
            Response::PingOk(id) => format!("ping {id} ok"),
            Response::PingUnknown(id) => format!("ping {id} error Unknown server"),
            Response::RemoveOk(id) => format!("remove {id} ok"),
            Response::RemoveUnknown(id) => format!("remove {id} error Unknown server"),
            Response::AdvertiseOk(id) => format!("advertise {id} ok"),
            Response::DeadvertiseOk(id) => format!("deadvertise {id} ok"),
            Response::DeadvertiseUnknown => "deadvertise error Unknown system".to_string(),
            Response::FindPeerMatch(r) => {
                format!("find_peer {} {} {} {} {}", r.id, r.addr, r.port, r.system, r.name)
            }
            Response::FindPeerMiss => "find_peer error System not hosted".to_string(),
            Response::CommandError { command, message } => {
                format!("{command} error {message}")
            }
        }
    }
}

/// A broadcast pushed to connected peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A server began hosting `system`.
    Advertise { system: String },
    /// A server stopped hosting `system` (explicitly, by disconnecting, or
    /// by going stale).
    Deadvertise { system: String },
}

impl Notification {
    /// Serializes the notification to its two-line wire form.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Notification::Advertise { system } => format!("advertise\n{system}\n"),
            Notification::Deadvertise { system } => format!("deadvertise\n{system}\n"),
        }
        .into_bytes()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
