//! TCP transport adapter: listener, per-connection reader/writer tasks,
//! and the peer delivery table.

pub mod listener;
pub mod peers;

pub use listener::{bind, run_accept_loop, NetworkError};
pub use peers::PeerTable;
