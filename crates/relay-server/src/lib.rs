//! Relay daemon library.
//!
//! The relay accepts connections from game servers and clients, keeps an
//! in-memory registry of hosted systems, and pushes advertise/deadvertise
//! notifications to every connected peer as servers come and go.
//!
//! The crate is split into two layers:
//!
//! - [`application`] – protocol dispatch, broadcast policy, and the expiry
//!   sweeper. No direct I/O; peers are reached through the
//!   [`application::transport::PeerSink`] trait.
//! - [`infrastructure`] – the TCP adapter (listener, per-connection tasks,
//!   peer table) and configuration storage.
//!
//! Infrastructure depends on application, never the other way around.

pub mod application;
pub mod infrastructure;
