//! Domain layer: pure relay state with no I/O dependencies.

pub mod registry;

pub use registry::{ConnectionId, ServerId, ServerRecord, ServerRegistry};
