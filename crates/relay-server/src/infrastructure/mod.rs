//! Infrastructure layer: the TCP transport adapter and configuration
//! storage. This is the only layer that touches the OS.

pub mod network;
pub mod storage;
